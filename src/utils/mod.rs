//! Utility functions and helpers.

pub mod date;
pub mod http;
pub mod rss;
pub mod value;

use url::Url;

/// Build the per-book detail link by appending `id` to `base`.
///
/// A base without a trailing slash is treated as a directory.
pub fn detail_link(base: &str, id: &str) -> String {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Url::parse(&normalized)
        .and_then(|u| u.join(id))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{normalized}{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_link() {
        assert_eq!(
            detail_link("https://www.hanmoto.com/bd/isbn/", "9784000000001"),
            "https://www.hanmoto.com/bd/isbn/9784000000001"
        );
        assert_eq!(
            detail_link("https://www.books.or.jp/book-details", "9784000000001"),
            "https://www.books.or.jp/book-details/9784000000001"
        );
    }
}
