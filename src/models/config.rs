//! Application configuration structures.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::services::{BookCodePolicy, ClassificationPolicy, CodeMatchPolicy, LabelPolicy};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog API endpoints and HTTP behavior
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Chunked detail fetching
    #[serde(default)]
    pub batch: BatchConfig,

    /// Active classification policy
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Feed channel metadata and limits
    #[serde(default)]
    pub feed: FeedConfig,

    /// Durable state file names
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Load an explicitly requested file, or fall back to `default_path`.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load_from(explicit: Option<&Path>, default_path: &Path) -> Result<Self> {
        match explicit {
            Some(path) if !path.exists() => Err(AppError::config(format!(
                "config file not found: {}",
                path.display()
            ))),
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default(default_path)),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.user_agent.trim().is_empty() {
            return Err(AppError::validation("catalog.user_agent is empty"));
        }
        if self.catalog.list_timeout_secs == 0 || self.catalog.detail_timeout_secs == 0 {
            return Err(AppError::validation("catalog timeouts must be > 0"));
        }
        Url::parse(&self.catalog.coverage_url)?;
        Url::parse(&self.catalog.get_url)?;
        Url::parse(&self.feed.link_base)?;

        if self.batch.chunk_size == 0 || self.batch.chunk_size > defaults::MAX_CHUNK_SIZE {
            return Err(AppError::validation(format!(
                "batch.chunk_size must be within 1..={}",
                defaults::MAX_CHUNK_SIZE
            )));
        }
        if self.feed.max_items == 0 {
            return Err(AppError::validation("feed.max_items must be > 0"));
        }
        if self.feed.history_cap == 0 {
            return Err(AppError::validation("feed.history_cap must be > 0"));
        }
        self.classifier.validate()
    }
}

/// Catalog API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Endpoint listing every known identifier
    #[serde(default = "defaults::coverage_url")]
    pub coverage_url: String,

    /// Endpoint returning records for a comma-joined identifier batch
    #[serde(default = "defaults::get_url")]
    pub get_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Timeout for the coverage listing in seconds
    #[serde(default = "defaults::list_timeout")]
    pub list_timeout_secs: u64,

    /// Timeout for one detail batch in seconds
    #[serde(default = "defaults::detail_timeout")]
    pub detail_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            coverage_url: defaults::coverage_url(),
            get_url: defaults::get_url(),
            user_agent: defaults::user_agent(),
            list_timeout_secs: defaults::list_timeout(),
            detail_timeout_secs: defaults::detail_timeout(),
        }
    }
}

/// Chunking, pacing and checkpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Identifiers per detail request (API maximum is 1000)
    #[serde(default = "defaults::chunk_size")]
    pub chunk_size: usize,

    /// Delay between chunk requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Failed chunks tolerated before the run aborts
    #[serde(default = "defaults::max_errors")]
    pub max_errors: usize,

    /// Persist intermediate state every N chunks (0 disables)
    #[serde(default = "defaults::checkpoint_interval")]
    pub checkpoint_interval: usize,

    /// Log progress every N chunks
    #[serde(default = "defaults::progress_interval")]
    pub progress_interval: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::chunk_size(),
            request_delay_ms: defaults::request_delay(),
            max_errors: defaults::max_errors(),
            checkpoint_interval: defaults::checkpoint_interval(),
            progress_interval: defaults::progress_interval(),
        }
    }
}

/// Classification policy selection. One policy is active per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ClassifierConfig {
    /// Subject scheme + code allow-list
    CodeMatch {
        #[serde(default = "defaults::c_code_scheme")]
        scheme: String,
        #[serde(default = "defaults::target_c_codes")]
        codes: BTreeSet<String>,
    },
    /// Substring in collection or series label
    Label {
        #[serde(default = "defaults::label_marker")]
        marker: String,
    },
    /// Single digit of the Japanese book code
    BookCode {
        #[serde(default = "defaults::book_code_scheme")]
        scheme: String,
        #[serde(default = "defaults::book_code_position")]
        position: usize,
        #[serde(default = "defaults::book_code_digit")]
        digit: char,
    },
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::CodeMatch {
            scheme: defaults::c_code_scheme(),
            codes: defaults::target_c_codes(),
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<()> {
        match self {
            Self::CodeMatch { scheme, codes } => {
                if scheme.is_empty() || codes.is_empty() {
                    return Err(AppError::validation(
                        "classifier.code_match needs a scheme and at least one code",
                    ));
                }
            }
            Self::Label { marker } => {
                if marker.is_empty() {
                    return Err(AppError::validation("classifier.label marker is empty"));
                }
            }
            Self::BookCode { scheme, .. } => {
                if scheme.is_empty() {
                    return Err(AppError::validation("classifier.book_code scheme is empty"));
                }
            }
        }
        Ok(())
    }

    /// Build the configured policy.
    pub fn build(&self) -> Box<dyn ClassificationPolicy> {
        match self {
            Self::CodeMatch { scheme, codes } => {
                Box::new(CodeMatchPolicy::new(scheme.clone(), codes.clone()))
            }
            Self::Label { marker } => Box::new(LabelPolicy::new(marker.clone())),
            Self::BookCode {
                scheme,
                position,
                digit,
            } => Box::new(BookCodePolicy::new(scheme.clone(), *position, *digit)),
        }
    }
}

/// Which list the published feed is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    /// Durable cross-run history, insertion order
    #[default]
    History,
    /// This run's accepted books, newest publication date first
    Run,
}

/// Feed channel metadata and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "defaults::feed_title")]
    pub title: String,

    #[serde(default = "defaults::feed_description")]
    pub description: String,

    /// Channel home link
    #[serde(default = "defaults::feed_link")]
    pub link: String,

    #[serde(default = "defaults::feed_language")]
    pub language: String,

    #[serde(default = "defaults::feed_copyright")]
    pub copyright: String,

    #[serde(default = "defaults::feed_generator")]
    pub generator: String,

    #[serde(default)]
    pub managing_editor: Option<String>,

    /// Prefix for per-book detail links; the identifier is appended
    #[serde(default = "defaults::link_base")]
    pub link_base: String,

    /// Category attached to every entry
    #[serde(default = "defaults::feed_category")]
    pub category: String,

    /// Maximum entries rendered into the feed
    #[serde(default = "defaults::max_items")]
    pub max_items: usize,

    /// Maximum descriptors retained in history
    #[serde(default = "defaults::history_cap")]
    pub history_cap: usize,

    #[serde(default)]
    pub source: FeedSource,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            title: defaults::feed_title(),
            description: defaults::feed_description(),
            link: defaults::feed_link(),
            language: defaults::feed_language(),
            copyright: defaults::feed_copyright(),
            generator: defaults::feed_generator(),
            managing_editor: None,
            link_base: defaults::link_base(),
            category: defaults::feed_category(),
            max_items: defaults::max_items(),
            history_cap: defaults::history_cap(),
            source: FeedSource::default(),
        }
    }
}

/// Durable state file names, relative to the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::baseline_file")]
    pub baseline_file: String,

    #[serde(default = "defaults::history_file")]
    pub history_file: String,

    #[serde(default = "defaults::delta_file")]
    pub delta_file: String,

    #[serde(default = "defaults::feed_file")]
    pub feed_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            baseline_file: defaults::baseline_file(),
            history_file: defaults::history_file(),
            delta_file: defaults::delta_file(),
            feed_file: defaults::feed_file(),
        }
    }
}

impl PathsConfig {
    /// Absolute location of the feed file under `root`.
    pub fn feed_path(&self, root: &Path) -> PathBuf {
        root.join(&self.feed_file)
    }
}

mod defaults {
    use std::collections::BTreeSet;

    pub const MAX_CHUNK_SIZE: usize = 1000;

    const TARGET_C_CODES: &[&str] = &[
        "0200", "0201", "0202", "0204", "0210", "0211", "0212", "0214", "0215", "0216", "0220",
        "0221", "0222", "0223", "0225", "0226", "0230", "0231", "0232", "0233", "0234", "0236",
        "0237", "0239", "0240", "0241", "0242", "0243", "0244", "0245", "0247", "0250", "0251",
        "0252", "0253", "0254", "0255", "0256", "0257", "0258", "0260", "0261", "0263", "0265",
        "0270", "0271", "0272", "0273", "0274", "0275", "0276", "0277", "0279", "0280", "0281",
        "0282", "0284", "0285", "0287", "0290", "0291", "0292", "0293", "0295", "0297", "0298",
    ];

    // Catalog defaults
    pub fn coverage_url() -> String {
        "https://api.openbd.jp/v1/coverage".into()
    }
    pub fn get_url() -> String {
        "https://api.openbd.jp/v1/get".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; shinsho-feed/0.1)".into()
    }
    pub fn list_timeout() -> u64 {
        90
    }
    pub fn detail_timeout() -> u64 {
        180
    }

    // Batch defaults
    pub fn chunk_size() -> usize {
        MAX_CHUNK_SIZE
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn max_errors() -> usize {
        10
    }
    pub fn checkpoint_interval() -> usize {
        50
    }
    pub fn progress_interval() -> usize {
        5
    }

    // Classifier defaults
    pub fn c_code_scheme() -> String {
        "78".into()
    }
    pub fn target_c_codes() -> BTreeSet<String> {
        TARGET_C_CODES.iter().map(|c| c.to_string()).collect()
    }
    pub fn label_marker() -> String {
        "新書".into()
    }
    pub fn book_code_scheme() -> String {
        "20".into()
    }
    pub fn book_code_position() -> usize {
        1
    }
    pub fn book_code_digit() -> char {
        '2'
    }

    // Feed defaults
    pub fn feed_title() -> String {
        "新書新刊RSSフィード".into()
    }
    pub fn feed_description() -> String {
        "発売が確定した新書の情報をRSSリーダーで購読できます。版元ドットコムのAPIを利用しています。"
            .into()
    }
    pub fn feed_link() -> String {
        "https://analekt.github.io/".into()
    }
    pub fn feed_language() -> String {
        "ja".into()
    }
    pub fn feed_copyright() -> String {
        "Copyright owner: openBDプロジェクト、JPO出版情報登録センター".into()
    }
    pub fn feed_generator() -> String {
        "shinsho-feed".into()
    }
    pub fn link_base() -> String {
        "https://www.hanmoto.com/bd/isbn/".into()
    }
    pub fn feed_category() -> String {
        "新書".into()
    }
    pub fn max_items() -> usize {
        200
    }
    pub fn history_cap() -> usize {
        200
    }

    // Path defaults
    pub fn baseline_file() -> String {
        "isbns_previous.json".into()
    }
    pub fn history_file() -> String {
        "feed_history.json".into()
    }
    pub fn delta_file() -> String {
        "new_records.json".into()
    }
    pub fn feed_file() -> String {
        "index.xml".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_classifier_is_code_match() {
        let config = Config::default();
        match &config.classifier {
            ClassifierConfig::CodeMatch { scheme, codes } => {
                assert_eq!(scheme, "78");
                assert_eq!(codes.len(), 66);
                assert!(codes.contains("0200"));
            }
            other => panic!("unexpected classifier {other:?}"),
        }
    }

    #[test]
    fn load_from_requires_explicit_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("missing.toml");

        let err = Config::load_from(Some(missing.as_path()), &missing).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let fallback = Config::load_from(None, &missing).unwrap();
        assert_eq!(fallback.batch.chunk_size, 1000);

        let explicit = tmp.path().join("config.toml");
        std::fs::write(&explicit, "[batch]\nchunk_size = 10\n").unwrap();
        let loaded = Config::load_from(Some(explicit.as_path()), &missing).unwrap();
        assert_eq!(loaded.batch.chunk_size, 10);
    }

    #[test]
    fn validate_rejects_oversized_chunk() {
        let mut config = Config::default();
        config.batch.chunk_size = 1001;
        assert!(config.validate().is_err());
        config.batch.chunk_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_marker() {
        let mut config = Config::default();
        config.classifier = ClassifierConfig::Label {
            marker: String::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = Config::default();
        config.catalog.get_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_label_policy_from_toml() {
        let config: Config = toml::from_str(
            r#"
            [classifier]
            policy = "label"

            [feed]
            source = "run"
            max_items = 50
            "#,
        )
        .unwrap();

        assert!(matches!(
            config.classifier,
            ClassifierConfig::Label { ref marker } if marker == "新書"
        ));
        assert_eq!(config.feed.source, FeedSource::Run);
        assert_eq!(config.feed.max_items, 50);
        assert_eq!(config.feed.history_cap, 200);
        assert_eq!(config.batch.chunk_size, 1000);
    }

    #[test]
    fn build_selects_policy() {
        let config = ClassifierConfig::BookCode {
            scheme: "20".into(),
            position: 1,
            digit: '2',
        };
        assert_eq!(config.build().name(), "book_code");
        assert_eq!(ClassifierConfig::default().build().name(), "code_match");
    }
}
