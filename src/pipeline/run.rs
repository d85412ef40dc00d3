//! Feed run orchestration.
//!
//! One run: load state, list the catalog, diff against the baseline, fetch
//! and classify the added identifiers in chunks, fold the accepted books into
//! history, render the feed and commit everything together.

use std::collections::BTreeSet;
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::models::{
    BookDescriptor, Config, DeltaDocument, FeedConfig, FeedSource, Identifier, RunStats,
};
use crate::pipeline::batch::{ErrorBudget, Pacer, Progress, chunk_count, process_records};
use crate::pipeline::diff::{DiffPlan, plan};
use crate::pipeline::history::FeedHistory;
use crate::pipeline::render::FeedRenderer;
use crate::services::CatalogSource;
use crate::storage::{StateCommit, StateStore};
use crate::utils::date::now_jst;
use crate::utils::rss::to_rss;

/// Run the differential feed pipeline once.
///
/// With `dry_run` everything is computed and logged but nothing is written.
pub async fn run_feed(
    config: &Config,
    source: &dyn CatalogSource,
    store: &dyn StateStore,
    dry_run: bool,
) -> Result<RunStats> {
    FeedRunner::new(config, source, store)
        .dry_run(dry_run)
        .run()
        .await
}

/// Re-render the feed from persisted history without touching the catalog.
///
/// Returns the number of entries written.
pub async fn render_stored(config: &Config, store: &dyn StateStore) -> Result<usize> {
    let history = FeedHistory::new(store.load_history().await?, config.feed.history_cap);
    if history.is_empty() {
        log::warn!("No stored history, rendering an empty feed");
    }
    let (xml, items) = build_feed(&config.feed, history.entries(), FeedSource::History)?;

    store
        .commit(&StateCommit {
            feed: Some(xml.as_slice()),
            ..StateCommit::default()
        })
        .await?;
    log::info!("Rendered {} entries from history", items);
    Ok(items)
}

/// Render `books` and serialize them as RSS. Returns the document and entry count.
pub fn build_feed(
    config: &FeedConfig,
    books: &[BookDescriptor],
    source: FeedSource,
) -> Result<(Vec<u8>, usize)> {
    let renderer = FeedRenderer::new(config);
    let entries = renderer.render(books, source);
    let channel = renderer.channel(&entries, now_jst());
    let xml = to_rss(&channel, &entries)?;
    Ok((xml, entries.len()))
}

/// Drives one run against a catalog source and a state store.
pub struct FeedRunner<'a> {
    config: &'a Config,
    source: &'a dyn CatalogSource,
    store: &'a dyn StateStore,
    dry_run: bool,
}

impl<'a> FeedRunner<'a> {
    pub fn new(config: &'a Config, source: &'a dyn CatalogSource, store: &'a dyn StateStore) -> Self {
        Self {
            config,
            source,
            store,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<RunStats> {
        let started = Instant::now();
        let mut stats = RunStats::default();

        let previous = self.store.load_baseline().await?;
        let mut history =
            FeedHistory::new(self.store.load_history().await?, self.config.feed.history_cap);

        let current: BTreeSet<Identifier> =
            self.source.list_identifiers().await?.into_iter().collect();
        if current.is_empty() {
            log::error!("Catalog listing returned no identifiers, leaving state untouched");
            return Err(AppError::catalog("coverage", "empty identifier list"));
        }
        stats.previous_count = previous.len();
        stats.current_count = current.len();

        let accepted = match plan(&previous, &current) {
            DiffPlan::FirstRun => {
                log::info!(
                    "No baseline yet, recording {} identifiers without fetching details",
                    current.len()
                );
                stats.first_run = true;
                Vec::new()
            }
            DiffPlan::Delta(diff) => {
                stats.added_count = diff.added.len();
                stats.removed_count = diff.removed.len();
                if diff.has_changes() {
                    log::info!(
                        "{} catalog changes since last run: {} new, {} removed",
                        diff.change_count(),
                        diff.added.len(),
                        diff.removed.len()
                    );
                } else {
                    log::info!("Catalog unchanged since last run");
                }
                self.fetch_added(&diff.added_in_order(), &previous, &mut history, &mut stats)
                    .await?
            }
        };

        let feed_books: &[BookDescriptor] = match (stats.first_run, self.config.feed.source) {
            (true, _) => &[][..],
            (false, FeedSource::History) => history.entries(),
            (false, FeedSource::Run) => accepted.as_slice(),
        };
        let (xml, items) = build_feed(&self.config.feed, feed_books, self.config.feed.source)?;
        stats.feed_items = items;

        let delta = DeltaDocument::new(accepted);
        if self.dry_run {
            log::info!("Dry run: {} accepted, state left untouched", delta.count);
        } else {
            self.store
                .commit(&StateCommit {
                    baseline: Some(&current),
                    history: (!stats.first_run).then(|| history.entries()),
                    delta: Some(&delta),
                    feed: Some(xml.as_slice()),
                })
                .await?;
        }

        stats.log_summary(started.elapsed().as_secs_f64());
        Ok(stats)
    }

    /// Fetch, extract and classify `ids` chunk by chunk.
    ///
    /// Accepted books are folded into `history` as each chunk completes.
    /// Failed chunks are skipped until the error budget runs out.
    async fn fetch_added(
        &self,
        ids: &[Identifier],
        previous: &BTreeSet<Identifier>,
        history: &mut FeedHistory,
        stats: &mut RunStats,
    ) -> Result<Vec<BookDescriptor>> {
        let batch = &self.config.batch;
        let chunk_size = batch.chunk_size.max(1);
        let total_chunks = chunk_count(ids.len(), chunk_size);
        stats.chunks_total = total_chunks;

        let policy = self.config.classifier.build();
        log::info!(
            "Fetching {} records in {} chunks, classifying with {}",
            ids.len(),
            total_chunks,
            policy.name()
        );

        let pacer = Pacer::new(batch.request_delay_ms);
        let progress = Progress::new(ids.len(), total_chunks, batch.progress_interval);
        let mut budget = ErrorBudget::new(batch.max_errors);
        let mut processed = previous.clone();
        let mut accepted = Vec::new();

        for (index, chunk) in ids.chunks(chunk_size).enumerate() {
            progress.report(index, index * chunk_size);

            match self.source.fetch_records(chunk).await {
                Ok(records) => {
                    let outcome = process_records(&records, policy.as_ref());
                    stats.records_fetched += outcome.fetched;
                    stats.null_records += outcome.nulls;
                    stats.records_skipped += outcome.skipped;

                    history.ingest(&outcome.accepted);
                    accepted.extend(outcome.accepted);
                }
                Err(e) => {
                    stats.chunks_failed += 1;
                    log::warn!("Chunk {}/{} failed: {}", index + 1, total_chunks, e);
                    if let Err(abort) = budget.record_failure() {
                        log::error!("Aborting run, durable state left at last checkpoint");
                        return Err(abort);
                    }
                }
            }
            processed.extend(chunk.iter().cloned());

            let due = batch.checkpoint_interval > 0 && (index + 1) % batch.checkpoint_interval == 0;
            if due && index + 1 < total_chunks {
                self.checkpoint(&processed, history, stats).await;
            }

            pacer.after_chunk(index, total_chunks).await;
        }

        stats.accepted = accepted.len();
        log::info!(
            "Accepted {} of {} fetched records ({} null, {} chunks failed)",
            accepted.len(),
            stats.records_fetched,
            stats.null_records,
            budget.failed()
        );
        Ok(accepted)
    }

    /// Persist progress so far. A failed checkpoint is logged and the run goes on.
    async fn checkpoint(
        &self,
        processed: &BTreeSet<Identifier>,
        history: &FeedHistory,
        stats: &mut RunStats,
    ) {
        if self.dry_run {
            return;
        }

        let commit = StateCommit {
            baseline: Some(processed),
            history: Some(history.entries()),
            ..StateCommit::default()
        };
        match self.store.checkpoint(&commit).await {
            Ok(()) => {
                stats.checkpoints += 1;
                log::info!(
                    "Checkpoint {}: {} identifiers, {} history entries",
                    stats.checkpoints,
                    processed.len(),
                    history.len()
                );
            }
            Err(e) => log::warn!("Checkpoint failed: {}", e),
        }
    }
}
