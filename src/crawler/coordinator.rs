//! Breadth-first hierarchy traversal
//!
//! The crawl loop owns the authenticated session, the work queue and the
//! visited set exclusively; nothing else touches them while a run is in
//! flight. Each dequeued URL is fetched through the retry policy,
//! classified on its own page (branch or leaf), and either has its
//! immediate children enqueued or its compendium extracted and pushed to
//! the sink. Node-local failures are logged and skipped; only sink and
//! setup failures abort the run.
//!
//! Every queue entry carries its own absolute URL, so no navigation state
//! is shared between nodes. A node exposed under multiple parents is
//! visited once.

use crate::auth::AuthSession;
use crate::config::CrawlerConfig;
use crate::crawler::fetch::fetch_page;
use crate::crawler::page::{classify_page, has_children_container, PageView};
use crate::extract::extract_record;
use crate::retry::{RetryError, RetryPolicy};
use crate::sink::{Record, RecordSink};
use crate::url::normalize_href;
use crate::{CepageError, FetchError};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Counters reported when a run finishes
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    /// URLs dequeued and fetched (each at most once per run)
    pub visited: usize,

    /// Records handed to the sink
    pub records: usize,

    /// Dequeued nodes skipped after retry exhaustion or structural mismatch
    pub skipped: usize,
}

/// Transient condition inside a retried wait
#[derive(Debug)]
enum WaitError {
    Fetch(FetchError),
    Pending(&'static str),
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitError::Fetch(e) => write!(f, "{}", e),
            WaitError::Pending(what) => write!(f, "{}", what),
        }
    }
}

/// Breadth-first crawler over the site hierarchy
pub struct Crawler<S: RecordSink> {
    session: AuthSession,
    retry: RetryPolicy,
    sink: S,
    min_delay_ms: u64,
    max_delay_ms: u64,
    max_pages: Option<usize>,
    cancel: Arc<AtomicBool>,
}

impl<S: RecordSink> Crawler<S> {
    /// Creates a crawler owning the authenticated session and the sink
    pub fn new(
        session: AuthSession,
        config: &CrawlerConfig,
        sink: S,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        let retry = RetryPolicy::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_ms),
            cancel.clone(),
        );

        Self {
            session,
            retry,
            sink,
            min_delay_ms: config.min_delay_ms,
            max_delay_ms: config.max_delay_ms,
            max_pages: config.max_pages,
            cancel,
        }
    }

    /// Consumes the crawler, returning the sink with everything it accepted
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Walks the hierarchy breadth-first from `start_url`
    ///
    /// Terminates when the queue drains, the optional node budget is
    /// reached, or cancellation is requested. Records are pushed to the
    /// sink as leaves are processed, so output already emitted stays valid
    /// whichever way the run ends.
    pub async fn crawl(&mut self, start_url: &str) -> Result<CrawlStats, CepageError> {
        let start = normalize_href(start_url, self.session.base_origin())?;
        info!("Starting hierarchy walk at {}", start);

        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stats = CrawlStats::default();

        queue.push_back((start, 0));

        while let Some((url, depth)) = queue.pop_front() {
            if self.cancel.load(Ordering::Relaxed) {
                info!("Cancellation requested, stopping walk");
                break;
            }

            // Duplicate enqueues from sibling references are expected;
            // processing is idempotent-skip.
            if visited.contains(&url) {
                continue;
            }

            if let Some(budget) = self.max_pages {
                if stats.visited >= budget {
                    info!("Node budget of {} reached, stopping walk", budget);
                    break;
                }
            }

            // Marked before the fetch completes, so a second occurrence of
            // this URL in the queue can never be processed again.
            visited.insert(url.clone());
            stats.visited += 1;

            let body = match self
                .retry
                .run("page fetch", &url, || {
                    fetch_page(self.session.client(), &url)
                })
                .await
            {
                Ok(body) => body,
                Err(RetryError::Cancelled) => continue,
                Err(e) => {
                    warn!("Skipping unreachable node {} at depth {}: {}", url, depth, e);
                    stats.skipped += 1;
                    continue;
                }
            };

            match classify_page(&body) {
                PageView::MissingSelectedMarker => {
                    // Structural absence; retrying cannot fix it.
                    warn!("No selected hierarchy marker on {}, skipping node", url);
                    stats.skipped += 1;
                }

                PageView::Leaf => {
                    debug!("Leaf node {} at depth {}", url, depth);
                    if let Some(record) = self.extract_leaf(&url, body).await {
                        self.sink.accept(&record)?;
                        stats.records += 1;
                    }
                }

                PageView::Branch { children } => {
                    debug!(
                        "Branch node {} at depth {} with {} children",
                        url,
                        depth,
                        children.len()
                    );
                    for child in children {
                        let href = match child.href {
                            Some(href) => href,
                            None => {
                                debug!(
                                    "Child '{}' under {} has no usable anchor href, skipping",
                                    child.title, url
                                );
                                continue;
                            }
                        };

                        let normalized =
                            match normalize_href(&href, self.session.base_origin()) {
                                Ok(u) => u,
                                Err(e) => {
                                    debug!(
                                        "Child href {} under {} did not normalize: {}",
                                        href, url, e
                                    );
                                    continue;
                                }
                            };

                        if child.has_children {
                            if let Some(toggle) = child.collapsed_toggle_href.as_deref() {
                                self.expand_branch(toggle, &url).await;
                            }
                        }

                        // Enqueued regardless of the listing's branch/leaf
                        // class; classification is re-evaluated on arrival.
                        queue.push_back((normalized, depth + 1));
                    }
                }
            }

            if !queue.is_empty() {
                self.pace().await;
            }
        }

        info!(
            "Walk complete: {} nodes visited, {} records extracted, {} skipped",
            stats.visited, stats.records, stats.skipped
        );
        Ok(stats)
    }

    /// Extracts a leaf's compendium, re-fetching while the region has not
    /// rendered yet
    ///
    /// The compendium can appear after a delayed client-side render, so
    /// its absence is treated as transient until attempts run out. A
    /// confirmed absence yields no record rather than an error, since
    /// some leaves legitimately carry no compendium.
    async fn extract_leaf(&self, url: &str, first_body: String) -> Option<Record> {
        let client = self.session.client();
        let mut pending = Some(first_body);

        let outcome = self
            .retry
            .run("compendium extraction", url, || {
                let body = pending.take();
                async move {
                    let body = match body {
                        Some(body) => body,
                        None => fetch_page(client, url).await.map_err(WaitError::Fetch)?,
                    };
                    extract_record(&body).ok_or(WaitError::Pending("compendium not rendered"))
                }
            })
            .await;

        match outcome {
            Ok(record) => Some(record),
            Err(RetryError::Cancelled) => None,
            Err(_) => {
                debug!("No compendium found on {} after retries, no record", url);
                None
            }
        }
    }

    /// Triggers a collapsed branch's expand toggle and waits for the
    /// children container to materialize
    ///
    /// Traversal reaches the grandchildren through the queue either way;
    /// the toggle fetch only forces the server-side expansion state, so a
    /// failed expansion is a diagnostic, not a skip.
    async fn expand_branch(&self, toggle_href: &str, parent_url: &str) {
        let toggle_url = match normalize_href(toggle_href, self.session.base_origin()) {
            Ok(u) => u,
            Err(e) => {
                debug!(
                    "Toggle href {} under {} did not normalize: {}",
                    toggle_href, parent_url, e
                );
                return;
            }
        };

        let client = self.session.client();
        let outcome = self
            .retry
            .run("branch expansion", &toggle_url, || async {
                let body = fetch_page(client, &toggle_url)
                    .await
                    .map_err(WaitError::Fetch)?;
                if has_children_container(&body) {
                    Ok(())
                } else {
                    Err(WaitError::Pending("children container not materialized"))
                }
            })
            .await;

        if let Err(e) = outcome {
            debug!(
                "Expansion of collapsed branch {} under {} failed: {}",
                toggle_url, parent_url, e
            );
        }
    }

    /// Jittered inter-request pacing
    async fn pace(&self) {
        let ms = if self.max_delay_ms > self.min_delay_ms {
            fastrand::u64(self.min_delay_ms..=self.max_delay_ms)
        } else {
            self.min_delay_ms
        };
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}
