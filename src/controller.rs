use std::sync::Arc;

use tokio::sync::mpsc;

use crate::accumulator::ResultAccumulator;
use crate::fetcher::PageFetcher;
use crate::types::{Anime, FetchOutcome, FetchState, FetchTicket, FilterSet, Page};

/// Drives incremental loading of the catalog for one filter set at a time.
///
/// Fetches run on spawned tasks and report back through `outcome_tx`. The
/// owner feeds every outcome to [`PaginationController::complete`], which
/// applies it only if it still answers the request currently in flight.
pub struct PaginationController {
    fetcher: Arc<dyn PageFetcher>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    filters: FilterSet,
    page: Page,
    state: FetchState,
    has_more: bool,
    items: ResultAccumulator,
    // Bumped by every set_filters so identical (page, filters) pairs from
    // different filter lifetimes never compare equal.
    generation: u64,
    in_flight: Option<FetchTicket>,
    failed_page: Option<Page>,
    last_error: Option<String>,
    rollback_on_failure: bool,
}

impl PaginationController {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    ) -> Self {
        Self {
            fetcher,
            outcome_tx,
            filters: FilterSet::new(),
            page: Page::FIRST,
            state: FetchState::Idle,
            has_more: true,
            items: ResultAccumulator::new(),
            generation: 0,
            in_flight: None,
            failed_page: None,
            last_error: None,
            rollback_on_failure: true,
        }
    }

    /// When false, a failed page is skipped by the next advance instead of
    /// being requested again.
    pub fn with_rollback_on_failure(mut self, rollback: bool) -> Self {
        self.rollback_on_failure = rollback;
        self
    }

    pub fn items(&self) -> &[Anime] {
        self.items.all()
    }

    pub fn is_loading(&self) -> bool {
        self.state == FetchState::Loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Page whose fetch failed most recently, until it is retried.
    pub fn failed_page(&self) -> Option<Page> {
        self.failed_page
    }

    pub fn rollback_on_failure(&self) -> bool {
        self.rollback_on_failure
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn source_name(&self) -> &str {
        self.fetcher.name()
    }

    /// Replace the filter set and start over from page 1.
    ///
    /// Always refetches, even for an identical filter set. Any fetch still in
    /// flight becomes stale and its result is dropped on arrival.
    pub fn set_filters(&mut self, filters: FilterSet) {
        tracing::debug!(
            filters = %filters,
            discarded = self.items.len(),
            "filters changed"
        );
        self.generation += 1;
        self.filters = filters;
        self.items.clear();
        self.page = Page::FIRST;
        self.has_more = true;
        self.failed_page = None;
        self.last_error = None;
        self.dispatch();
    }

    /// Request the next page. No-op while loading or after the last page.
    pub fn advance_page(&mut self) -> bool {
        if self.state == FetchState::Loading || !self.has_more {
            tracing::trace!(state = %self.state, has_more = self.has_more, "advance ignored");
            return false;
        }

        let failed = self.failed_page.take();
        self.page = match failed {
            Some(page) if self.rollback_on_failure => page,
            _ => self.page.next(),
        };
        self.dispatch();
        true
    }

    /// Resume after the most recently failed page: request it again, or the
    /// page after it when rollback is off.
    pub fn retry(&mut self) -> bool {
        if self.state == FetchState::Loading {
            return false;
        }
        let Some(failed) = self.failed_page.take() else {
            return false;
        };

        self.page = if self.rollback_on_failure {
            failed
        } else {
            failed.next()
        };
        tracing::info!(failed = %failed, page = %self.page, "resuming after failed page");
        self.dispatch();
        true
    }

    /// Apply a fetch outcome. Returns false if it was stale and dropped.
    pub fn complete(&mut self, outcome: FetchOutcome) -> bool {
        if self.in_flight.as_ref() != Some(&outcome.ticket) {
            tracing::debug!(
                page = %outcome.ticket.page,
                filters = %outcome.ticket.filters,
                "dropping stale page"
            );
            return false;
        }
        self.in_flight = None;

        let page = outcome.ticket.page;
        match outcome.result {
            Ok(result) => {
                tracing::debug!(
                    page = %page,
                    count = result.items.len(),
                    has_more = result.has_more,
                    "page loaded"
                );
                self.items.append(result.items);
                self.has_more = result.has_more;
                if self.items.is_empty() {
                    tracing::info!(filters = %self.filters, "no results");
                }
                self.failed_page = None;
                self.last_error = None;
            }
            Err(err) => {
                tracing::warn!(page = %page, filters = %self.filters, error = %err, "failed to fetch page");
                self.failed_page = Some(page);
                if self.rollback_on_failure {
                    self.page = page.prev();
                }
                self.last_error = Some(err.to_string());
            }
        }

        self.state = FetchState::Idle;
        true
    }

    fn dispatch(&mut self) {
        let ticket = FetchTicket {
            generation: self.generation,
            page: self.page,
            filters: self.filters.clone(),
        };
        self.state = FetchState::Loading;
        self.in_flight = Some(ticket.clone());

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.fetch(ticket.page, &ticket.filters).await;
            tx.send(FetchOutcome { ticket, result }).ok();
        });
    }
}
