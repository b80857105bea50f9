//! Paginated fetcher
//!
//! One generic paginator for every predicate run. Pages within a run are
//! sequential (each cursor depends on the previous page) and bounded by a hard
//! page ceiling. Upstream errors end the run with a warning instead of failing
//! the calculation.

use shared::models::OrderSummary;
use tally_client::{OrderApi, OrderFilter};

/// Upstream page size ceiling
pub const DEFAULT_PAGE_SIZE: u32 = 250;
/// Hard page ceiling per predicate run
pub const DEFAULT_MAX_PAGES: u32 = 50;
/// Ids per batch detail request
pub const DEFAULT_DETAIL_BATCH_SIZE: usize = 50;
/// Batch detail requests in flight
pub const DEFAULT_DETAIL_CONCURRENCY: usize = 5;

/// Fetch tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    pub page_size: u32,
    pub max_pages: u32,
    pub detail_batch_size: usize,
    pub detail_concurrency: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            detail_batch_size: DEFAULT_DETAIL_BATCH_SIZE,
            detail_concurrency: DEFAULT_DETAIL_CONCURRENCY,
        }
    }
}

impl FetchConfig {
    /// Clamp to values the upstream accepts
    pub fn normalized(self) -> Self {
        Self {
            page_size: self.page_size.clamp(1, DEFAULT_PAGE_SIZE),
            max_pages: self.max_pages.max(1),
            detail_batch_size: self.detail_batch_size.clamp(1, 250),
            detail_concurrency: self.detail_concurrency.max(1),
        }
    }
}

/// Result of one predicate run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub orders: Vec<OrderSummary>,
    pub pages: u32,
    /// Page ceiling reached while more pages were reported
    pub truncated: bool,
    /// Non-fatal reason the run stopped early
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PageState {
    Ready,
    Exhausted,
}

/// Lazy, restartable page sequence for one filter
pub struct Paginator<'a> {
    api: &'a dyn OrderApi,
    filter: OrderFilter,
    page_size: u32,
    max_pages: u32,
    cursor: Option<String>,
    pages_fetched: u32,
    state: PageState,
    truncated: bool,
    warning: Option<String>,
}

impl<'a> Paginator<'a> {
    pub fn new(api: &'a dyn OrderApi, filter: OrderFilter, config: &FetchConfig) -> Self {
        let config = config.normalized();
        Self {
            api,
            filter,
            page_size: config.page_size,
            max_pages: config.max_pages,
            cursor: None,
            pages_fetched: 0,
            state: PageState::Ready,
            truncated: false,
            warning: None,
        }
    }

    pub fn filter(&self) -> &OrderFilter {
        &self.filter
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Rewind to the first page
    pub fn restart(&mut self) {
        self.cursor = None;
        self.pages_fetched = 0;
        self.state = PageState::Ready;
        self.truncated = false;
        self.warning = None;
    }

    /// Next page of summaries; `None` once the run is over
    pub async fn next_page(&mut self) -> Option<Vec<OrderSummary>> {
        if self.state == PageState::Exhausted {
            return None;
        }

        if self.pages_fetched >= self.max_pages {
            tracing::warn!(
                field = self.filter.field.as_str(),
                max_pages = self.max_pages,
                "Page ceiling reached with more pages reported, stopping"
            );
            self.truncated = true;
            self.state = PageState::Exhausted;
            return None;
        }

        let page = match self
            .api
            .list_orders(&self.filter, self.page_size, self.cursor.as_deref())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    field = self.filter.field.as_str(),
                    page = self.pages_fetched + 1,
                    "Order list query failed, keeping partial results: {e}"
                );
                self.warning = Some(format!(
                    "{} run stopped after {} page(s): {e}",
                    self.filter.field.as_str(),
                    self.pages_fetched
                ));
                self.state = PageState::Exhausted;
                return None;
            }
        };

        self.pages_fetched += 1;
        match (page.page_info.has_next_page, page.page_info.end_cursor) {
            (true, Some(cursor)) => self.cursor = Some(cursor),
            (true, None) => {
                tracing::warn!(
                    field = self.filter.field.as_str(),
                    page = self.pages_fetched,
                    "hasNextPage without endCursor, stopping"
                );
                self.warning = Some(format!(
                    "{} run stopped: next page reported without a cursor",
                    self.filter.field.as_str()
                ));
                self.state = PageState::Exhausted;
            }
            (false, _) => self.state = PageState::Exhausted,
        }

        Some(page.edges)
    }

    /// Drain every remaining page
    pub async fn fetch_all(&mut self) -> FetchOutcome {
        let mut orders = Vec::new();
        while let Some(page) = self.next_page().await {
            orders.extend(page);
        }
        tracing::debug!(
            field = self.filter.field.as_str(),
            pages = self.pages_fetched,
            orders = orders.len(),
            truncated = self.truncated,
            "Predicate run finished"
        );
        FetchOutcome {
            orders,
            pages: self.pages_fetched,
            truncated: self.truncated,
            warning: self.warning.clone(),
        }
    }
}

/// Run the created-in-window and modified-in-window predicates concurrently
pub async fn fetch_created_and_modified(
    api: &dyn OrderApi,
    created: OrderFilter,
    modified: OrderFilter,
    config: &FetchConfig,
) -> (FetchOutcome, FetchOutcome) {
    let mut created_run = Paginator::new(api, created, config);
    let mut modified_run = Paginator::new(api, modified, config);
    tokio::join!(created_run.fetch_all(), modified_run.fetch_all())
}
