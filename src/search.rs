//! Search state shared by the catalog grid, the filter drawer and the
//! AI search box.
//!
//! Widgets keep a draft copy of the filters while the user edits them and
//! only the published [`ActiveSearch`] snapshot drives fetches. Every
//! publication bumps `generation`, so re-submitting the exact same AI query
//! still produces observable transitions and a fresh fetch.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::catalog::ProductFilters;

/// Delay between the last filter keystroke and the automatic apply on
/// desktop layouts
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(250);

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Desktop applies filter edits automatically after a short debounce;
/// mobile holds them until the drawer's apply button is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    Desktop,
    Mobile,
}

/// The snapshot observers fetch against. `ai_query` being set means the
/// grid shows AI results; the manual filters are retained underneath but
/// withheld from fetching until the query is cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSearch {
    pub generation: u64,
    pub ai_query: Option<String>,
    pub filters: ProductFilters,
    pub page: u32,
    pub page_size: u32,
}

impl ActiveSearch {
    pub fn showing_ai(&self) -> bool {
        self.ai_query.is_some()
    }
}

/// Yesterday-through-today, the window the grid opens with
pub fn default_filters() -> ProductFilters {
    let today = chrono::Local::now().date_naive();
    let yesterday = today
        .checked_sub_days(chrono::Days::new(1))
        .unwrap_or(today);
    let mut filters = ProductFilters::default();
    filters.set_date_range(
        yesterday.format("%Y-%m-%d").to_string(),
        today.format("%Y-%m-%d").to_string(),
    );
    filters
}

pub struct SearchControls {
    layout: LayoutMode,
    draft: Mutex<ProductFilters>,
    active_tx: watch::Sender<ActiveSearch>,
    active_rx: watch::Receiver<ActiveSearch>,
    drawer_tx: watch::Sender<bool>,
    drawer_rx: watch::Receiver<bool>,
    debounce_task: Mutex<Option<JoinHandle<()>>>,
}

impl SearchControls {
    pub fn new(layout: LayoutMode) -> Arc<Self> {
        let filters = default_filters();
        let (active_tx, active_rx) = watch::channel(ActiveSearch {
            generation: 0,
            ai_query: None,
            filters: filters.clone(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        });
        let (drawer_tx, drawer_rx) = watch::channel(false);
        Arc::new(Self {
            layout,
            draft: Mutex::new(filters),
            active_tx,
            active_rx,
            drawer_tx,
            drawer_rx,
            debounce_task: Mutex::new(None),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ActiveSearch> {
        self.active_rx.clone()
    }

    pub fn active(&self) -> ActiveSearch {
        self.active_rx.borrow().clone()
    }

    pub fn draft_filters(&self) -> ProductFilters {
        self.draft.lock().unwrap().clone()
    }

    pub fn showing_ai(&self) -> bool {
        self.active_rx.borrow().showing_ai()
    }

    pub fn is_drawer_open(&self) -> bool {
        *self.drawer_rx.borrow()
    }

    pub fn subscribe_drawer(&self) -> watch::Receiver<bool> {
        self.drawer_rx.clone()
    }

    pub fn open_drawer(&self) {
        self.drawer_tx.send_replace(true);
    }

    pub fn close_drawer(&self) {
        self.drawer_tx.send_replace(false);
    }

    /// Record an edit to the draft filters.
    ///
    /// On desktop this restarts the debounce; once it fires the draft is
    /// published and any active AI query is dropped. On mobile the draft
    /// just sits until [`apply_filters`](Self::apply_filters).
    pub fn handle_draft_change(self: &Arc<Self>, filters: ProductFilters) {
        *self.draft.lock().unwrap() = filters;
        if self.layout != LayoutMode::Desktop {
            return;
        }
        self.abort_debounce();
        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            sleep(FILTER_DEBOUNCE).await;
            if let Some(controls) = weak.upgrade() {
                controls.publish_draft();
            }
        });
        *self.debounce_task.lock().unwrap() = Some(handle);
    }

    /// Publish the draft immediately (the mobile drawer's apply button)
    pub fn apply_filters(&self) {
        self.abort_debounce();
        self.publish_draft();
        self.drawer_tx.send_replace(false);
    }

    pub fn reset_filters(&self) {
        self.abort_debounce();
        let filters = default_filters();
        *self.draft.lock().unwrap() = filters.clone();
        self.active_tx.send_modify(|active| {
            active.generation += 1;
            active.ai_query = None;
            active.filters = filters;
            active.page = 0;
        });
    }

    /// Switch the grid to AI results for `query`.
    ///
    /// Re-submitting the query already being shown publishes a cleared
    /// snapshot first and then restores the query, so observers see two
    /// transitions and re-fetch.
    pub fn handle_ai_search(self: &Arc<Self>, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.abort_debounce();
        let resubmitted = self.active_rx.borrow().ai_query.as_deref() == Some(query);
        if resubmitted {
            self.active_tx.send_modify(|active| {
                active.generation += 1;
                active.ai_query = None;
                active.page = 0;
            });
        }
        let query = query.to_string();
        self.active_tx.send_modify(|active| {
            active.generation += 1;
            active.ai_query = Some(query);
            active.page = 0;
        });
    }

    /// Back to manual results; the retained filters take over again
    pub fn handle_ai_clear(&self) {
        if self.active_rx.borrow().ai_query.is_none() {
            return;
        }
        self.active_tx.send_modify(|active| {
            active.generation += 1;
            active.ai_query = None;
            active.page = 0;
        });
    }

    pub fn set_page(&self, page: u32) {
        self.active_tx.send_modify(|active| {
            active.generation += 1;
            active.page = page;
        });
    }

    pub fn set_page_size(&self, size: u32) {
        self.active_tx.send_modify(|active| {
            active.generation += 1;
            active.page_size = size.max(1);
            active.page = 0;
        });
    }

    fn publish_draft(&self) {
        let filters = self.draft.lock().unwrap().clone();
        self.active_tx.send_modify(|active| {
            active.generation += 1;
            active.ai_query = None;
            active.filters = filters;
            active.page = 0;
        });
    }

    fn abort_debounce(&self) {
        if let Some(handle) = self.debounce_task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

impl Drop for SearchControls {
    fn drop(&mut self) {
        if let Some(handle) = self.debounce_task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_span_yesterday_to_today() {
        let filters = default_filters();
        assert!(filters.date.is_none());
        assert!(filters.start_date.is_some());
        assert!(filters.end_date.is_some());
        assert!(filters.start_date < filters.end_date);
    }

    #[tokio::test(start_paused = true)]
    async fn desktop_draft_changes_coalesce_into_one_publish() {
        let controls = SearchControls::new(LayoutMode::Desktop);
        let mut rx = controls.subscribe();
        let _ = rx.borrow_and_update();

        let mut first = default_filters();
        first.brand = Some("nike".into());
        controls.handle_draft_change(first);

        tokio::time::advance(Duration::from_millis(100)).await;
        let mut second = default_filters();
        second.brand = Some("adidas".into());
        controls.handle_draft_change(second);

        tokio::time::advance(Duration::from_millis(300)).await;
        rx.changed().await.unwrap();
        let active = rx.borrow_and_update().clone();
        assert_eq!(active.filters.brand.as_deref(), Some("adidas"));
        assert_eq!(active.generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn mobile_holds_draft_until_apply() {
        let controls = SearchControls::new(LayoutMode::Mobile);
        let mut filters = default_filters();
        filters.gender = Some("women".into());
        controls.handle_draft_change(filters);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(controls.active().filters.gender.is_none());

        controls.apply_filters();
        assert_eq!(controls.active().filters.gender.as_deref(), Some("women"));
        assert!(!controls.is_drawer_open());
    }

    #[tokio::test(start_paused = true)]
    async fn ai_search_keeps_manual_filters() {
        let controls = SearchControls::new(LayoutMode::Desktop);
        let mut filters = default_filters();
        filters.brand = Some("hoka".into());
        controls.handle_draft_change(filters);
        tokio::time::advance(Duration::from_millis(300)).await;

        controls.handle_ai_search("red trail runners");
        let active = controls.active();
        assert!(active.showing_ai());
        assert_eq!(active.filters.brand.as_deref(), Some("hoka"));

        controls.handle_ai_clear();
        let active = controls.active();
        assert!(!active.showing_ai());
        assert_eq!(active.filters.brand.as_deref(), Some("hoka"));
    }

    #[tokio::test(start_paused = true)]
    async fn resubmitting_the_same_query_produces_two_transitions() {
        let controls = SearchControls::new(LayoutMode::Desktop);
        controls.handle_ai_search("waterproof boots");
        let first_generation = controls.active().generation;

        controls.handle_ai_search("waterproof boots");
        let active = controls.active();
        assert_eq!(active.ai_query.as_deref(), Some("waterproof boots"));
        assert_eq!(active.generation, first_generation + 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_debounce_is_dropped_by_ai_search() {
        let controls = SearchControls::new(LayoutMode::Desktop);
        let mut filters = default_filters();
        filters.brand = Some("asics".into());
        controls.handle_draft_change(filters);

        controls.handle_ai_search("marathon shoes");
        tokio::time::advance(Duration::from_secs(1)).await;

        let active = controls.active();
        assert!(active.showing_ai());
        assert!(active.filters.brand.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn changing_page_size_resets_the_page() {
        let controls = SearchControls::new(LayoutMode::Desktop);
        controls.set_page(3);
        assert_eq!(controls.active().page, 3);

        controls.set_page_size(48);
        let active = controls.active();
        assert_eq!(active.page_size, 48);
        assert_eq!(active.page, 0);
    }
}
