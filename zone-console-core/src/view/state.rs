//! Paginated list state: one server page plus local filter, sort and selection

use std::collections::HashSet;

use serde::Serialize;

use super::item::{compare_text, SortDirection, ViewItem};
use crate::error::{CoreError, CoreResult};
use crate::types::{PageQuery, PaginatedResponse, Pagination};

/// Loading phase of the list
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
    /// The credential was rejected; the consumer should show the sign-in form
    Unauthenticated,
}

/// Identifies one page request. Only the newest token may apply its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// A page request handed to the caller to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub token: RequestToken,
    pub query: PageQuery,
}

/// What [`ViewState::apply_response`] did with a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer request was issued; the response was dropped
    Stale,
    Unauthenticated,
    Failed(String),
}

/// Proof that a mutating action holds the in-flight slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTicket {
    id: u64,
    page: u32,
    server_search: Option<String>,
    selected: Vec<String>,
}

impl ActionTicket {
    /// Selected ids (in view order) at the moment the action began
    #[must_use]
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingRequest {
    token: u64,
    page: u32,
    server_search: Option<String>,
}

/// State of one server-paginated list.
///
/// `fetched` holds the current page as returned by the server; `derived`
/// is `fetched` after the local filter and then the sort. Selection is
/// always a subset of the ids in `derived`.
#[derive(Debug, Clone)]
pub struct ViewState<T: ViewItem> {
    page: u32,
    page_size: u32,
    server_search: Option<String>,
    pagination: Option<Pagination>,
    fetched: Vec<T>,
    derived: Vec<T>,
    filter: T::Filter,
    sort: Option<(T::Field, SortDirection)>,
    selected: HashSet<String>,
    load_state: LoadState,
    last_token: u64,
    pending: Option<PendingRequest>,
    next_action_id: u64,
    action_in_flight: Option<u64>,
}

impl<T: ViewItem> ViewState<T> {
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            server_search: None,
            pagination: None,
            fetched: Vec::new(),
            derived: Vec::new(),
            filter: T::Filter::default(),
            sort: None,
            selected: HashSet::new(),
            load_state: LoadState::Idle,
            last_token: 0,
            pending: None,
            next_action_id: 0,
            action_in_flight: None,
        }
    }

    // ===== Accessors =====

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn server_search(&self) -> Option<&str> {
        self.server_search.as_deref()
    }

    #[must_use]
    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    #[must_use]
    pub fn has_next_page(&self) -> bool {
        self.pagination
            .as_ref()
            .is_some_and(|p| p.page < p.total_pages)
    }

    #[must_use]
    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    #[must_use]
    pub fn fetched_items(&self) -> &[T] {
        &self.fetched
    }

    /// Rows to render: fetched, filtered, sorted
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.derived
    }

    #[must_use]
    pub fn filter(&self) -> &T::Filter {
        &self.filter
    }

    #[must_use]
    pub fn sort(&self) -> Option<(T::Field, SortDirection)> {
        self.sort
    }

    // ===== Server pages =====

    /// Start loading `page`. Any earlier request still in flight becomes stale.
    pub fn request_page(&mut self, page: u32, search: Option<String>) -> PageRequest {
        self.last_token += 1;
        let query = PageQuery::new(page, self.page_size, search);
        self.pending = Some(PendingRequest {
            token: self.last_token,
            page: query.page,
            server_search: query.search.clone(),
        });
        self.load_state = LoadState::Loading;
        log::debug!(
            "Requesting page {} (search: {:?}, token {})",
            query.page,
            query.search,
            self.last_token
        );
        PageRequest {
            token: RequestToken(self.last_token),
            query,
        }
    }

    /// Re-request the current page with the current server search
    pub fn refresh(&mut self) -> PageRequest {
        self.request_page(self.page, self.server_search.clone())
    }

    /// Apply the result of a page request.
    ///
    /// A new page replaces the fetched items, clears the selection and
    /// re-runs the local filter and sort.
    pub fn apply_response(
        &mut self,
        token: RequestToken,
        result: CoreResult<PaginatedResponse<T>>,
    ) -> ApplyOutcome {
        let pending = match self.pending.take() {
            Some(pending) if pending.token == token.0 => pending,
            other => {
                self.pending = other;
                log::debug!("Dropping stale response for token {}", token.0);
                return ApplyOutcome::Stale;
            }
        };

        match result {
            Ok(response) => {
                self.page = pending.page;
                self.server_search = pending.server_search;
                self.pagination = Some(Pagination {
                    page: response.page,
                    per_page: response.page_size,
                    total_count: response.total_count,
                    total_pages: response.total_pages,
                });
                self.fetched = response.items;
                self.selected.clear();
                self.rederive();
                self.load_state = LoadState::Loaded;
                ApplyOutcome::Applied
            }
            Err(CoreError::Unauthenticated) => {
                self.load_state = LoadState::Unauthenticated;
                ApplyOutcome::Unauthenticated
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Failed to load page {}: {message}", pending.page);
                self.load_state = LoadState::Error(message.clone());
                ApplyOutcome::Failed(message)
            }
        }
    }

    // ===== Local filter & sort =====

    /// Replace the local filter. Selected rows that are no longer visible are deselected.
    pub fn apply_local_filter(&mut self, filter: T::Filter) {
        self.filter = filter;
        self.rederive();
    }

    /// Sort by `field`; sorting by the current field again flips the direction
    pub fn apply_sort(&mut self, field: T::Field) {
        let direction = match self.sort {
            Some((current, direction)) if current == field => direction.toggled(),
            _ => SortDirection::Asc,
        };
        self.set_sort(field, direction);
    }

    pub fn set_sort(&mut self, field: T::Field, direction: SortDirection) {
        self.sort = Some((field, direction));
        self.rederive();
    }

    /// Back to server order
    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.rederive();
    }

    fn rederive(&mut self) {
        let mut derived: Vec<T> = self
            .fetched
            .iter()
            .filter(|item| item.matches(&self.filter))
            .cloned()
            .collect();

        if let Some((field, direction)) = self.sort {
            derived.sort_by(|a, b| {
                let ord = compare_text(&a.sort_text(field), &b.sort_text(field));
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let visible: HashSet<&str> = derived.iter().map(ViewItem::id).collect();
        self.selected.retain(|id| visible.contains(id.as_str()));
        self.derived = derived;
    }

    // ===== Selection =====

    /// Flip selection of a visible row. Returns whether it is now selected.
    pub fn toggle_select(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            return false;
        }
        if self.derived.iter().any(|item| item.id() == id) {
            self.selected.insert(id.to_string());
            true
        } else {
            false
        }
    }

    /// Select every visible row
    pub fn select_all(&mut self) {
        self.selected = self.derived.iter().map(|i| i.id().to_string()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Deselect the given ids, ignoring ones not selected
    pub fn deselect<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.selected.remove(id.as_ref());
        }
    }

    #[must_use]
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// True when there is at least one visible row and all are selected
    #[must_use]
    pub fn is_all_selected(&self) -> bool {
        !self.derived.is_empty() && self.selected.len() == self.derived.len()
    }

    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected ids in the order they are displayed
    #[must_use]
    pub fn selected_ids(&self) -> Vec<String> {
        self.derived
            .iter()
            .map(ViewItem::id)
            .filter(|id| self.selected.contains(*id))
            .map(str::to_string)
            .collect()
    }

    // ===== In-flight guard =====

    #[must_use]
    pub fn action_in_flight(&self) -> bool {
        self.action_in_flight.is_some()
    }

    /// Claim the single in-flight slot for a mutating action
    pub fn try_begin_action(&mut self) -> CoreResult<ActionTicket> {
        if self.action_in_flight.is_some() {
            return Err(CoreError::ActionInProgress);
        }
        self.next_action_id += 1;
        self.action_in_flight = Some(self.next_action_id);
        Ok(ActionTicket {
            id: self.next_action_id,
            page: self.page,
            server_search: self.server_search.clone(),
            selected: self.selected_ids(),
        })
    }

    /// Release the slot. A ticket that no longer owns it is ignored.
    pub fn finish_action(&mut self, ticket: &ActionTicket) {
        if self.action_in_flight == Some(ticket.id) {
            self.action_in_flight = None;
        }
    }

    /// Whether the list still shows the page the action started on
    #[must_use]
    pub fn ticket_matches_view(&self, ticket: &ActionTicket) -> bool {
        self.page == ticket.page && self.server_search == ticket.server_search
    }
}
