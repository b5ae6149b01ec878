//! List view state shared by the domains and records screens

mod item;
mod state;

pub use item::{
    compare_text, DomainField, DomainFilter, RecordField, RecordFilter, SortDirection, ViewItem,
};
pub use state::{ActionTicket, ApplyOutcome, LoadState, PageRequest, RequestToken, ViewState};

use crate::types::{Domain, RemoteRecord};

/// Records list of one zone
pub type RecordsView = ViewState<RemoteRecord>;

/// Zones list
pub type DomainsView = ViewState<Domain>;
