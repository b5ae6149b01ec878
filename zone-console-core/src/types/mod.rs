//! 类型定义模块

mod credential;
mod domain;
mod record;
mod report;
mod response;
mod template;

pub use credential::{Credential, CredentialOrder, DEFAULT_CREDENTIAL_TTL_DAYS};
pub use domain::Domain;
pub use record::{
    LineRejection, RecordIntent, RecordType, RecordUpdate, RemoteRecord, ResolvedRecord,
    APEX_MARKER,
};
pub use report::{
    BulkApplyReport, BulkDeleteFailure, BulkDeleteItem, BulkDeleteReport, DeleteOutcome,
    NormalizeReport, ReconciliationReport, ReconciliationResult, ReportItem, ResultCategory,
};
pub use response::{
    ApiResponse, ApplyRecordsResponse, BulkDeleteResponse, PageQuery, PaginatedResponse,
    Pagination,
};
pub use template::{template_slug, Template, DEFAULT_TEMPLATE_ID};
