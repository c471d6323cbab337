pub mod approver;
pub mod request;

pub use approver::{ApproverDirectory, ApproverProfile, InMemoryApproverDirectory};
pub use request::{MonetaryRequest, RequestCategory, TaskId};

pub(crate) fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
