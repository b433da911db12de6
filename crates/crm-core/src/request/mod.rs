//! Service requests.

pub mod model;

pub use model::{backfill_request_id, Request, RequestSource, RequestStatus};

/// Find a request by ID.
pub fn find<'a>(requests: &'a [Request], id: &str) -> Option<&'a Request> {
    requests.iter().find(|r| r.id == id)
}
