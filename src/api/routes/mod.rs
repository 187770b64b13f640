//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`jobs`] - Clone job control and status
//! - [`system`] - Health, events, OpenAPI

use crate::types::{ChatId, CloneRange, MessageId, UserId};
use serde::{Deserialize, Serialize};

mod jobs;
mod system;

pub use jobs::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /users/:user_id/clone
///
/// Omit both bounds for a full clone; give both for an inclusive range.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StartCloneRequest {
    /// Chat that receives status notifications
    #[schema(value_type = i64)]
    pub chat_id: ChatId,
    /// First message id to clone (inclusive)
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub start_id: Option<MessageId>,
    /// Last message id to clone (inclusive)
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub end_id: Option<MessageId>,
}

impl StartCloneRequest {
    /// Range described by the request, or a validation message
    pub fn range(&self) -> std::result::Result<Option<CloneRange>, String> {
        match (self.start_id, self.end_id) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) if start <= end => Ok(Some(CloneRange::new(start, end))),
            (Some(start), Some(end)) => Err(format!(
                "start_id ({start}) must not be greater than end_id ({end})"
            )),
            _ => Err("start_id and end_id must be given together".to_string()),
        }
    }
}

/// Request body for POST /users/:user_id/resume
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ResumeRequest {
    /// Chat that receives status notifications
    #[schema(value_type = i64)]
    pub chat_id: ChatId,
}

/// Response for an accepted clone or resume request
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct JobAccepted {
    /// Owner of the new job
    pub user_id: UserId,
    /// Selected range, if bounded
    pub range: Option<CloneRange>,
}

/// Response for POST /users/:user_id/stop
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StopAccepted {
    /// Owner of the job
    pub user_id: UserId,
    /// Whether a running job was signalled (the stop marker is written either way)
    pub signalled: bool,
}
