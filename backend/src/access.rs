//! Ownership gate for loans and payments
//!
//! Loans are scoped to the user who created them and payments inherit the
//! owner of their loan. The checks run in a fixed order (existence, then
//! authentication, then ownership) because the order decides which status
//! code a client sees.

use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

/// Reasons access to a record is refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("Permission Denied")]
    Forbidden,
}

/// Resolve whether `requester` may act on a record owned by `owner`.
///
/// `owner` is `None` when the record does not exist; `requester` is `None`
/// when no valid identity was presented. Returns the requester's id.
pub fn authorize(
    resource: &'static str,
    requester: Option<Uuid>,
    owner: Option<Uuid>,
) -> Result<Uuid, AccessDenied> {
    let owner = owner.ok_or(AccessDenied::NotFound(resource))?;
    let requester = requester.ok_or(AccessDenied::Unauthenticated)?;

    if requester != owner {
        tracing::warn!(resource, %requester, "Cross-owner access denied");
        return Err(AccessDenied::Forbidden);
    }

    Ok(requester)
}

impl From<AccessDenied> for ApiError {
    fn from(err: AccessDenied) -> Self {
        match err {
            AccessDenied::NotFound(_) => ApiError::NotFound(err.to_string()),
            AccessDenied::Unauthenticated => ApiError::Unauthorized(err.to_string()),
            AccessDenied::Forbidden => ApiError::Forbidden(err.to_string()),
        }
    }
}
