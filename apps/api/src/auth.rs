//! Request-scoped identity.
//!
//! Authentication happens upstream (the gateway in front of this service); it
//! forwards the authenticated user id in a header. `require_identity` turns that
//! header into an `Identity` extension which every `/api` handler receives
//! explicitly. Path or body user ids are never trusted on their own.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Rejects the request unless the caller is `user_id`.
    pub fn ensure_is(&self, user_id: &str) -> Result<(), AppError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            tracing::warn!(
                caller = %self.user_id,
                target_user = %user_id,
                "Rejected cross-user access"
            );
            Err(AppError::Forbidden)
        }
    }

    /// Like `ensure_is`, for optional ids echoed in request bodies.
    pub fn ensure_matches(&self, claimed: Option<&str>) -> Result<(), AppError> {
        match claimed {
            Some(id) if !id.is_empty() => self.ensure_is(id),
            _ => Ok(()),
        }
    }
}

pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = req
        .headers()
        .get(state.config.identity_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AppError::Unauthorized)?
        .to_string();

    req.extensions_mut().insert(Identity { user_id });
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_is() {
        let me = Identity::new("u1");
        assert!(me.ensure_is("u1").is_ok());
        assert!(matches!(me.ensure_is("u2"), Err(AppError::Forbidden)));
    }

    #[test]
    fn test_ensure_matches_ignores_absent_ids() {
        let me = Identity::new("u1");
        assert!(me.ensure_matches(None).is_ok());
        assert!(me.ensure_matches(Some("")).is_ok());
        assert!(me.ensure_matches(Some("u1")).is_ok());
        assert!(me.ensure_matches(Some("u9")).is_err());
    }
}
