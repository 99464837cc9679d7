/*!
 * # Session and role guards
 *
 * Identity is established upstream. Each request carries a [`Session`]
 * (user, role, home base) that a [`SessionResolver`] builds from the request
 * headers; route guards then admit or reject the request by role.
 *
 * Token issuance and verification are not handled here.
 */

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::errors::ServiceError;

mod session;

pub use session::{SessionResolver, SharedSessionResolver, TrustedHeaderResolver};

/// Organisational role of the caller.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    Commander,
    Logistics,
}

impl Role {
    /// Every role that may read base-scoped data.
    pub const READERS: &'static [Role] = &[Role::Admin, Role::Commander, Role::Logistics];
    /// Roles allowed to record purchases, transfers and assignments.
    pub const WRITERS: &'static [Role] = &[Role::Admin, Role::Logistics];
    pub const ADMIN_ONLY: &'static [Role] = &[Role::Admin];
}

/// Identity context for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub role: Role,
    pub base_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role, base_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            base_id: base_id.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    /// The base a read should target: admins may pick any base, everyone
    /// else is pinned to their own.
    pub fn scoped_base(&self, requested: Option<&str>) -> Result<String, ServiceError> {
        match requested.map(str::trim).filter(|b| !b.is_empty()) {
            None => Ok(self.base_id.clone()),
            Some(base) if base == self.base_id || self.is_admin() => Ok(base.to_string()),
            Some(base) => Err(ServiceError::Forbidden(format!(
                "{} users may only view their own base, not {}",
                self.role, base
            ))),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing session")]
    MissingSession,

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Role {0} is not allowed here")]
    InsufficientRole(Role),

    #[error("Session resolver not configured")]
    ResolverUnavailable,
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingSession | AuthError::InvalidSession(_) => {
                ServiceError::Unauthorized(err.to_string())
            }
            AuthError::InsufficientRole(_) => ServiceError::Forbidden(err.to_string()),
            AuthError::ResolverUnavailable => ServiceError::InternalError(err.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Resolves the session and stores it in request extensions.
pub async fn session_middleware(mut request: Request, next: Next) -> Result<Response, AuthError> {
    let resolver = request
        .extensions()
        .get::<SharedSessionResolver>()
        .cloned()
        .ok_or(AuthError::ResolverUnavailable)?;

    let session = resolver.resolve(request.headers()).map_err(|e| {
        warn!(error = %e, "Rejected request without a usable session");
        e
    })?;

    debug!(user_id = %session.user_id, role = %session.role, base_id = %session.base_id, "Session resolved");
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Admits the request only if the session role is in the allowed set.
pub async fn role_middleware(
    State(allowed): State<Arc<[Role]>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let session = request
        .extensions()
        .get::<Session>()
        .ok_or(AuthError::MissingSession)?;

    if !session.has_any_role(&allowed) {
        return Err(AuthError::InsufficientRole(session.role));
    }

    Ok(next.run(request).await)
}

pub trait AuthRouterExt {
    fn with_session(self) -> Self;
    fn with_roles(self, roles: &[Role]) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_session(self) -> Self {
        self.layer(axum::middleware::from_fn(session_middleware))
    }

    fn with_roles(self, roles: &[Role]) -> Self {
        let allowed: Arc<[Role]> = Arc::from(roles);
        self.layer(axum::middleware::from_fn_with_state(allowed, role_middleware))
            .with_session()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::str::FromStr;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("Logistics").unwrap(), Role::Logistics);
        assert!(Role::from_str("quartermaster").is_err());
        assert_eq!(Role::Commander.to_string(), "commander");
    }

    #[test]
    fn non_admin_is_pinned_to_home_base() {
        let session = Session::new("u1", Role::Commander, "base-alpha");
        assert_eq!(session.scoped_base(None).unwrap(), "base-alpha");
        assert_eq!(session.scoped_base(Some("base-alpha")).unwrap(), "base-alpha");
        assert_matches!(
            session.scoped_base(Some("base-bravo")),
            Err(ServiceError::Forbidden(_))
        );
    }

    #[test]
    fn admin_may_pick_any_base() {
        let session = Session::new("root", Role::Admin, "hq");
        assert_eq!(session.scoped_base(Some("base-bravo")).unwrap(), "base-bravo");
        assert_eq!(session.scoped_base(Some("  ")).unwrap(), "hq");
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        use axum::http::StatusCode;
        assert_eq!(
            ServiceError::from(AuthError::MissingSession).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::from(AuthError::InsufficientRole(Role::Commander)).status_code(),
            StatusCode::FORBIDDEN
        );
    }
}
