use axum::http::HeaderMap;
use std::str::FromStr;
use std::sync::Arc;

use super::{AuthError, Role, Session};

/// Builds a [`Session`] from request headers.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<Session, AuthError>;
}

pub type SharedSessionResolver = Arc<dyn SessionResolver>;

/// Reads identity headers stamped by the gateway in front of the service:
/// `{prefix}-user-id`, `{prefix}-role` and `{prefix}-base-id`.
#[derive(Debug, Clone)]
pub struct TrustedHeaderResolver {
    user_header: String,
    role_header: String,
    base_header: String,
}

impl TrustedHeaderResolver {
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('-').to_ascii_lowercase();
        Self {
            user_header: format!("{}-user-id", prefix),
            role_header: format!("{}-role", prefix),
            base_header: format!("{}-base-id", prefix),
        }
    }

    pub fn user_header(&self) -> &str {
        &self.user_header
    }

    pub fn role_header(&self) -> &str {
        &self.role_header
    }

    pub fn base_header(&self) -> &str {
        &self.base_header
    }

    fn header<'a>(&self, headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AuthError> {
        match headers.get(name) {
            None => Ok(None),
            Some(value) => value
                .to_str()
                .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
                .map_err(|_| AuthError::InvalidSession(format!("{} is not valid text", name))),
        }
    }
}

impl SessionResolver for TrustedHeaderResolver {
    fn resolve(&self, headers: &HeaderMap) -> Result<Session, AuthError> {
        let user_id = self.header(headers, &self.user_header)?;
        let role = self.header(headers, &self.role_header)?;
        let base_id = self.header(headers, &self.base_header)?;

        let (user_id, role, base_id) = match (user_id, role, base_id) {
            (None, None, None) => return Err(AuthError::MissingSession),
            (Some(u), Some(r), Some(b)) => (u, r, b),
            _ => {
                return Err(AuthError::InvalidSession(format!(
                    "{}, {} and {} must all be present",
                    self.user_header, self.role_header, self.base_header
                )))
            }
        };

        let role = Role::from_str(role)
            .map_err(|_| AuthError::InvalidSession(format!("unknown role '{}'", role)))?;

        Ok(Session::new(user_id, role, base_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn resolves_complete_headers() {
        let resolver = TrustedHeaderResolver::new("x-garrison");
        let session = resolver
            .resolve(&headers(&[
                ("x-garrison-user-id", "u-17"),
                ("x-garrison-role", "logistics"),
                ("x-garrison-base-id", "base-alpha"),
            ]))
            .unwrap();
        assert_eq!(session, Session::new("u-17", Role::Logistics, "base-alpha"));
    }

    #[test]
    fn no_headers_is_missing_session() {
        let resolver = TrustedHeaderResolver::new("x-garrison-");
        assert_matches!(
            resolver.resolve(&HeaderMap::new()),
            Err(AuthError::MissingSession)
        );
    }

    #[test]
    fn partial_or_unknown_role_is_invalid() {
        let resolver = TrustedHeaderResolver::new("x-garrison");
        assert_matches!(
            resolver.resolve(&headers(&[("x-garrison-user-id", "u-17")])),
            Err(AuthError::InvalidSession(_))
        );
        assert_matches!(
            resolver.resolve(&headers(&[
                ("x-garrison-user-id", "u-17"),
                ("x-garrison-role", "general"),
                ("x-garrison-base-id", "base-alpha"),
            ])),
            Err(AuthError::InvalidSession(msg)) if msg.contains("general")
        );
    }
}
