//! Acting user extraction.
//!
//! The caller identifies the user in `X-User-ID`. The header is optional: when
//! absent, movements have no `created_by` and audit entries no actor.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const USER_ID_HEADER: &str = "X-User-ID";

/// User performing the request, if known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor(pub Option<String>);

impl Actor {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if let Some(ref uid) = user_id {
            tracing::Span::current().record("user_id", uid.as_str());
        }

        Ok(Actor(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Actor {
        let (mut parts, _) = request.into_parts();
        Actor::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_actor_from_header() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "maria")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.as_deref(), Some("maria"));
    }

    #[tokio::test]
    async fn test_missing_or_blank_header_is_anonymous() {
        let request = Request::builder().body(()).unwrap();
        assert_eq!(extract(request).await, Actor(None));

        let request = Request::builder()
            .header(USER_ID_HEADER, "  ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await, Actor(None));
    }
}
