use crate::db::{ProfileInfo, ProfileRepo};
use axum::{
    extract::FromRequestParts,
    http::{
        StatusCode,
        header::{HeaderName, InvalidHeaderName},
        request::Parts,
    },
};
use std::sync::Arc;

/// Signed-in owner extracted from request
#[derive(Debug, Clone)]
pub struct AuthOwner {
    pub owner_id: String,
    /// `None` until the owner has claimed a username
    pub profile: Option<ProfileInfo>,
}

/// Reads the owner id an upstream auth gateway put in a trusted header.
///
/// The header must be stripped from client requests by that gateway; this
/// server does no credential checks of its own.
#[derive(Clone)]
pub struct OwnerExtractor {
    header: HeaderName,
    repo: Arc<ProfileRepo>,
}

/// Extractor for optional authentication
///
/// Use this when auth is optional (e.g., public endpoints that behave differently for the owner)
#[derive(Debug, Clone)]
pub struct OptionalOwner(pub Option<AuthOwner>);

/// Extractor for required authentication
///
/// Use this for dashboard endpoints - returns 401 if not signed in
#[derive(Debug, Clone)]
pub struct RequireOwner(pub AuthOwner);

impl OwnerExtractor {
    pub fn new(header: &str, repo: Arc<ProfileRepo>) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::from_bytes(header.as_bytes())?,
            repo,
        })
    }

    /// Extract the owner from the request headers
    pub fn extract_owner(&self, parts: &Parts) -> Option<AuthOwner> {
        let owner_id = parts
            .headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())?
            .to_string();

        let profile = match self.repo.get(&owner_id) {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!("Failed to load profile for {}: {}", owner_id, e);
                None
            }
        };

        Some(AuthOwner { owner_id, profile })
    }
}

impl<S> FromRequestParts<S> for OptionalOwner
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let extractor = parts
            .extensions
            .get::<OwnerExtractor>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Auth not configured"))?;

        Ok(OptionalOwner(extractor.extract_owner(parts)))
    }
}

impl<S> FromRequestParts<S> for RequireOwner
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalOwner(owner) = OptionalOwner::from_request_parts(parts, state).await?;

        match owner {
            Some(owner) => Ok(RequireOwner(owner)),
            None => Err((StatusCode::UNAUTHORIZED, "Sign in required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ProfileUpdate, init_database};
    use axum::http::Request;
    use rusqlite::Connection;

    fn extractor() -> OwnerExtractor {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        let repo = Arc::new(ProfileRepo::new(conn));
        repo.upsert(
            "owner-1",
            "alice",
            &ProfileUpdate {
                username: "alice".into(),
                ..Default::default()
            },
        )
        .unwrap();
        OwnerExtractor::new("x-vibelink-owner", repo).unwrap()
    }

    fn parts(owner: Option<&str>, with_extractor: bool) -> Parts {
        let mut builder = Request::builder().uri("/api/blocks");
        if let Some(owner) = owner {
            builder = builder.header("x-vibelink-owner", owner);
        }
        if with_extractor {
            builder = builder.extension(extractor());
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_require_owner_with_header() {
        let mut parts = parts(Some("owner-1"), true);
        let RequireOwner(owner) = RequireOwner::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(owner.owner_id, "owner-1");
        assert_eq!(owner.profile.unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_owner_without_profile() {
        let mut parts = parts(Some("owner-2"), true);
        let OptionalOwner(owner) = OptionalOwner::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        let owner = owner.unwrap();
        assert_eq!(owner.owner_id, "owner-2");
        assert!(owner.profile.is_none());
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let mut parts = parts(None, true);
        let err = RequireOwner::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let mut blank = parts_with_blank();
        assert!(
            RequireOwner::from_request_parts(&mut blank, &())
                .await
                .is_err()
        );
    }

    fn parts_with_blank() -> Parts {
        Request::builder()
            .header("x-vibelink-owner", "  ")
            .extension(extractor())
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_missing_extension_is_server_error() {
        let mut parts = parts(Some("owner-1"), false);
        let err = OptionalOwner::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_header_name() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(OwnerExtractor::new("bad header", Arc::new(ProfileRepo::new(conn))).is_err());
    }
}
