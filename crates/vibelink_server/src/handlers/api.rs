use crate::auth::RequireOwner;
use crate::db::{ProfileInfo, ProfileRepo, ProfileUpdate, normalize_socials, normalize_username};
use crate::handlers::ApiError;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use vibelink_core::channel::ChannelResolver;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub repo: Arc<ProfileRepo>,
    pub resolver: Arc<ChannelResolver>,
}

/// Server status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub cached_channels: usize,
}

/// Create API routes
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/profile", get(get_profile).put(put_profile))
        .with_state(state)
}

/// GET /api/status - Get server status (public endpoint)
async fn get_status(State(state): State<ApiState>) -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_channels: state.resolver.cache().len(),
    })
}

/// GET /api/profile - The signed-in owner's profile
async fn get_profile(RequireOwner(owner): RequireOwner) -> Result<Json<ProfileInfo>, ApiError> {
    owner
        .profile
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No profile yet"))
}

/// PUT /api/profile - Claim a username or edit bio, avatar and social links
async fn put_profile(
    State(state): State<ApiState>,
    RequireOwner(owner): RequireOwner,
    Json(mut update): Json<ProfileUpdate>,
) -> Result<Json<ProfileInfo>, ApiError> {
    let Some(username) = normalize_username(&update.username) else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Validation",
            "Username must be 3-32 characters of letters, digits, '_', '.' or '-'",
        ));
    };

    update.socials = normalize_socials(&update.socials)
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "Validation", e.to_string()))?;

    if state.repo.is_username_taken(&username, &owner.owner_id)? {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "Conflict",
            format!("Username '{username}' is taken"),
        ));
    }

    let profile = state.repo.upsert(&owner.owner_id, &username, &update)?;
    tracing::info!("Owner {} saved profile @{}", owner.owner_id, profile.username);
    Ok(Json(profile))
}
