use crate::db::{ProfileInfo, ProfileRepo, SocialLink, social_bar};
use crate::handlers::ApiError;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vibelink_core::{
    channel::ChannelResolver,
    render::{PublicBlock, RenderPlan, render_profile},
    store::BlockStore,
    block::BlockKind,
    unlock::unlock_once,
};

/// Shared state for public profile pages
#[derive(Clone)]
pub struct ProfileState {
    pub repo: Arc<ProfileRepo>,
    pub store: BlockStore,
    pub resolver: Arc<ChannelResolver>,
}

/// Profile header shown above the blocks
#[derive(Debug, Serialize)]
pub struct ProfileHeader {
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: String,
    pub socials: Vec<SocialLink>,
}

impl From<&ProfileInfo> for ProfileHeader {
    fn from(profile: &ProfileInfo) -> Self {
        Self {
            username: profile.username.clone(),
            bio: profile.bio.clone(),
            avatar_url: profile.avatar_or_default(),
            socials: social_bar(&profile.socials),
        }
    }
}

/// Outcome of resolving a `channel_latest` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelResolution {
    Found { item_id: String, embed_src: String },
    NotFound,
}

/// One block on the public page
#[derive(Debug, Serialize)]
pub struct PublicBlockResponse {
    #[serde(flatten)]
    pub block: PublicBlock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelResolution>,
}

/// GET /u/{username} response
#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub profile: ProfileHeader,
    pub blocks: Vec<PublicBlockResponse>,
}

/// Passphrase attempt for a gated block
#[derive(Debug, Deserialize)]
pub struct UnlockRequest {
    pub passphrase: String,
}

/// Unlock result; the plan is only present after a match
#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<RenderPlan>,
}

/// Create public routes (nested under /u)
pub fn public_routes(state: ProfileState) -> Router {
    Router::new()
        .route("/{username}", get(get_public_profile))
        .route("/{username}/blocks/{id}/click", post(record_click))
        .route("/{username}/blocks/{id}/unlock", post(unlock_block))
        .with_state(state)
}

fn find_profile(repo: &ProfileRepo, username: &str) -> Result<ProfileInfo, ApiError> {
    repo.get_by_username(username)?
        .ok_or_else(|| ApiError::not_found(format!("Profile '{username}' not found")))
}

/// GET /u/{username} - Public page: profile header and rendered blocks
async fn get_public_profile(
    State(state): State<ProfileState>,
    Path(username): Path<String>,
) -> Result<Json<PublicProfileResponse>, ApiError> {
    let profile = find_profile(&state.repo, &username)?;
    let blocks = state.store.list(&profile.owner_id).await?;
    let rendered = render_profile(&blocks);

    // Channel blocks resolve independently of each other
    let resolutions = join_all(rendered.iter().map(|public| {
        let resolver = state.resolver.clone();
        async move {
            match &public.plan {
                RenderPlan::ChannelLatest { channel_url, .. } => Some(
                    match resolver.latest_item(channel_url).await {
                        Some(item) => ChannelResolution::Found {
                            embed_src: item.embed_src(),
                            item_id: item.item_id,
                        },
                        None => ChannelResolution::NotFound,
                    },
                ),
                _ => None,
            }
        }
    }))
    .await;

    let blocks = rendered
        .into_iter()
        .zip(resolutions)
        .map(|(block, channel)| PublicBlockResponse { block, channel })
        .collect();

    let repo = state.repo.clone();
    let views_for = profile.username.clone();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = repo.increment_views(&views_for) {
            tracing::warn!("Failed to count view for {}: {}", views_for, e);
        }
    });

    Ok(Json(PublicProfileResponse {
        profile: ProfileHeader::from(&profile),
        blocks,
    }))
}

/// POST /u/{username}/blocks/{id}/click - Count a click without delaying navigation
async fn record_click(
    State(state): State<ProfileState>,
    Path((username, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let profile = find_profile(&state.repo, &username)?;
    let store = state.store.clone();
    tokio::spawn(async move {
        store.record_interaction(&profile.owner_id, &id).await;
    });
    Ok(StatusCode::NO_CONTENT)
}

/// POST /u/{username}/blocks/{id}/unlock - Check a passphrase server-side
async fn unlock_block(
    State(state): State<ProfileState>,
    Path((username, id)): Path<(String, String)>,
    Json(request): Json<UnlockRequest>,
) -> Result<Json<UnlockResponse>, ApiError> {
    let profile = find_profile(&state.repo, &username)?;
    let block = state.store.get(&profile.owner_id, &id).await?;

    if !matches!(block.kind, BlockKind::GatedLink { .. }) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "NotGated",
            format!("Block '{id}' is not a gated link"),
        ));
    }

    let plan = unlock_once(&block, &request.passphrase);
    Ok(Json(UnlockResponse {
        unlocked: plan.is_some(),
        plan,
    }))
}
