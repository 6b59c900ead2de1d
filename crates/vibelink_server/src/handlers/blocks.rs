use crate::auth::RequireOwner;
use crate::handlers::ApiError;
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post, put},
};
use serde::{Deserialize, Serialize};
use vibelink_core::{
    block::{Block, BlockPatch, NewBlock},
    reorder::{ReorderCoordinator, SyncFailurePolicy, SyncStatus},
    store::BlockStore,
};

/// Shared state for the owner's block API
#[derive(Clone)]
pub struct BlocksState {
    pub store: BlockStore,
    pub coordinator: ReorderCoordinator,
    pub failure_policy: SyncFailurePolicy,
}

impl BlocksState {
    pub fn new(store: BlockStore) -> Self {
        Self {
            coordinator: ReorderCoordinator::new(store.clone()),
            store,
            failure_policy: SyncFailurePolicy::default(),
        }
    }
}

/// Full order for PUT /api/blocks/order
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub ids: Vec<String>,
}

/// Single drag for POST /api/blocks/move
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

/// Result of a drag
#[derive(Debug, Serialize)]
pub struct MoveResponse {
    pub moved: bool,
    pub sync: SyncStatus,
    pub blocks: Vec<Block>,
}

/// Create block routes (nested under /api/blocks)
pub fn block_routes(state: BlocksState) -> Router {
    Router::new()
        .route("/", get(list_blocks).post(create_block))
        .route("/order", put(set_order))
        .route("/move", post(move_block))
        .route("/{id}", patch(update_block).delete(delete_block))
        .with_state(state)
}

/// GET /api/blocks - The owner's blocks in position order
async fn list_blocks(
    State(state): State<BlocksState>,
    RequireOwner(owner): RequireOwner,
) -> Result<Json<Vec<Block>>, ApiError> {
    Ok(Json(state.store.list(&owner.owner_id).await?))
}

/// POST /api/blocks - Append a block
async fn create_block(
    State(state): State<BlocksState>,
    RequireOwner(owner): RequireOwner,
    Json(new): Json<NewBlock>,
) -> Result<(StatusCode, Json<Block>), ApiError> {
    let block = state.store.create(&owner.owner_id, new).await?;
    tracing::info!(
        "Owner {} created {} block {}",
        owner.owner_id,
        block.kind.type_name(),
        block.id
    );
    Ok((StatusCode::CREATED, Json(block)))
}

/// PATCH /api/blocks/{id} - Edit fields of one block
async fn update_block(
    State(state): State<BlocksState>,
    RequireOwner(owner): RequireOwner,
    Path(id): Path<String>,
    Json(patch): Json<BlockPatch>,
) -> Result<Json<Block>, ApiError> {
    Ok(Json(state.store.update(&owner.owner_id, &id, &patch).await?))
}

/// DELETE /api/blocks/{id} - Remove a block and close the gap
async fn delete_block(
    State(state): State<BlocksState>,
    RequireOwner(owner): RequireOwner,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(&owner.owner_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/blocks/order - Persist a full order computed by the client
async fn set_order(
    State(state): State<BlocksState>,
    RequireOwner(owner): RequireOwner,
    Json(order): Json<OrderRequest>,
) -> Result<Json<Vec<Block>>, ApiError> {
    state.store.set_positions(&owner.owner_id, &order.ids).await?;
    Ok(Json(state.store.list(&owner.owner_id).await?))
}

/// POST /api/blocks/move - Apply one drag server-side
async fn move_block(
    State(state): State<BlocksState>,
    RequireOwner(owner): RequireOwner,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let mut session = state
        .coordinator
        .load(&owner.owner_id, state.failure_policy)
        .await?;
    let moved = state
        .coordinator
        .drag_end(&mut session, request.from, request.to)
        .await?;

    Ok(Json(MoveResponse {
        moved,
        sync: session.status().clone(),
        blocks: session.blocks().to_vec(),
    }))
}
