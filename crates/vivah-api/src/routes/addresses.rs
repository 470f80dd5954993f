//! Routes for the Address context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use vivah_address::application::command_handlers;
use vivah_address::application::query_handlers::{self, AddressView};
use vivah_address::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    /// The owning user.
    pub user_id: i64,
    /// Optional street line.
    #[serde(default)]
    pub street: Option<String>,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Country.
    pub country: String,
}

/// Request body for PUT /{id}.
#[derive(Debug, Deserialize)]
pub struct UpdateAddressRequest {
    /// Optional street line; omitting it clears the stored street.
    #[serde(default)]
    pub street: Option<String>,
    /// City.
    pub city: String,
    /// State or province.
    pub state: String,
    /// Country.
    pub country: String,
}

/// POST /
#[instrument(skip(state, request), fields(user_id = request.user_id))]
async fn create_address(
    State(state): State<AppState>,
    Json(request): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<AddressView>), ApiError> {
    let command = commands::CreateAddress {
        correlation_id: Uuid::new_v4(),
        user_id: request.user_id,
        street: request.street,
        city: request.city,
        state: request.state,
        country: request.country,
    };

    info!(correlation_id = %command.correlation_id, "handling create_address command");

    let address = command_handlers::handle_create_address(
        &command,
        state.clock.as_ref(),
        state.writes.as_ref(),
        state.publisher(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(AddressView::from(address))))
}

/// PUT /{id}
#[instrument(skip(state, request))]
async fn update_address(
    State(state): State<AppState>,
    Path(address_id): Path<i64>,
    Json(request): Json<UpdateAddressRequest>,
) -> Result<Json<AddressView>, ApiError> {
    let command = commands::UpdateAddress {
        correlation_id: Uuid::new_v4(),
        address_id,
        street: request.street,
        city: request.city,
        state: request.state,
        country: request.country,
    };

    info!(correlation_id = %command.correlation_id, "handling update_address command");

    let address = command_handlers::handle_update_address(
        &command,
        state.clock.as_ref(),
        state.writes.as_ref(),
        state.publisher(),
    )
    .await?;

    Ok(Json(AddressView::from(address)))
}

/// DELETE /{id}
#[instrument(skip(state))]
async fn delete_address(
    State(state): State<AppState>,
    Path(address_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteAddress {
        correlation_id: Uuid::new_v4(),
        address_id,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_address command");

    command_handlers::handle_delete_address(
        &command,
        state.clock.as_ref(),
        state.writes.as_ref(),
        state.publisher(),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /{id}
#[instrument(skip(state))]
async fn get_address(
    State(state): State<AppState>,
    Path(address_id): Path<i64>,
) -> Result<Json<AddressView>, ApiError> {
    let view = query_handlers::get_address_by_id(address_id, state.addresses.as_ref()).await?;
    Ok(Json(view))
}

/// GET /
#[instrument(skip(state))]
async fn list_addresses(State(state): State<AppState>) -> Result<Json<Vec<AddressView>>, ApiError> {
    let views = query_handlers::get_all_addresses(state.addresses.as_ref()).await?;
    Ok(Json(views))
}

/// Returns the router for the address context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route(
            "/{id}",
            get(get_address).put(update_address).delete(delete_address),
        )
}
