//! Audit route over the event store.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;

use vivah_address::application::query_handlers::{self, EventView};

use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Exact event type tag to match.
    pub event_type: String,
}

/// GET /?event_type=
#[instrument(skip(state, query), fields(event_type = %query.event_type))]
async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventView>>, ApiError> {
    let events =
        query_handlers::get_events_by_type(&query.event_type, state.event_store.as_ref()).await?;
    Ok(Json(events))
}

/// Returns the router for the event audit endpoint.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_events))
}
