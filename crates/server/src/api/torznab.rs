use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use gffree_core::TorznabParams;

use crate::state::AppState;

pub const XML_CONTENT_TYPE: &str = "application/xml";

/// `GET /api`: the Torznab entry point.
///
/// The query is taken as raw pairs so repeated keys reach the endpoint
/// instead of failing extraction with a non-XML body.
pub async fn torznab(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = TorznabParams::from_pairs(pairs);
    let response = state.endpoint().handle(&params).await;
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(header::CONTENT_TYPE, XML_CONTENT_TYPE)],
        response.body,
    )
        .into_response()
}
