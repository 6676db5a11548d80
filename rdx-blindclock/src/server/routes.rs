use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::middleware;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;

use crate::access::StaffAuthorizer;
use crate::common::TournamentId;
use crate::engine::{ClockAction, ClockEngine};
use crate::projector::DisplayPayload;
use crate::time::Clock;

use super::dto::{ApiResponse, TournamentListing};
use super::error::ApiError;
use super::logging::log_requests;

const LOG_TARGET: &str = "server::routes";

/// Shared state of every handler.
pub struct ServerContext {
    pub engine: ClockEngine,
    pub authorizer: Arc<dyn StaffAuthorizer>,
    pub clock: Arc<dyn Clock>,
}

/// Builds the query and action surface.
///
/// - `GET /tournaments` lists known tournaments.
/// - `GET /tournaments/:id/clock` is the public projection.
/// - `POST /tournaments/:id/clock` applies a staff action and requires a
///   bearer token of staff working at the tournament's venue.
pub fn router(context: Arc<ServerContext>) -> Router {
    Router::new()
        .route("/tournaments", get(list_tournaments))
        .route("/tournaments/:id/clock", get(get_clock).post(post_clock_action))
        .layer(middleware::from_fn(log_requests))
        .with_state(context)
}

async fn list_tournaments(
    State(ctx): State<Arc<ServerContext>>,
) -> Result<Json<ApiResponse<Vec<TournamentListing>>>, ApiError> {
    let records = ctx.engine.tournaments().await?;
    let listings = records.iter().map(TournamentListing::from).collect();
    Ok(Json(ApiResponse::ok(listings)))
}

async fn get_clock(
    State(ctx): State<Arc<ServerContext>>,
    Path(id): Path<TournamentId>,
) -> Result<Json<ApiResponse<DisplayPayload>>, ApiError> {
    let payload = ctx.engine.display(&id, ctx.clock.now()).await?;
    Ok(Json(ApiResponse::ok(payload)))
}

async fn post_clock_action(
    State(ctx): State<Arc<ServerContext>>,
    Path(id): Path<TournamentId>,
    headers: HeaderMap,
    body: Result<Json<ClockAction>, JsonRejection>,
) -> Result<Json<ApiResponse<DisplayPayload>>, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::AuthRequired)?;
    let staff = ctx
        .authorizer
        .authenticate(token)
        .ok_or(ApiError::InvalidToken)?;

    let tournament = ctx.engine.tournament(&id).await?;
    if !ctx.authorizer.may_operate(&staff, &tournament) {
        return Err(ApiError::Forbidden);
    }

    let Json(action) = body.map_err(|rejection| {
        ApiError::validation(format!("Invalid action: {}", rejection.body_text()))
    })?;
    debug!(target: LOG_TARGET, tournament = %id, staff = %staff.staff_id, %action, "clock action requested");

    let payload = ctx.engine.apply(&id, action, ctx.clock.now()).await?;
    Ok(Json(ApiResponse::with_message(
        payload,
        format!("Tournament {} successful", action.name()),
    )))
}

/// Reads the staff token from `Authorization`. The `Bearer ` scheme is
/// optional; a bare token is accepted as is.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_tokens() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}
