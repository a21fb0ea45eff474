use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::routing::QuoteRequest;

use super::dto::{ErrorResponse, GraphStatsDto, HealthResponse, QuoteApiResponse, QuoteQuery};
use super::state::AppState;

/// `GET /health`.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = state.graph.stats();

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        graph_stats: GraphStatsDto {
            token_count: stats.token_count,
            pool_count: stats.pool_count,
            last_update: stats.last_update,
        },
    };

    Json(response)
}

/// `GET /v1/quote`.
#[tracing::instrument(skip(state, params), fields(request_id = tracing::field::Empty))]
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuoteQuery>,
) -> Result<Response, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    tracing::Span::current().record("request_id", tracing::field::display(request_id));

    let amount_human = params
        .amount_in
        .parse::<f64>()
        .map_err(|_| ApiError::BadRequest("invalid amount_in".to_string()))?;

    let token_in = params.token_in;
    let token_out = params.token_out;

    let source_token = state
        .graph
        .token_id(token_in)
        .and_then(|id| state.graph.token(id))
        .ok_or_else(|| ApiError::BadRequest(format!("unknown token {token_in}")))?;
    let amount_raw = source_token.to_raw(amount_human);

    let config = params.into_routing_config();

    if let Some(cached) = state.cache.get(
        token_in,
        token_out,
        amount_raw,
        config.max_hops,
        config.top_k,
        config.enable_splitting,
    ) {
        return Ok(Json(QuoteApiResponse {
            request_id,
            quote: cached,
            timestamp: chrono::Utc::now().timestamp() as u64,
            cached: true,
        })
        .into_response());
    }

    let request = QuoteRequest {
        source_addr: token_in,
        target_addr: token_out,
        swap_amount_human: amount_human,
        config: config.clone(),
    };

    let quote = state.quoter.quote(&request).map_err(ApiError::from)?;

    state.cache.insert(
        token_in,
        token_out,
        amount_raw,
        config.max_hops,
        config.top_k,
        config.enable_splitting,
        quote.clone(),
    );

    let status = if quote.diagnostics.no_route_found {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(QuoteApiResponse {
            request_id,
            quote,
            timestamp: chrono::Utc::now().timestamp() as u64,
            cached: false,
        }),
    )
        .into_response())
}

/// API error type; only `InputInvalid` ever reaches here from the quoter,
/// everything else is folded into the response's `diagnostics`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InternalError(String),
}

impl From<crate::utils::RouterError> for ApiError {
    fn from(err: crate::utils::RouterError) -> Self {
        match err {
            crate::utils::RouterError::InputInvalid(_) => ApiError::BadRequest(err.to_string()),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let error_response = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message,
        };

        (status, Json(error_response)).into_response()
    }
}
