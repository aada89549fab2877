//! Aggregate endpoint

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

/// Cache key for the single current aggregate.
const CACHE_KEY: &str = "aggregator::current";

/// GET /Aggregator
///
/// Returns the aggregated view of the upstream forecast collection:
/// 200 with the aggregate when samples exist, 204 when the upstream
/// collection contains no usable samples.
#[instrument(skip_all)]
pub async fn get_aggregate(State(state): State<AppState>) -> Result<Response, ApiError> {
    let result = if state.cache_config.enabled {
        let aggregation = Arc::clone(&state.aggregation);
        state
            .cache
            .get_or_compute(CACHE_KEY, async move {
                // The computation is shared between callers, so it gets its
                // own token rather than one tied to a single request.
                aggregation.aggregate_current(&CancellationToken::new()).await
            })
            .await
    } else {
        state
            .aggregation
            .aggregate_current(&CancellationToken::new())
            .await
    };

    match result? {
        Some(info) => {
            let cache_control = format!("max-age={}", state.cache_config.ttl_secs);
            Ok(([(header::CACHE_CONTROL, cache_control)], Json(info)).into_response())
        },
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
