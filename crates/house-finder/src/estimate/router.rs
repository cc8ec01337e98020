use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::{PriceEstimator, PriceFeatures};
use crate::http::json_error;

pub fn estimate_router(estimator: Arc<PriceEstimator>) -> Router {
    Router::new()
        .route("/api/v1/estimate", post(estimate_handler))
        .with_state(estimator)
}

pub(crate) async fn estimate_handler(
    State(estimator): State<Arc<PriceEstimator>>,
    Json(features): Json<PriceFeatures>,
) -> Response {
    match estimator.estimate(&features) {
        Ok(estimate) => (StatusCode::OK, Json(estimate)).into_response(),
        Err(err) => json_error(StatusCode::UNPROCESSABLE_ENTITY, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[tokio::test]
    async fn estimate_handler_rejects_invalid_quality() {
        let features = PriceFeatures {
            living_area: 1500,
            bedrooms: 3,
            year_built: 2000,
            garage_cars: 2,
            lot_area: 9000,
            overall_qual: 12,
        };
        let response =
            estimate_handler(State(Arc::new(PriceEstimator::default())), Json(features)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .expect("read body");
        let payload: Value = serde_json::from_slice(&body).expect("json payload");
        assert!(payload["error"]
            .as_str()
            .unwrap_or_default()
            .contains("overall quality"));
    }
}
