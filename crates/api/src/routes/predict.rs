//! Prediction Route

use axum::{body::Bytes, extract::State, Json};
use inference_engine::ModelProvider;
use metrics::counter;
use request_validator::FeatureSet;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{ApiError, AppState};

/// Model targets are in units of $100,000
pub const PRICE_SCALE: f64 = 100_000.0;

/// Response for the predict endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub predicted_price: f64,
}

/// Validate the body, run the model, and return the scaled price
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictionResponse>, ApiError> {
    let result = handle(&state, &body);
    let outcome = match &result {
        Ok(_) => "ok",
        Err(ApiError::PredictionFailed) | Err(ApiError::Internal) => "failed",
        Err(_) => "rejected",
    };
    counter!("predict_requests_total", "outcome" => outcome).increment(1);

    result.map(Json)
}

fn handle(state: &AppState, body: &[u8]) -> Result<PredictionResponse, ApiError> {
    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        warn!("Rejected malformed request body: {}", e);
        ApiError::MalformedBody(e.to_string())
    })?;

    let features = state.validator.validate(&payload)?;
    info!("Received request: {:?}", features);

    let predicted_price = predict_price(state.model.as_ref(), &features)?;
    Ok(PredictionResponse { predicted_price })
}

/// Run one feature set through the model and scale the result to dollars.
///
/// Model errors are logged here and replaced by a generic failure.
pub fn predict_price(model: &dyn ModelProvider, features: &FeatureSet) -> Result<f64, ApiError> {
    let row = features.to_row();
    info!("Features array: {:?}", row);

    let raw = model.predict(&row).map_err(|e| {
        error!("Error during prediction: {}", e);
        ApiError::PredictionFailed
    })?;
    info!("Prediction: {}.", raw);

    Ok(raw * PRICE_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use inference_engine::InferenceError;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use request_validator::FEATURE_COUNT;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Returns a fixed value and remembers the last row it saw
    struct FixedModel {
        output: f64,
        last_row: Mutex<Option<[f64; FEATURE_COUNT]>>,
    }

    impl FixedModel {
        fn new(output: f64) -> Arc<Self> {
            Arc::new(Self {
                output,
                last_row: Mutex::new(None),
            })
        }

        fn last_row(&self) -> Option<[f64; FEATURE_COUNT]> {
            *self.last_row.lock().unwrap()
        }
    }

    impl ModelProvider for FixedModel {
        fn predict(&self, row: &[f64; FEATURE_COUNT]) -> Result<f64, InferenceError> {
            *self.last_row.lock().unwrap() = Some(*row);
            Ok(self.output)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingModel;

    impl ModelProvider for FailingModel {
        fn predict(&self, _row: &[f64; FEATURE_COUNT]) -> Result<f64, InferenceError> {
            Err(InferenceError::InferenceFailed("tensor shape [1, 7] mismatch".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Linear in the inputs, so distinct rows give distinct prices
    struct SumModel;

    impl ModelProvider for SumModel {
        fn predict(&self, row: &[f64; FEATURE_COUNT]) -> Result<f64, InferenceError> {
            Ok(row.iter().sum::<f64>() / 1000.0)
        }

        fn name(&self) -> &str {
            "sum"
        }
    }

    fn app(model: Arc<dyn ModelProvider>) -> Router {
        create_router(Arc::new(AppState::new(model)))
    }

    async fn post(app: Router, body: &str) -> (StatusCode, Value) {
        let request = Request::post("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_scales_model_output() {
        let (status, body) = post(app(FixedModel::new(2.5)), r#"{"MedInc": 8.3}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["predicted_price"].as_f64(), Some(250000.0));
    }

    #[tokio::test]
    async fn test_model_sees_defaulted_row() {
        let model = FixedModel::new(1.0);
        let (status, _) = post(app(model.clone()), r#"{"MedInc": 8.0}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            model.last_row(),
            Some([8.0, 29.0, 5.229, 1.1, 1166.0, 2.8181, 34.26, -118.49])
        );
    }

    #[tokio::test]
    async fn test_identical_bodies_give_identical_prices() {
        let router = app(Arc::new(SumModel));
        let body = r#"{"MedInc": 4.2, "HouseAge": 15, "Latitude": 37.88}"#;

        let (_, first) = post(router.clone(), body).await;
        let (_, second) = post(router, body).await;
        assert!(first["predicted_price"].is_f64());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unknown_key_names_key() {
        let (status, body) =
            post(app(FixedModel::new(1.0)), r#"{"MedInc": 3.0, "Bedrooms": 2}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Invalid fields provided: {Bedrooms}."));
        assert!(detail.contains("MedInc"));
    }

    #[tokio::test]
    async fn test_non_object_rejected() {
        for payload in ["[1, 2, 3]", "42", "\"MedInc\""] {
            let (status, body) = post(app(FixedModel::new(1.0)), payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["detail"], "The input data must be a valid dictionary.");
        }
    }

    #[tokio::test]
    async fn test_zero_and_null_only_rejected() {
        for payload in [r#"{"MedInc": 0}"#, r#"{}"#, r#"{"HouseAge": null, "AveRooms": 0.0}"#] {
            let (status, body) = post(app(FixedModel::new(1.0)), payload).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["detail"], "At least one feature must be provided.");
        }
    }

    #[tokio::test]
    async fn test_model_not_called_on_rejection() {
        let model = FixedModel::new(1.0);
        let _ = post(app(model.clone()), r#"{"Zip": 90210}"#).await;
        assert_eq!(model.last_row(), None);
    }

    #[tokio::test]
    async fn test_non_numeric_value_is_unprocessable() {
        let (status, body) =
            post(app(FixedModel::new(1.0)), r#"{"MedInc": "high"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("MedInc"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_unprocessable() {
        let (status, _) = post(app(FixedModel::new(1.0)), r#"{"MedInc": "#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_inference_failure_hides_detail() {
        let (status, body) = post(app(Arc::new(FailingModel)), r#"{"MedInc": 8.0}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Prediction failed.");
        assert!(!body.to_string().contains("mismatch"));
    }

    #[test]
    fn test_outcomes_counted_in_metrics() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let working = create_router(Arc::new(
            AppState::new(FixedModel::new(1.0)).with_metrics(handle.clone()),
        ));
        let broken = create_router(Arc::new(
            AppState::new(Arc::new(FailingModel)).with_metrics(handle.clone()),
        ));

        // Current-thread runtime keeps every request on this thread, where
        // the local recorder is active.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let exposition = metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let (status, _) = post(working.clone(), r#"{"MedInc": 8.0}"#).await;
                assert_eq!(status, StatusCode::OK);
                let (status, _) = post(working.clone(), r#"{"Zip": 90210}"#).await;
                assert_eq!(status, StatusCode::BAD_REQUEST);
                let (status, _) = post(broken, r#"{"MedInc": 8.0}"#).await;
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

                let response = working
                    .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK);
                let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                    .await
                    .unwrap();
                String::from_utf8(bytes.to_vec()).unwrap()
            })
        });

        for outcome in ["ok", "rejected", "failed"] {
            let series = format!("predict_requests_total{{outcome=\"{}\"}} 1", outcome);
            assert!(exposition.contains(&series), "missing {series} in:\n{exposition}");
        }
    }

    #[test]
    fn test_predict_price_direct() {
        let features = FeatureSet::default();
        let price = predict_price(&SumModel, &features).unwrap();
        let expected = features.to_row().iter().sum::<f64>() / 1000.0 * PRICE_SCALE;
        assert_eq!(price, expected);
    }
}
