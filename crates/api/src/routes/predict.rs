//! Prediction Route

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use scoring::{RawValue, RiskStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Body of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// Eight vitals; a missing key is an empty list
    #[serde(default)]
    pub vitals: Vec<Value>,
}

/// Successful prediction
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub risk_score: u8,
    pub status: RiskStatus,
}

fn raw_value(value: Value) -> RawValue {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(v) => RawValue::Number(v),
            None => RawValue::Text(n.to_string()),
        },
        Value::String(s) => RawValue::Text(s),
        other => RawValue::Text(other.to_string()),
    }
}

/// Score one set of vitals
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> ApiResult<Json<PredictResponse>> {
    let result = body
        .map_err(ApiError::from)
        .and_then(|Json(request)| {
            debug!("Prediction request with {} values", request.vitals.len());
            let raw: Vec<RawValue> = request.vitals.into_iter().map(raw_value).collect();
            state.pipeline.score(&raw).map_err(ApiError::from)
        });

    match result {
        Ok(assessment) => {
            metrics::counter!("predictions_total", "status" => assessment.status.as_str())
                .increment(1);
            info!(
                "Prediction: score={} status={}",
                assessment.risk_score,
                assessment.status.as_str()
            );
            Ok(Json(PredictResponse {
                risk_score: assessment.risk_score,
                status: assessment.status,
            }))
        }
        Err(e) => {
            metrics::counter!("prediction_errors_total", "class" => e.class().as_str())
                .increment(1);
            info!("Prediction rejected: {}", e);
            Err(e)
        }
    }
}
