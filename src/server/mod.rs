use crate::error::{Error, Result};
use crate::model::ModelSet;
use crate::predict::{self, Outcome};
use crate::schema::{Disease, Field};
use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
	models: Arc<ModelSet>,
}

impl AppState {
	pub fn new(models: ModelSet) -> Self {
		Self {
			models: Arc::new(models),
		}
	}
}

#[derive(Serialize)]
pub struct HealthResponse {
	pub status: String,
	pub models: Vec<Disease>,
}

#[derive(Serialize)]
pub struct SchemaResponse {
	pub disease: Disease,
	pub title: &'static str,
	pub fields: &'static [Field],
}

/// Either a full ordered vector or named form inputs (missing fields are 0).
#[derive(Deserialize)]
pub struct PredictRequest {
	#[serde(default)]
	pub features: Option<Vec<f64>>,
	#[serde(default)]
	pub inputs: Option<BTreeMap<String, f64>>,
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let (status, message) = match self {
			Error::ModelNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
			Error::InvalidInput(_) | Error::SchemaMismatch { .. } => {
				(StatusCode::BAD_REQUEST, self.to_string())
			}
			Error::ModelLoadFailed(_) | Error::PredictionError(_) => {
				(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
			}
			_ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string()),
		};

		let body = Json(serde_json::json!({
			"error": message,
		}));

		(status, body).into_response()
	}
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "ok".to_string(),
		models: state.models.diseases(),
	})
}

async fn schema_handler(Path(disease): Path<String>) -> Result<Json<SchemaResponse>> {
	let disease: Disease = disease.parse()?;

	Ok(Json(SchemaResponse {
		disease,
		title: disease.title(),
		fields: disease.fields(),
	}))
}

async fn predict_handler(
	State(state): State<AppState>,
	Path(disease): Path<String>,
	payload: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Outcome>> {
	let disease: Disease = disease.parse()?;
	let Json(payload) = payload.map_err(|rejection| Error::InvalidInput(rejection.body_text()))?;

	let features = match (payload.features, payload.inputs) {
		(Some(values), None) => disease.assemble(&values)?,
		(None, Some(inputs)) => {
			disease.assemble_inputs(inputs.iter().map(|(name, value)| (name.as_str(), *value)))?
		}
		_ => {
			return Err(Error::InvalidInput(
				"Provide exactly one of 'features' or 'inputs'".to_string(),
			))
		}
	};

	let outcome = predict::diagnose(&state.models, &features)?;
	tracing::info!(model = %disease, label = u8::from(outcome.label), "{}", outcome.message);

	Ok(Json(outcome))
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/api/health", get(health_handler))
		.route("/api/schemas/{disease}", get(schema_handler))
		.route("/api/predict/{disease}", post(predict_handler))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}

pub async fn serve(host: &str, port: u16, state: AppState) -> Result<()> {
	let app = create_router(state);
	let addr = format!("{}:{}", host, port);

	tracing::info!("Starting server on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.map_err(|e| Error::ConfigError(format!("Failed to bind to {}: {}", addr, e)))?;

	axum::serve(listener, app)
		.await
		.map_err(|e| Error::ConfigError(format!("Server error: {}", e)))?;

	Ok(())
}
