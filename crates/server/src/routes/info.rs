// crates/server/src/routes/info.rs
//! Static service metadata endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use stems_separator::{DEFAULT_STEMS, SUPPORTED_FORMATS};

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub model: String,
    pub device: String,
    pub supported_stems: Vec<String>,
    pub supported_formats: Vec<String>,
}

/// GET /info - Service name, version, model identifier, device, and the
/// supported stem/format sets.
pub async fn service_info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    // Stem set comes from the loaded backend; fall back to the standard
    // four-source set when no model is loaded.
    let supported_stems = match &state.separator {
        Some(separator) => separator.stems().to_vec(),
        None => DEFAULT_STEMS.iter().map(|s| s.to_string()).collect(),
    };

    Json(InfoResponse {
        name: "stems".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Audio stem separation service".to_string(),
        model: state.config.model.clone(),
        device: state.config.device.to_string(),
        supported_stems,
        supported_formats: SUPPORTED_FORMATS.iter().map(|s| s.to_string()).collect(),
    })
}

/// Create the info routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/info", get(service_info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_response_serialization() {
        let response = InfoResponse {
            name: "stems".to_string(),
            version: "0.1.0".to_string(),
            description: "Audio stem separation service".to_string(),
            model: "passthrough".to_string(),
            device: "cpu".to_string(),
            supported_stems: vec!["vocals".to_string(), "drums".to_string()],
            supported_formats: vec!["wav".to_string()],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"name\":\"stems\""));
        assert!(json.contains("\"supported_stems\":[\"vocals\",\"drums\"]"));
    }
}
