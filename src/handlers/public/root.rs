use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::ApiResponse;

/// GET / - service name, version and the route map
pub async fn root(State(state): State<AppState>) -> ApiResponse<Value> {
    let prefix = &state.config.api.prefix;

    ApiResponse::success(json!({
        "name": state.config.api.project_name,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "auth": format!("{}/auth/whoami (protected)", prefix),
            "pets": format!("{}/pets[/:id] (protected)", prefix),
            "photos": format!("{}/pets/upload_photo (protected)", prefix),
            "profile": format!("{}/profiles/me (protected)", prefix),
        }
    }))
}
