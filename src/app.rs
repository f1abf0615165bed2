//! Router assembly and the state shared by every handler.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::auth::CredentialVerifier;
use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::store::DataStore;

/// Built once at startup and cloned into each request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub verifier: Arc<CredentialVerifier>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DataStore>) -> Self {
        let verifier = CredentialVerifier::new(&config.supabase.jwt_secret);

        Self {
            store,
            verifier: Arc::new(verifier),
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let prefix = state.config.api.prefix.clone();
    let protected = protected_routes(state.clone());

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health));

    let router = if prefix.is_empty() {
        router.merge(protected)
    } else {
        router.nest(&prefix, protected)
    };

    let router = router
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security.cors_origins));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

/// Routes that require a verified credential
fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{pets, profiles};

    Router::new()
        .route("/auth/whoami", get(protected::whoami))
        .route("/pets", get(pets::list_pets).post(pets::create_pet))
        .route("/pets/upload_photo", post(pets::upload_photo))
        .route(
            "/pets/:id",
            get(pets::get_pet).put(pets::update_pet).delete(pets::delete_pet),
        )
        .route(
            "/profiles/me",
            get(profiles::get_my_profile).put(profiles::update_my_profile),
        )
        // route_layer so unmatched paths still 404 instead of 401
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
