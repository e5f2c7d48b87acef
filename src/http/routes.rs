//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::game::{MatchPhase, PlayerId};
use crate::util::time::uptime_secs;
use crate::ws::handler::{feed_ws_handler, render_ws_handler};
use crate::ws::protocol::RenderFrame;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.client_origin);

    Router::new()
        .route("/health", get(health_handler))
        .route("/state", get(state_handler))
        .route("/ws/feed", get(feed_ws_handler))
        .route("/ws/render", get(render_ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

/// CORS configuration - "*" or a comma-separated list of origins
fn cors_layer(client_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if client_origin.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let allowed_origins: Vec<HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    cors.allow_origin(allowed_origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    local_role: PlayerId,
    tick: u64,
    match_phase: MatchPhase,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let frame = state.session.latest_frame();

    Json(HealthResponse {
        status: if state.session.is_finished() { "finished" } else { "ok" },
        uptime_secs: uptime_secs(),
        local_role: state.config.local_role,
        tick: frame.tick,
        match_phase: frame.phase,
    })
}

// ============================================================================
// State endpoint
// ============================================================================

async fn state_handler(State(state): State<AppState>) -> Json<RenderFrame> {
    Json(state.session.latest_frame())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::game::{AmmoPolicy, Dispatcher, GameSession, Ledger, Loadout, RoleAssignment};

    fn state() -> AppState {
        let config = Config::from_lookup(|key| match key {
            "LOCAL_ROLE" => Some("2".to_string()),
            "CLIENT_ORIGIN" => Some("http://localhost:3000, http://192.168.1.20:3000".to_string()),
            _ => None,
        })
        .unwrap();
        let dispatcher = Dispatcher::new(
            RoleAssignment::new(config.local_role),
            Ledger::new(&Loadout::default(), AmmoPolicy::Wrap),
            config.predict_damage,
        );
        let (_session, handle) = GameSession::new(dispatcher);
        AppState::new(config, handle)
    }

    #[test]
    fn health_reports_waiting_session() {
        let state = state();
        let Json(health) = tokio_test::block_on(health_handler(State(state)));
        assert_eq!(health.local_role, PlayerId::Two);
        assert_eq!(health.tick, 0);
        assert_eq!(health.match_phase, MatchPhase::Waiting);
    }

    #[test]
    fn state_serves_latest_frame() {
        let Json(frame) = tokio_test::block_on(state_handler(State(state())));
        assert_eq!(frame.local_role, PlayerId::Two);
        assert_eq!(frame.players.len(), 2);
    }

    #[test]
    fn router_builds_with_origin_list() {
        let _router = build_router(state());
    }
}
