use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{from_fn, from_fn_with_state, Next},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config;
use crate::database::manager;
use crate::database::models::Role;
use crate::events::outbox::OutboxDispatcher;
use crate::handlers::{auth, complaints, discussions, feedback, groups, messages, realtime, reports, users};
use crate::middleware::{auth::protect, rate_limit::rate_limit, restrict::restrict_to};
use crate::realtime::Hub;
use crate::state::AppState;

const CITIZEN: &[Role] = &[Role::Citizen];
const SECTOR: &[Role] = &[Role::SectorAdmin];
const SECTOR_OR_DISTRICT: &[Role] = &[Role::SectorAdmin, Role::DistrictAdmin];
const ADMINS: &[Role] = &[Role::SectorAdmin, Role::DistrictAdmin, Role::SuperAdmin];
const SUPER: &[Role] = &[Role::SuperAdmin];

/// Connect, migrate, start the outbox dispatcher and serve the API.
pub async fn serve() -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting CivicLink API in {:?} mode", config.environment);

    let pool = manager::connect().await?;
    manager::migrate(&pool).await?;

    let hub = Arc::new(Hub::new());
    let state = AppState::new(pool.clone(), hub.clone());

    OutboxDispatcher::new(pool, hub).spawn();

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("CIVICLINK_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("CivicLink API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/ws", get(realtime::ws));

    let mut router = Router::new()
        .merge(public)
        .merge(protected_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), rate_limit));

    if config::config().security.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(state)
}

fn protected_routes(state: AppState) -> Router<AppState> {
    let citizen_routes = Router::new()
        .route("/api/complaints", post(complaints::create))
        .route("/api/discussions", post(discussions::create))
        .route("/api/feedback", post(feedback::submit))
        .route_layer(from_fn(|req: Request, next: Next| restrict_to(CITIZEN, req, next)));

    let sector_routes = Router::new()
        .route("/api/complaints/sector", get(complaints::sector_queue))
        .route("/api/complaints/:id/escalate", put(complaints::escalate))
        .route_layer(from_fn(|req: Request, next: Next| restrict_to(SECTOR, req, next)));

    let sector_or_district_routes = Router::new()
        .route("/api/complaints/:id/resolve", put(complaints::resolve))
        .route("/api/discussions/:id/resolve", patch(discussions::resolve))
        .route("/api/groups", post(groups::create))
        .route_layer(from_fn(|req: Request, next: Next| restrict_to(SECTOR_OR_DISTRICT, req, next)));

    let admin_routes = Router::new()
        .route("/api/feedback/analytics", get(feedback::analytics))
        .route("/api/reports/complaints", get(reports::complaints))
        .route("/api/reports/feedback", get(reports::feedback))
        .route("/api/reports/engagement", get(reports::engagement))
        .route("/api/reports/performance", get(reports::performance))
        .route("/api/reports/:id/csv", get(reports::export_csv))
        .route("/api/users/:id/role", patch(users::change_role))
        .route_layer(from_fn(|req: Request, next: Next| restrict_to(ADMINS, req, next)));

    let super_admin_routes = Router::new()
        .route("/api/complaints/admin/dashboard", get(complaints::dashboard))
        .route_layer(from_fn(|req: Request, next: Next| restrict_to(SUPER, req, next)));

    let shared_routes = Router::new()
        .route("/api/users/me", get(users::me))
        .route("/api/complaints", get(complaints::list))
        .route("/api/complaints/:id", get(complaints::get))
        .route("/api/discussions", get(discussions::list))
        .route("/api/discussions/:id", get(discussions::get))
        .route("/api/discussions/:id/comments", post(discussions::add_comment))
        .route("/api/groups", get(groups::list))
        .route("/api/groups/:id", get(groups::get))
        .route("/api/groups/:id/join", post(groups::join))
        .route("/api/groups/:id/leave", post(groups::leave))
        .route(
            "/api/groups/:id/announcements",
            get(groups::announcements).post(groups::post_announcement),
        )
        .route("/api/messages", post(messages::send))
        .route("/api/messages/:id", get(messages::conversation))
        .route("/api/messages/:id/read", patch(messages::mark_read));

    Router::new()
        .merge(citizen_routes)
        .merge(sector_routes)
        .merge(sector_or_district_routes)
        .merge(admin_routes)
        .merge(super_admin_routes)
        .merge(shared_routes)
        .layer(from_fn_with_state(state, protect))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "CivicLink API",
            "version": version,
            "description": "Citizen complaint and engagement backend (Axum)",
            "endpoints": {
                "auth": "/api/auth/register, /api/auth/login (public)",
                "users": "/api/users/me, /api/users/:id/role (protected)",
                "complaints": "/api/complaints[/:id], /api/complaints/sector, /api/complaints/admin/dashboard (protected)",
                "discussions": "/api/discussions[/:id], /api/discussions/:id/comments (protected)",
                "groups": "/api/groups[/:id], join/leave/announcements (protected)",
                "feedback": "/api/feedback, /api/feedback/analytics (protected)",
                "reports": "/api/reports/{complaints,feedback,engagement,performance}, /api/reports/:id/csv (protected)",
                "messages": "/api/messages[/:id] (protected)",
                "realtime": "/ws?token=<jwt> (websocket)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match manager::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": { "status": "degraded", "timestamp": now, "database_error": e.to_string() }
            })),
        ),
    }
}
