use axum::{middleware::from_fn, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use campus_api::handlers;
use campus_api::middleware::{
    super_admin_middleware, validate_college_middleware, validate_user_middleware,
};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("campus_api=debug,tower_http=info")),
        )
        .init();

    let config = campus_api::config::config();
    tracing::info!("Starting Campus API in {:?} mode", config.environment);

    // Apply the master schema and seed the super admin. A missing database is
    // not fatal at startup; /health reports it as degraded.
    if let Err(e) = campus_api::registry::CollegeRegistry::bootstrap().await {
        tracing::warn!("Registry bootstrap skipped: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("CAMPUS_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Campus API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server");

    // Drain cached pools so in-flight statements finish before exit
    campus_api::database::DatabaseManager::close_all().await;
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
}

fn app() -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Registry administration (super admin credentials, no college header)
        .merge(college_routes())
        // Per-college API (college header + tenant user credentials)
        .merge(tenant_routes())
        // Global middleware
        .layer(CorsLayer::permissive());

    if campus_api::config::config().api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn college_routes() -> Router {
    use axum::routing::delete;

    Router::new()
        .route(
            "/api/colleges",
            get(handlers::colleges::list).post(handlers::colleges::create),
        )
        .route("/api/colleges/:code", delete(handlers::colleges::delete))
        .layer(from_fn(super_admin_middleware))
}

fn tenant_routes() -> Router {
    use axum::routing::{post, put};

    Router::new()
        .route("/api/auth/whoami", get(handlers::users::whoami))
        .route(
            "/api/users",
            get(handlers::users::list).post(handlers::users::create),
        )
        .route(
            "/api/students",
            get(handlers::students::list).post(handlers::students::create),
        )
        .route(
            "/api/students/:id",
            get(handlers::students::get)
                .put(handlers::students::update)
                .delete(handlers::students::delete),
        )
        .route("/api/students/:id/lending", get(handlers::lending::student_history))
        .route("/api/students/:id/scores", get(handlers::scores::list_for_student))
        .route("/api/students/:id/grade-report", get(handlers::scores::grade_report))
        .route(
            "/api/departments",
            get(handlers::departments::list).post(handlers::departments::create),
        )
        .route(
            "/api/departments/:id",
            get(handlers::departments::get)
                .put(handlers::departments::update)
                .delete(handlers::departments::delete),
        )
        .route(
            "/api/books",
            get(handlers::books::list).post(handlers::books::create),
        )
        .route(
            "/api/books/:id",
            get(handlers::books::get)
                .put(handlers::books::update)
                .delete(handlers::books::delete),
        )
        .route(
            "/api/lending",
            get(handlers::lending::list).post(handlers::lending::issue),
        )
        .route("/api/lending/delayed", get(handlers::lending::delayed))
        .route("/api/lending/:id/return", put(handlers::lending::return_book))
        .route("/api/scores", post(handlers::scores::create))
        .route("/api/analytics/summary", get(handlers::analytics::summary))
        // Layer order matters: college resolution runs first and injects the
        // tenant pool that the user middleware queries.
        .layer(from_fn(validate_user_middleware))
        .layer(from_fn(validate_college_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Campus API",
            "version": version,
            "description": "Multi-tenant student management backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "colleges": "/api/colleges[/:code] (super admin)",
                "students": "/api/students[/:id] (per-college)",
                "departments": "/api/departments[/:id] (per-college)",
                "books": "/api/books[/:id] (per-college)",
                "lending": "/api/lending[/:id/return, /delayed] (per-college)",
                "scores": "/api/scores, /api/students/:id/grade-report (per-college)",
                "analytics": "/api/analytics/summary (per-college)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match campus_api::database::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
