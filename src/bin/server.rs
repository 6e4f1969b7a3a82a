//! Rolegrid REST authority
//!
//! Run with: cargo run --features server --bin rolegrid-server
//!
//! Endpoints:
//!   GET  /status          - Store status
//!   GET  /roles           - List roles
//!   GET  /roles/:id       - Fetch one role
//!   POST /roles           - Create role
//!   PUT  /roles/:id       - Update role
//!   POST /reset           - Reset database (dev only)

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use rolegrid::{
    clear_all, create_role, get_role, init, list_roles, update_role, validate_role, FieldError,
    MutationOutcome, PersistedRole, RoleError,
};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

#[derive(Serialize)]
struct ValidationRes {
    error: String,
    fields: Vec<FieldError>,
}

#[derive(Serialize)]
struct StatusRes {
    roles: usize,
    version: String,
}

fn status_for(e: &RoleError) -> StatusCode {
    match e {
        RoleError::NameTaken(_) => StatusCode::CONFLICT,
        RoleError::NotFound(_) => StatusCode::NOT_FOUND,
        RoleError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_status() -> Json<ApiResponse<StatusRes>> {
    let roles = list_roles().map(|r| r.len()).unwrap_or(0);
    Json(ApiResponse::ok(StatusRes { roles, version: env!("CARGO_PKG_VERSION").into() }))
}

async fn get_roles() -> (StatusCode, Json<ApiResponse<Vec<PersistedRole>>>) {
    match list_roles() {
        Ok(roles) => (StatusCode::OK, Json(ApiResponse::ok(roles))),
        Err(e) => (status_for(&e), Json(ApiResponse::err(e.to_string()))),
    }
}

async fn get_role_by_id(
    Path(id): Path<String>,
) -> (StatusCode, Json<ApiResponse<PersistedRole>>) {
    match get_role(&id) {
        Ok(Some(role)) => (StatusCode::OK, Json(ApiResponse::ok(role))),
        Ok(None) => {
            let e = RoleError::NotFound(id);
            (status_for(&e), Json(ApiResponse::err(e.to_string())))
        }
        Err(e) => (status_for(&e), Json(ApiResponse::err(e.to_string()))),
    }
}

async fn post_role(
    Json(body): Json<Value>,
) -> std::result::Result<Json<ApiResponse<MutationOutcome>>, (StatusCode, Json<ValidationRes>)> {
    let payload = validate_role(&body).map_err(validation_reply)?;
    match create_role(&payload) {
        Ok(outcome) => Ok(Json(ApiResponse::ok(outcome))),
        Err(e) => Err(mutation_reply(e)),
    }
}

async fn put_role(
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> std::result::Result<Json<ApiResponse<MutationOutcome>>, (StatusCode, Json<ValidationRes>)> {
    let payload = validate_role(&body).map_err(validation_reply)?;
    match update_role(&id, &payload) {
        Ok(outcome) => Ok(Json(ApiResponse::ok(outcome))),
        Err(e) => Err(mutation_reply(e)),
    }
}

fn validation_reply(fields: Vec<FieldError>) -> (StatusCode, Json<ValidationRes>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ValidationRes { error: "Validation failed".into(), fields }),
    )
}

fn mutation_reply(e: RoleError) -> (StatusCode, Json<ValidationRes>) {
    // A collision is attributable to the name field; other failures are not
    // field-scoped.
    let fields = match &e {
        RoleError::NameTaken(_) => {
            vec![FieldError { path: "name".into(), message: e.to_string() }]
        }
        _ => Vec::new(),
    };
    (status_for(&e), Json(ValidationRes { error: e.to_string(), fields }))
}

async fn post_reset() -> (StatusCode, Json<ApiResponse<String>>) {
    match clear_all() {
        Ok(_) => (StatusCode::OK, Json(ApiResponse::ok("reset".into()))),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string()))),
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize database
    let db_path = std::env::var("ROLEGRID_DB").unwrap_or_else(|_| "./data/rolegrid.mdb".into());
    println!("Initializing database at: {}", db_path);
    init(&db_path).expect("Failed to initialize database");

    // CORS for demo
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Router
    let app = Router::new()
        .route("/status", get(get_status))
        .route("/roles", get(get_roles).post(post_role))
        .route("/roles/:id", get(get_role_by_id).put(put_role))
        .route("/reset", post(post_reset))
        .layer(cors);

    // Bind
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let addr = format!("0.0.0.0:{}", port);
    println!("Rolegrid server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
