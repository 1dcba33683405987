use actix_web::HttpResponse;
use serde::Serialize;

#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().finish()
}

/// GET /
pub async fn greet() -> HttpResponse {
    HttpResponse::Ok().json(ServiceStatus {
        status: "online",
        message: "LifeGivers API is running",
        version: env!("CARGO_PKG_VERSION"),
    })
}
