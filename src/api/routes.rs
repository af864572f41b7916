use actix_cors::Cors;
use actix_web::{web, HttpResponse};

use super::error::ApiError;
use super::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health checks
        .route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics_endpoint))

        // Carrier integration
        .service(
            web::scope("")
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allowed_methods(vec!["GET", "POST"])
                        .allowed_headers(vec!["Content-Type", "Authorization"])
                        .max_age(3600),
                )
                .route("/create-shipment", web::post().to(handlers::create_shipment))
                .route(
                    "/generate-and-upload-docs/{shipment_number}",
                    web::post().to(handlers::generate_and_upload_docs),
                ),
        );
}

/// JSON extractor settings: body limit from config, errors rendered like every other API error.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| ApiError::bad_request(err.to_string()).into())
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    }))
}

async fn metrics_endpoint() -> Result<HttpResponse, ApiError> {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to encode metrics: {}", e)))?;

    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer))
}
