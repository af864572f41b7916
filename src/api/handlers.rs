use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::error::ApiResult;
use super::state::ApiState;
use crate::models::ShipmentRecord;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    #[serde(default)]
    pub shipment_data: ShipmentRecord,
}

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("UPS Service is running")
}

/// Create a carrier shipment
pub async fn create_shipment(
    body: web::Json<CreateShipmentRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let created = state
        .carrier
        .create_shipment(&body.shipment_data)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create shipment: {}", e);
            e
        })?;

    Ok(HttpResponse::Ok().json(created))
}

/// Generate the customs documents for a shipment and upload them
pub async fn generate_and_upload_docs(
    path: web::Path<String>,
    body: web::Json<ShipmentRecord>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    let shipment_number = path.into_inner();
    let started = std::time::Instant::now();

    let response = state
        .pipeline
        .generate_and_upload(&shipment_number, body.into_inner())
        .await
        .map_err(|e| {
            tracing::error!("Doc generation/upload failed for {}: {}", shipment_number, e);
            e
        })?;

    tracing::info!(
        "Generated {} document(s) for {} in {}ms",
        response.upload_results.len(),
        shipment_number,
        started.elapsed().as_millis()
    );
    Ok(HttpResponse::Ok().json(response))
}
