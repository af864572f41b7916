//! The carrier collaborator: shipment creation, document upload and
//! association of uploaded documents with a shipment.

pub mod error;
pub mod mock;
pub mod payload;
pub mod ups;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{CarrierConfig, CarrierMode};
use crate::models::{ShipmentCreated, ShipmentRecord};

pub use error::{CarrierError, CarrierResult};
pub use mock::MockCarrier;
pub use payload::{PushDocument, UploadDocument};
pub use ups::UpsClient;

#[async_trait]
pub trait CarrierClient: Send + Sync {
    /// `None` when the client has no credentials to authenticate with.
    async fn access_token(&self) -> CarrierResult<Option<String>>;

    async fn create_shipment(&self, record: &ShipmentRecord) -> CarrierResult<ShipmentCreated>;

    /// Carrier response, or `None` when unauthenticated.
    async fn upload_document(&self, document: &UploadDocument) -> CarrierResult<Option<Value>>;

    /// Carrier response, or `None` when unauthenticated.
    async fn push_document(&self, push: &PushDocument) -> CarrierResult<Option<Value>>;
}

/// Builds the client selected by `CARRIER_MODE`.
pub fn from_config(config: &CarrierConfig) -> CarrierResult<Arc<dyn CarrierClient>> {
    match config.mode {
        CarrierMode::Live => {
            if !config.has_credentials() {
                tracing::warn!("carrier credentials missing, uploads will be skipped");
            }
            Ok(Arc::new(UpsClient::new(config.clone())?))
        }
        CarrierMode::Mock => {
            tracing::info!("using mock carrier");
            Ok(Arc::new(MockCarrier::new()))
        }
    }
}
