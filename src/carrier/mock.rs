use std::sync::Mutex;

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};

use super::payload::{PushDocument, UploadDocument};
use super::{CarrierClient, CarrierResult};
use crate::models::{ShipmentCreated, ShipmentRecord};

/// In-process carrier: fabricates shipment numbers and upload receipts and
/// remembers what it was sent.
#[derive(Default)]
pub struct MockCarrier {
    uploads: Mutex<Vec<String>>,
    pushes: Mutex<Vec<String>>,
}

impl MockCarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// File names uploaded so far, in order.
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Document ids associated with a shipment so far, in order.
    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

/// `1Z` followed by ten random digits.
pub fn fake_shipment_number() -> String {
    let mut rng = rand::thread_rng();
    let digits: String = (0..10).map(|_| char::from(b'0' + rng.gen_range(0..10u8))).collect();
    format!("1Z{}", digits)
}

#[async_trait]
impl CarrierClient for MockCarrier {
    async fn access_token(&self) -> CarrierResult<Option<String>> {
        Ok(Some("mock-token".to_string()))
    }

    async fn create_shipment(&self, record: &ShipmentRecord) -> CarrierResult<ShipmentCreated> {
        let shipment_number = fake_shipment_number();
        tracing::info!(%shipment_number, "mock shipment created");
        Ok(ShipmentCreated {
            shipment_number: Some(shipment_number),
            raw: json!({ "mock": true, "shipmentData": record }),
        })
    }

    async fn upload_document(&self, document: &UploadDocument) -> CarrierResult<Option<Value>> {
        let document_id = format!("MOCK-{}", uuid::Uuid::new_v4().simple());
        if let Ok(mut uploads) = self.uploads.lock() {
            uploads.push(document.file_name.clone());
        }
        Ok(Some(json!({
            "mock": true,
            "fileName": document.file_name,
            "documentType": document.document_type,
            "UploadResponse": { "FormsHistoryDocumentID": { "DocumentID": document_id } },
        })))
    }

    async fn push_document(&self, push: &PushDocument) -> CarrierResult<Option<Value>> {
        if let Ok(mut pushes) = self.pushes.lock() {
            pushes.push(push.document_id.clone());
        }
        Ok(Some(json!({
            "mock": true,
            "documentId": push.document_id,
            "shipmentIdentifier": push.shipment_identifier,
            "trackingNumber": push.tracking_number,
            "shipmentDateAndTime": push.shipment_date_time,
        })))
    }
}
