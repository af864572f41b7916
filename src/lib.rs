pub mod api;
pub mod carrier;
pub mod core;
pub mod generators;
pub mod metrics;
pub mod models;
pub mod pdf;
pub mod templates;

// Re-export commonly used types
pub use carrier::{CarrierClient, CarrierError, MockCarrier, UpsClient};
pub use crate::core::{AppConfig, DocumentError, DocumentResult};
pub use generators::DocumentPipeline;
pub use models::{
    DocumentArtifact, FormKind, FormResult, GenerationResponse, LineItem, ShipmentCreated, ShipmentRecord, TextField,
};
pub use pdf::{ChromeRenderer, TableOptions, TableRenderer};
