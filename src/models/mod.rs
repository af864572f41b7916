pub mod common;
pub mod document;
pub mod field;
pub mod shipment;

pub use document::*;
pub use field::*;
pub use shipment::*;
