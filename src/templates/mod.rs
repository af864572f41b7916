pub mod layout;
pub mod mapper;

pub use layout::{layout, validate_blanks, FormLayout};
pub use mapper::{group_items, map_fields, MappingContext};
