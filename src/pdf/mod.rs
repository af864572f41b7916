pub mod composer;
pub mod metrics;
pub mod pages;
pub mod renderer;
pub mod stamper;

pub use composer::{append, copy, insert_after, page_count};
pub use renderer::{ChromeRenderer, TableOptions, TableRenderer};
pub use stamper::stamp;
