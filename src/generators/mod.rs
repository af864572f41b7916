pub mod pipeline;

pub use pipeline::DocumentPipeline;
