mod pipeline;
mod store;

pub use pipeline::build_pipeline_config;
pub use store::{build_store_options, dataset_path, store_path};
