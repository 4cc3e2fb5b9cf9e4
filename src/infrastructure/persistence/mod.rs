pub mod in_memory;
pub mod json_model_store;

pub use in_memory::InMemoryModelStore;
pub use json_model_store::{JsonModelStore, ModelArtifact};
