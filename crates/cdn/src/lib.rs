pub mod backend;
pub mod error;
mod models;

pub use crate::backend::Cdn;
pub use crate::models::{Distribution, InvalidationBatch, caller_reference};
use std::sync::Arc;

pub type CdnHandle = Arc<dyn Cdn + Send + Sync>;
