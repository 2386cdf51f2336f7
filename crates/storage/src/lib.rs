pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::ObjectStore;
pub use crate::models::{PutOptions, RemoteObject, normalize_etag};
pub use crate::path::validate as validate_key;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ObjectStore + Send + Sync>;
