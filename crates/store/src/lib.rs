pub mod backend;
pub mod error;
mod info;
mod path;

pub use crate::backend::FragmentStore;
pub use crate::info::FragmentInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn FragmentStore + Send + Sync>;
