pub mod catalog;
pub mod collection;
pub mod config;
pub mod error;
pub mod io;
pub mod paths;
pub mod request;
pub mod selector;
pub mod static_table;
pub mod types;

pub use catalog::{Category, GenerationRequest, Rarity};
pub use error::{GachaError, Result};
pub use types::{Comparison, ContentRecord, Templates, Thresholds};
