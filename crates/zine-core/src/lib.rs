pub mod config;
pub mod error;
pub mod types;

pub use error::{GateError, GateResult};
pub use types::{ContentId, MetadataRecord};
