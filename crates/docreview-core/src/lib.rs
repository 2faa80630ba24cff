pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod gaps;
pub mod oracle;
pub mod pipeline;
pub mod report;
pub mod scan;
pub mod types;

pub use error::{ErrorKind, ReviewError};
pub use oracle::Oracle;
pub use pipeline::Pipeline;
pub use types::*;
