pub mod admission;
pub mod context;
pub mod error;

pub use admission::{admit, AdmissionReport};
pub use context::AppContext;
pub use error::{PagemetaError, Result};
