pub mod analysis;
pub mod config;
pub mod error;
pub mod grading;
pub mod loan;
pub mod model;
pub mod statistics;
pub mod types;

#[cfg(feature = "willingness")]
pub mod willingness;

pub use error::CreditPdError;
pub use types::*;

/// Standard result type for all credit-pd operations
pub type CreditPdResult<T> = Result<T, CreditPdError>;
