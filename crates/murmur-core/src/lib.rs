pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::MurmurConfig;
pub use error::{MurmurError, Result};
pub use retry::{execute_with_retry, AttemptError, RetryPolicy, RetryResult};
pub use types::*;
