//! Result, request and error types shared by every operation.

mod cancellation;
mod error;
mod stamp;

pub use cancellation::*;
pub use error::*;
pub use stamp::*;
