pub mod bus;
pub mod config;
pub mod retry;

pub use bus::{BusReply, BusRequest};
pub use retry::{RetryError, RetryPolicy, retry_fixed};
