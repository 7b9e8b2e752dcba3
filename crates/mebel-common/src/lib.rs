pub mod errors;
pub mod id;
pub mod time;

pub use errors::{ConfigError, MebelError};
pub use id::{new_correlation_id, new_id, UserId};
pub use time::now_iso8601;
