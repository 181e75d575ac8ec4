pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod io;
pub mod record;
pub mod schema;
pub mod store;
pub mod validate;

pub use error::{Result, SpokeError};
