pub mod config;
pub mod query;
pub mod repeat;
pub mod task;

pub use config::*;
pub use query::*;
pub use repeat::*;
pub use task::*;
