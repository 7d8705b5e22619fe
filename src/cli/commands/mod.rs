//! CLI command implementations.

mod ask;
mod bot;
mod config;
mod doctor;
mod reindex;
mod search;
mod serve;

pub use ask::run_ask;
pub use bot::run_bot;
pub use config::run_config;
pub use doctor::run_doctor;
pub use reindex::run_reindex;
pub use search::run_search;
pub use serve::run_serve;
