pub mod auth;
pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod schema;
pub mod services;
pub mod state;

pub use broker::MessageBroker;
pub use state::AppState;
