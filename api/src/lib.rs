pub mod auth;
pub mod chat_history;
pub mod config;
pub mod cookie;
pub mod error;
pub mod query_payload;
pub mod routes;
pub mod session;
pub mod state;
pub mod utils;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
