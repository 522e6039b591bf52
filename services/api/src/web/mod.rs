pub mod dto;
pub mod homework;
pub mod lessons;
pub mod middleware;
pub mod obligations;
pub mod rest;
pub mod state;

// Re-export what the binaries need to build the web server.
pub use rest::{router, ApiDoc};
pub use state::AppState;
