//! HTTP boundary for LinkSnip.
//!
//! [`App::router`] wires the JSON API and the redirect route onto an
//! [`AppState`] holding the shortener and redirector services.

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::{AppError, Result};
pub use state::AppState;
