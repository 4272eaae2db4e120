//! Typed client for the guide management REST backend: session handling,
//! resource clients and the view models the command line front end drives.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod guides;
pub mod invitations;
pub mod session;
pub mod state;
pub mod transport;
pub mod users;
pub mod views;

pub use error::{ApiError, AuthError, FormError};
pub use state::AppState;
