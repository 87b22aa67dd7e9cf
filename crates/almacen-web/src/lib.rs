//! Almacen web front end
//!
//! An axum service in front of the inventory backend: it decodes the session,
//! gates every admin page on the role's cached permissions, proxies CRUD with
//! validation, and serves the dashboard data.

#![forbid(unsafe_code)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{WebError, WebResult};
pub use server::{build_app, serve};
pub use state::AppState;
