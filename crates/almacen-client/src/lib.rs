//! Backend access for the almacen admin front end
//!
//! This crate provides:
//! - [`ApiClient`], the HTTP client over the backend's REST collections
//! - [`ResourceClient`], typed CRUD over one collection
//! - [`PermissionProvider`], the cached fail-closed permission resolver
//! - [`SubmitGuard`], which rejects duplicate in-flight creates

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod client;
pub mod permissions;
pub mod resource;
pub mod submit;

pub use client::{ApiClient, Credentials};
pub use permissions::{Capability, PermissionProvider, PermissionSource, Permisos};
pub use resource::ResourceClient;
pub use submit::{SubmitGuard, SubmitTicket};
