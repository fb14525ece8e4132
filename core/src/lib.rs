//! Authenticated API client for the SchoolHub backend.
//!
//! # Overview
//! `SchoolClient` is the single choke point for backend calls: it attaches
//! the stored bearer token, sends JSON bodies, parses JSON replies, and maps
//! failures onto `ApiError`. On top of that it keeps the session (token and
//! user snapshot) in an injected `KeyValueStore` and exposes one method per
//! backend resource.
//!
//! # Design
//! - The network and the persistent store are both injected (`Transport`,
//!   `KeyValueStore`), so tests run against in-memory doubles.
//! - `request` is split into `build_request` / `parse_response` halves
//!   around the transport; both are deterministic and public.
//! - Replies are typed as `Envelope`; `Envelope::into_data` turns the
//!   backend's `success` flag into a `Result`.
//! - Image uploads go through `ImageSource`, chosen by the caller
//!   (`FileImage` for paths, `BlobImage` for URIs).

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod image;
mod resources;
pub mod roles;
pub mod session;
pub mod store;
pub mod types;

pub use client::{Query, RequestOptions, SchoolClient};
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use image::{BlobImage, FileImage, ImageSource};
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{Envelope, UserProfile};
