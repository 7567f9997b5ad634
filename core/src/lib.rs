//! Blocking API client core for the PlayPath.io items and RAG chat API.
//!
//! # Overview
//! Builds authenticated `HttpRequest` values, sends each one exactly once
//! through a pluggable [`Transport`], and decodes the `HttpResponse` into a
//! JSON payload or a typed [`Error`].
//!
//! # Design
//! - `PlaypathClient` holds an immutable `Configuration` and a transport;
//!   there is no global client and no shared mutable state.
//! - Request building and response decoding are plain functions over plain
//!   data, so the whole contract is testable without a network.
//! - Status codes map to errors through the static table in [`status`].
//! - Items stay opaque JSON; only request inputs are typed.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod rag;
pub mod status;
pub mod transport;
pub mod types;

pub use client::PlaypathClient;
pub use config::{Configuration, EndpointKind, DEFAULT_BASE_URL};
pub use error::{ApiError, ApiErrorKind, Error, ErrorBody, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use status::decode_response;
pub use transport::{Transport, UreqTransport};
pub use types::{ChatMessage, ChatRequest, CreateItem, Role, UpdateItem};
