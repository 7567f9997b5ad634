//! Typed client for the PlayPath items and RAG chat API.
//!
//! # Design
//! `PlaypathClient` holds only an immutable `Configuration` and a transport.
//! Every operation is split in two: a `build_*` method that produces an
//! authenticated `HttpRequest` without touching the network, and
//! [`PlaypathClient::execute`], which sends it exactly once and decodes the
//! response. Hosts that bring their own HTTP stack can use the `build_*`
//! methods with [`decode_response`] and skip the transport entirely.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::{Configuration, EndpointKind};
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest};
use crate::status::decode_response;
use crate::transport::{Transport, UreqTransport};
use crate::types::{ChatRequest, CreateItem, UpdateItem};

pub const API_KEY_HEADER: &str = "X-Api-Key";

const ITEMS_PATH: &str = "/api/items";
const CHAT_PATH: &str = "/api/rag/chat";

/// Blocking client for the PlayPath API.
///
/// Construct one at startup and share it by reference; it carries no
/// mutable state between calls.
#[derive(Debug, Clone)]
pub struct PlaypathClient<T = UreqTransport> {
    config: Configuration,
    transport: T,
}

impl PlaypathClient<UreqTransport> {
    pub fn new(config: Configuration) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> PlaypathClient<T> {
    pub fn with_transport(config: Configuration, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -- items ---------------------------------------------------------------

    /// All items, as a JSON array.
    pub fn list_items(&self) -> Result<Value> {
        self.execute(self.build_list_items()?)
    }

    pub fn get_item(&self, id: &str) -> Result<Value> {
        self.execute(self.build_get_item(id)?)
    }

    pub fn create_item(&self, input: &CreateItem) -> Result<Value> {
        self.execute(self.build_create_item(input)?)
    }

    pub fn update_item(&self, id: &str, input: &UpdateItem) -> Result<Value> {
        self.execute(self.build_update_item(id, input)?)
    }

    /// `Value::Null` on 204, otherwise whatever body the API returned.
    pub fn delete_item(&self, id: &str) -> Result<Value> {
        self.execute(self.build_delete_item(id)?)
    }

    // -- chat ----------------------------------------------------------------

    /// Ask the RAG assistant. The response object holds `reply` and, when the
    /// account is metered, `usage` and `limit`.
    pub fn chat(&self, input: &ChatRequest) -> Result<Value> {
        self.execute(self.build_chat(input)?)
    }

    // -- raw -----------------------------------------------------------------

    /// Send an arbitrary call. `method` is checked before anything else, so
    /// an unsupported method fails without touching the network.
    pub fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<&Value>,
        kind: EndpointKind,
    ) -> Result<Value> {
        let method: HttpMethod = method.parse()?;
        self.execute(self.build_request(method, path, body, kind)?)
    }

    /// Send a prepared request once and decode the response.
    pub fn execute(&self, request: HttpRequest) -> Result<Value> {
        debug!(
            method = %request.method,
            url = %request.url,
            tls = request.is_tls(),
            "sending request"
        );
        let response = self.transport.send(&request)?;
        debug!(status = response.status, url = %request.url, "received response");

        let status = response.status;
        decode_response(response).inspect_err(|e| {
            warn!(
                status,
                method = %request.method,
                url = %request.url,
                error = %e,
                "request failed"
            );
        })
    }

    // -- request builders ----------------------------------------------------

    pub fn build_list_items(&self) -> Result<HttpRequest> {
        self.build_request(HttpMethod::Get, ITEMS_PATH, None, EndpointKind::Items)
    }

    pub fn build_get_item(&self, id: &str) -> Result<HttpRequest> {
        let url = self.item_url(id)?;
        self.authorize(HttpMethod::Get, url, None, EndpointKind::Items)
    }

    pub fn build_create_item(&self, input: &CreateItem) -> Result<HttpRequest> {
        let body = to_body(input)?;
        self.build_request(HttpMethod::Post, ITEMS_PATH, Some(&body), EndpointKind::Items)
    }

    pub fn build_update_item(&self, id: &str, input: &UpdateItem) -> Result<HttpRequest> {
        let url = self.item_url(id)?;
        let body = to_body(input)?;
        self.authorize(HttpMethod::Patch, url, Some(&body), EndpointKind::Items)
    }

    pub fn build_delete_item(&self, id: &str) -> Result<HttpRequest> {
        let url = self.item_url(id)?;
        self.authorize(HttpMethod::Delete, url, None, EndpointKind::Items)
    }

    pub fn build_chat(&self, input: &ChatRequest) -> Result<HttpRequest> {
        let body = to_body(input)?;
        self.build_request(HttpMethod::Post, CHAT_PATH, Some(&body), EndpointKind::Rag)
    }

    /// Resolve `path` against the base URL, pick the key for `kind` and
    /// serialize `body`.
    ///
    /// Fails with `Error::InvalidUrl` when `path` resolves to another origin
    /// and with `Error::Authentication` when no usable key is configured.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        kind: EndpointKind,
    ) -> Result<HttpRequest> {
        let url = self.resolve(path)?;
        self.authorize(method, url, body, kind)
    }

    fn resolve(&self, path: &str) -> Result<Url> {
        let base = self.config.base_url();
        let url = base
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path:?} against {base}: {e}")))?;

        // The key is only ever sent to the configured host.
        if url.origin() != base.origin() {
            return Err(Error::InvalidUrl(format!(
                "{path:?} resolves to {url}, outside {base}"
            )));
        }
        Ok(url)
    }

    /// The items collection URL with `id` appended as one encoded segment.
    fn item_url(&self, id: &str) -> Result<Url> {
        // `.` and `..` would be dropped or climb out of the collection.
        if matches!(id, "" | "." | "..") {
            return Err(Error::InvalidUrl(format!("item id {id:?}")));
        }

        let mut url = self.resolve(ITEMS_PATH)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl("base URL cannot hold a path".to_string()))?
            .push(id);
        Ok(url)
    }

    fn authorize(
        &self,
        method: HttpMethod,
        url: Url,
        body: Option<&Value>,
        kind: EndpointKind,
    ) -> Result<HttpRequest> {
        let api_key = self.config.api_key_for(kind).ok_or_else(Error::missing_key)?;

        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Serialization(e.to_string()))?;

        debug!(method = %method, url = %url, kind = ?kind, "built request");
        Ok(HttpRequest {
            method,
            url: url.into(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                (API_KEY_HEADER.to_string(), api_key.to_string()),
            ],
            body,
        })
    }
}

fn to_body<S: Serialize>(input: &S) -> Result<Value> {
    serde_json::to_value(input).map_err(|e| Error::Serialization(e.to_string()))
}
