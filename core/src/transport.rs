//! The I/O half of a call: one `HttpRequest` in, one `HttpResponse` out.

use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a single HTTP exchange.
///
/// Implementations must return every status code as data; interpreting the
/// status is the client's job. An `Err` means no response was obtained.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).send(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// Builds a fresh agent per call, so no connection outlives its request.
/// TLS is chosen by ureq from the URL scheme; timeouts are ureq's defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        // Status codes come back as data, not as `Err`.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();

        let url = request.url.as_str();
        let headers = &request.headers;
        let body = request.body.as_deref().map(str::as_bytes);
        let result = match request.method {
            HttpMethod::Get => with_headers(agent.get(url), headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(url), headers).call(),
            HttpMethod::Post => send_with_body(with_headers(agent.post(url), headers), body),
            HttpMethod::Patch => send_with_body(with_headers(agent.patch(url), headers), body),
            HttpMethod::Put => send_with_body(with_headers(agent.put(url), headers), body),
        };
        let mut response = result.map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
            .collect();

        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(format!("reading response body: {e}")))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn send_with_body(
    builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
    body: Option<&[u8]>,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    match body {
        Some(bytes) => builder.send(bytes),
        None => builder.send_empty(),
    }
}
