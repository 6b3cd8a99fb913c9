//! Blocking HTTP transport and per-endpoint session state.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use url::Url;

use crate::codec::{HeaderFragment, Payload};
use crate::envelope::{marshal, unmarshal, Decoded};
use crate::error::{DecodingError, EncodingError};
use crate::fault::Fault;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_USER_AGENT: &str = concat!("lather/", env!("CARGO_PKG_VERSION"));

/// HTTP basic-auth credentials, applied to every call when configured.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

/// What to do when the server answers with HTTP 200 and a zero-length
/// body. Some servers acknowledge asynchronous operations this way, so
/// the compatible default treats it as a no-op success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBodyPolicy {
    /// Return the response type's zero state.
    Succeed,
    /// Surface `CallError::EmptyResponse`.
    Error,
}

/// Wire-level observation points for the opt-in logging hook.
pub enum WireEvent<'a> {
    Request { action: &'a str, body: &'a [u8] },
    Response { status: u16, body: &'a [u8] },
}

pub type WireLog = dyn Fn(WireEvent<'_>) + Send + Sync;

/// Per-endpoint configuration; every default is explicit here rather
/// than hidden in module state.
pub struct ClientConfig {
    pub endpoint: Url,
    pub user_agent: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-call deadline; `None` means no deadline.
    pub call_timeout: Option<Duration>,
    /// Skip TLS certificate verification (test environments only).
    pub insecure_skip_verify: bool,
    pub basic_auth: Option<BasicAuth>,
    /// Reuse connections across calls. Off by default: the wire contract
    /// assumes the connection closes after each call.
    pub keep_alive: bool,
    pub empty_body: EmptyBodyPolicy,
}

impl ClientConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            call_timeout: None,
            insecure_skip_verify: false,
            basic_auth: None,
            keep_alive: false,
            empty_body: EmptyBodyPolicy::Succeed,
        }
    }

    pub fn for_endpoint(endpoint: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Url::parse(endpoint)?))
    }
}

/// Failures constructing a [`Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint URL")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("failed to build HTTP client")]
    Http(#[from] reqwest::Error),
}

/// One RPC round-trip's failure: encoding, transport, protocol, or a
/// service fault.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("transport failure")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Protocol(#[from] DecodingError),

    #[error(transparent)]
    Fault(#[from] Fault),

    #[error("server returned an empty response body")]
    EmptyResponse,
}

/// A reusable SOAP endpoint client, safe for concurrent calls.
///
/// The only shared mutable state is the header registry; it is replaced
/// wholesale on mutation, and each call snapshots it at start, so a
/// fragment added mid-call never appears in that call's envelope.
pub struct Client {
    http: reqwest::blocking::Client,
    config: ClientConfig,
    headers: RwLock<Arc<Vec<Arc<dyn HeaderFragment>>>>,
    wire_log: Option<Box<WireLog>>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(config.insecure_skip_verify);

        if !config.keep_alive {
            builder = builder.pool_max_idle_per_host(0);
        }

        Ok(Self {
            http: builder.build()?,
            config,
            headers: RwLock::new(Arc::new(Vec::new())),
            wire_log: None,
        })
    }

    /// Install a wire-logging hook. The runtime does not log otherwise.
    pub fn with_wire_log(mut self, hook: Box<WireLog>) -> Self {
        self.wire_log = Some(hook);
        self
    }

    /// Append a header fragment. Takes effect for calls started after
    /// this returns; in-flight calls keep their snapshot.
    pub fn add_header(&self, fragment: Arc<dyn HeaderFragment>) {
        let mut registry = match self.headers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut fragments = registry.as_ref().clone();
        fragments.push(fragment);
        *registry = Arc::new(fragments);
    }

    fn header_snapshot(&self) -> Arc<Vec<Arc<dyn HeaderFragment>>> {
        match self.headers.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Drive one RPC round-trip with the config's deadline.
    pub fn call<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp, CallError>
    where
        Req: Payload,
        Resp: Payload + Default,
    {
        self.call_with_deadline(action, request, self.config.call_timeout)
    }

    /// Drive one RPC round-trip with an explicit per-call deadline.
    pub fn call_with_deadline<Req, Resp>(
        &self,
        action: &str,
        request: &Req,
        deadline: Option<Duration>,
    ) -> Result<Resp, CallError>
    where
        Req: Payload,
        Resp: Payload + Default,
    {
        let snapshot = self.header_snapshot();
        let envelope = marshal(request, &snapshot)?;

        if let Some(hook) = &self.wire_log {
            hook(WireEvent::Request {
                action,
                body: &envelope,
            });
        }

        let mut http_request = self
            .http
            .post(self.config.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml; charset=\"utf-8\"")
            .header("SOAPAction", action)
            .body(envelope);

        if let Some(auth) = &self.config.basic_auth {
            http_request = http_request.basic_auth(&auth.username, auth.password.as_deref());
        }
        if let Some(deadline) = deadline {
            http_request = http_request.timeout(deadline);
        }

        let response = http_request.send()?;
        let status = response.status().as_u16();
        let body: Bytes = response.bytes()?;

        if let Some(hook) = &self.wire_log {
            hook(WireEvent::Response {
                status,
                body: &body,
            });
        }

        if body.is_empty() {
            return match self.config.empty_body {
                EmptyBodyPolicy::Succeed => Ok(Resp::default()),
                EmptyBodyPolicy::Error => Err(CallError::EmptyResponse),
            };
        }

        // Faults arrive with HTTP 500; the body decides the outcome, not
        // the status line.
        match unmarshal::<Resp>(&body)? {
            Decoded::Value(value) => Ok(value),
            Decoded::Fault(fault) => Err(CallError::Fault(fault)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::UsernameToken;

    #[test]
    fn snapshot_is_isolated_from_later_mutations() {
        let client = Client::new(
            ClientConfig::for_endpoint("http://127.0.0.1:1/soap").unwrap(),
        )
        .unwrap();

        client.add_header(Arc::new(UsernameToken::new("alice", "one")));
        let snapshot = client.header_snapshot();
        client.add_header(Arc::new(UsernameToken::new("alice", "two")));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(client.header_snapshot().len(), 2);
    }
}
