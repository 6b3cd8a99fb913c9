//! SOAP 1.1 client runtime: envelope framing, a document/literal payload
//! codec, WS-Security username tokens, and a blocking HTTP transport.
//!
//! Generated service modules depend on this crate for everything that is
//! not mechanical schema data: they describe their payloads as [`Element`]
//! trees through the [`ToXml`]/[`FromXml`] traits and drive calls through
//! [`Client::call`].

pub mod client;
pub mod envelope;
pub mod error;
pub mod fault;
pub mod qname;
pub mod reader;
pub mod security;
pub mod tree;
pub mod writer;

mod codec;

pub use client::{BasicAuth, CallError, Client, ClientConfig, ClientError, EmptyBodyPolicy, WireEvent};
pub use codec::{ChildReader, FromXml, HeaderFragment, Payload, ToXml};
pub use envelope::{marshal, unmarshal, Decoded};
pub use error::{DecodingError, EncodingError};
pub use fault::Fault;
pub use qname::QName;
pub use security::UsernameToken;
pub use tree::Element;
