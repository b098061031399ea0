use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Binary request/response carrier keyed by a stable type identifier.
///
/// The runtime treats the payload as opaque bytes; the concrete schema is
/// owned by the message types registered against the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub type_id: String,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(type_id: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            type_id: type_id.into(),
            payload,
        }
    }

    pub fn from_message<M: TypedMessage>(message: &M) -> Result<Self> {
        Ok(Self {
            type_id: M::TYPE_ID.to_string(),
            payload: message.encode()?,
        })
    }
}

/// A request or response message with a stable, fully-qualified type
/// identifier and a byte codec.
///
/// The default codec is JSON via serde; message types owned by an external
/// schema collaborator may override `decode`/`encode` with their own wire
/// format. `TYPE_ID` must be unique across all registered messages.
pub trait TypedMessage: Serialize + DeserializeOwned + Send + 'static {
    const TYPE_ID: &'static str;

    fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload)
            .with_context(|| format!("decode payload for `{}`", Self::TYPE_ID))
    }

    fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).with_context(|| format!("encode payload for `{}`", Self::TYPE_ID))
    }
}
