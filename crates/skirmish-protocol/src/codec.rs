//! Turning envelopes into frames and back.
//!
//! The server is written against the [`Codec`] trait, never against a
//! concrete format. [`JsonCodec`] is the only implementation today; text
//! frames make every message readable in browser DevTools.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to frame bytes and decodes them back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the life of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Parses one frame. The result owns its data, so the frame buffer
    /// can be dropped right away.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON over `serde_json`. Behind the `json` feature (on by default).
///
/// ```rust
/// use skirmish_protocol::{ClientRequest, Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = br#"{"seq":1,"payload":{"type":"GetRoomList"}}"#;
/// let env: Envelope<ClientRequest> = codec.decode(frame).unwrap();
/// assert_eq!(env.payload, ClientRequest::GetRoomList);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
