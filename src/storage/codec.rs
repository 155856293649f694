/// Binary payload format for dictionary-specific records
///
/// Layout: magic `DTB`, one format version byte, a little-endian `u32`
/// payload length, then a MessagePack map with named fields. Named fields
/// let older stores load after a struct gains `#[serde(default)]` fields.
use crate::error::{DicoError, Result};
use byteorder::{ByteOrder, LittleEndian};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Magic bytes for dicoterm binary payloads
pub const PAYLOAD_MAGIC: &[u8] = b"DTB";

/// Current payload format version
pub const PAYLOAD_VERSION: u8 = 1;

const HEADER_LEN: usize = 3 + 1 + 4;

/// Serialize a record into the versioned, length-prefixed payload format
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let body = rmp_serde::to_vec_named(value)?;
    let len = u32::try_from(body.len())
        .map_err(|_| DicoError::Codec(format!("payload too large: {} bytes", body.len())))?;

    let mut data = Vec::with_capacity(HEADER_LEN + body.len());
    data.extend_from_slice(PAYLOAD_MAGIC);
    data.push(PAYLOAD_VERSION);
    let mut len_bytes = [0u8; 4];
    LittleEndian::write_u32(&mut len_bytes, len);
    data.extend_from_slice(&len_bytes);
    data.extend_from_slice(&body);
    Ok(data)
}

/// Deserialize a record written by [`encode`] (any version up to the current one)
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    if data.len() < HEADER_LEN || !data.starts_with(PAYLOAD_MAGIC) {
        return Err(DicoError::Codec("missing payload header".to_string()));
    }

    let version = data[3];
    if version == 0 || version > PAYLOAD_VERSION {
        return Err(DicoError::Codec(format!(
            "unsupported payload version {}",
            version
        )));
    }

    let len = LittleEndian::read_u32(&data[4..HEADER_LEN]) as usize;
    let body = &data[HEADER_LEN..];
    if body.len() < len {
        return Err(DicoError::Codec(format!(
            "truncated payload: expected {} bytes, found {}",
            len,
            body.len()
        )));
    }

    Ok(rmp_serde::from_slice(&body[..len])?)
}
