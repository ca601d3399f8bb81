//! Base58Check encoding over a version-prefixed payload.

use bitcoin::base58;
use bitcoin::hashes::{Hash, hash160, sha256d};

use crate::error::{Error, Result};

/// Length of the checksum appended before base-58 encoding.
pub const CHECKSUM_LEN: usize = 4;

/// `RIPEMD160(SHA256(data))`, the digest behind every base58 address here.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha256d::Hash::hash(data).to_byte_array();
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Returns `base58(prefix || payload || sha256d(prefix || payload)[..4])`.
pub fn encode(payload: &[u8], prefix: &[u8]) -> String {
    let mut data = Vec::with_capacity(prefix.len() + payload.len() + CHECKSUM_LEN);
    data.extend_from_slice(prefix);
    data.extend_from_slice(payload);

    let chk = checksum(&data);
    data.extend_from_slice(&chk);

    base58::encode(&data)
}

/// Decodes a Base58Check string and splits off a version prefix of
/// `prefix_len` bytes. Returns `(prefix, payload)`.
///
/// The embedded checksum is recomputed and must match.
pub fn decode_with_prefix(encoded: &str, prefix_len: usize) -> Result<(Vec<u8>, Vec<u8>)> {
    let data = base58::decode(encoded).map_err(|e| Error::Decode(format!("invalid base58: {}", e)))?;

    if data.len() < prefix_len + CHECKSUM_LEN {
        return Err(Error::Decode(format!(
            "decoded length {} is shorter than prefix plus checksum ({})",
            data.len(),
            prefix_len + CHECKSUM_LEN
        )));
    }

    let (body, chk) = data.split_at(data.len() - CHECKSUM_LEN);
    if checksum(body).as_slice() != chk {
        return Err(Error::Decode("checksum mismatch".into()));
    }

    let (prefix, payload) = body.split_at(prefix_len);
    Ok((prefix.to_vec(), payload.to_vec()))
}

/// Decodes a Base58Check string, returning only the payload without the
/// version prefix and checksum.
pub fn decode(encoded: &str, prefix_len: usize) -> Result<Vec<u8>> {
    decode_with_prefix(encoded, prefix_len).map(|(_, payload)| payload)
}
