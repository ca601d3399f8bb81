//! Address encoding for Bitcoin, Zcash and Ethereum.
//!
//! Bitcoin and Zcash share one pipeline: `hash160` of either a serialized
//! public key or a script, then Base58Check with the profile's prefix. Only
//! the prefix and the hashed payload differ. Ethereum bypasses the profile
//! table altogether.

use bitcoin::hashes::Hash;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{PubkeyHash, Script, ScriptBuf, ScriptHash};
use sha3::{Digest, Keccak256};

use crate::checksum;
use crate::error::{Error, Result};
use crate::network::{AddressFormat, KeySerialization, Network, NetworkProfile};

fn serialize_key(pubkey: &PublicKey, form: KeySerialization) -> Vec<u8> {
    match form {
        KeySerialization::Compressed => pubkey.serialize().to_vec(),
        KeySerialization::Uncompressed => pubkey.serialize_uncompressed().to_vec(),
    }
}

/// Pay-to-pubkey-hash address of `pubkey`, or the hex account address for
/// Ethereum.
pub fn from_public_key(pubkey: &PublicKey, format: AddressFormat, network: Network) -> String {
    match NetworkProfile::lookup(format, network) {
        Some(profile) => {
            let ser = serialize_key(pubkey, format.key_serialization());
            checksum::encode(&checksum::hash160(&ser), profile.pubkey_hash)
        }
        None => ethereum_address(pubkey),
    }
}

/// Pay-to-script-hash address of `script`.
pub fn from_script_hash(script: &Script, format: AddressFormat, network: Network) -> Result<String> {
    let profile = NetworkProfile::lookup(format, network).ok_or_else(|| {
        Error::UnsupportedFormat(format!("{} has no script-hash addresses", format))
    })?;

    let hash = checksum::hash160(script.as_bytes());
    log::debug!("script hash160 {}", hex::encode(hash));
    Ok(checksum::encode(&hash, profile.script_hash))
}

/// Keccak-256 of the uncompressed point without its `0x04` tag, last 20
/// bytes, rendered `0x`-prefixed in EIP-55 mixed case.
pub fn ethereum_address(pubkey: &PublicKey) -> String {
    let uncompressed = pubkey.serialize_uncompressed();
    let hash = Keccak256::digest(&uncompressed[1..]);
    to_checksum_case(&hex::encode(&hash[12..]))
}

fn to_checksum_case(lower_hex: &str) -> String {
    let hash = Keccak256::digest(lower_hex.as_bytes());

    let mut out = String::with_capacity(lower_hex.len() + 2);
    out.push_str("0x");
    for (i, c) in lower_hex.chars().enumerate() {
        let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Locking script paying to a base58 address of the given profile. Both
/// pubkey-hash and script-hash addresses are accepted.
pub fn locking_script(address: &str, format: AddressFormat, network: Network) -> Result<ScriptBuf> {
    let profile = NetworkProfile::lookup(format, network).ok_or_else(|| {
        Error::UnsupportedFormat(format!("cannot pay to {} addresses", format))
    })?;

    let (prefix, payload) = checksum::decode_with_prefix(address, profile.prefix_len())?;
    let hash: [u8; 20] = payload.as_slice().try_into().map_err(|_| {
        Error::Decode(format!("address payload is {} bytes, expected 20", payload.len()))
    })?;

    if prefix == profile.pubkey_hash {
        Ok(ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(hash)))
    } else if prefix == profile.script_hash {
        Ok(ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(hash)))
    } else {
        Err(Error::Decode(format!(
            "address version {} is not a {} {} address",
            hex::encode(&prefix),
            network,
            format
        )))
    }
}
