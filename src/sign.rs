//! Per-signer signing of an unsigned spend.

use bitcoin::bip32::ChildNumber;
use bitcoin::consensus::encode;
use bitcoin::hashes::{Hash, sha256d};
use bitcoin::secp256k1::{Message, Secp256k1};

use crate::error::Result;
use crate::keys::ExtendedKey;
use crate::spend::{PartialSignature, SIGHASH_ALL, UnsignedSpend};

/// Digest every signer commits to: `sha256d(tx || sighash_type as u32 LE)`,
/// with the redeem script still sitting in the input.
pub fn signature_hash(unsigned: &UnsignedSpend) -> sha256d::Hash {
    let mut data = encode::serialize(unsigned.transaction());
    data.extend_from_slice(&u32::from(SIGHASH_ALL).to_le_bytes());
    sha256d::Hash::hash(&data)
}

/// Derives the child at `child` from the signer's own private key and signs
/// the spend. The sighash type byte is appended later, when finishing.
pub fn sign(key: &ExtendedKey, child: ChildNumber, unsigned: &UnsignedSpend) -> Result<PartialSignature> {
    key.require_private()?;

    let derived = key.derive_child(child)?;
    let mut secret = derived.ec_private_key()?;

    let digest = signature_hash(unsigned);
    log::debug!("signature hash {}", hex::encode(digest.to_byte_array()));

    let secp = Secp256k1::new();
    let sig = secp.sign_ecdsa(&Message::from_digest(digest.to_byte_array()), &secret);
    secret.non_secure_erase();

    log::info!("signed with child {} key {}", child, derived.ec_public_key());
    Ok(PartialSignature::from_signature(&sig))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::keys::{child_number, new_master};
    use crate::network::Network;
    use crate::redeem;
    use bitcoin::secp256k1::ecdsa;
    use bitcoin::sighash::{EcdsaSighashType, SighashCache};
    use bitcoin::{Amount, ScriptBuf, Txid};

    fn signer(seed: u8) -> ExtendedKey {
        ExtendedKey::Private(new_master(&[seed; 32], Network::Mainnet).unwrap())
    }

    fn unsigned_for(keys: &[ExtendedKey], index: u32) -> UnsignedSpend {
        let child = child_number(index, false).unwrap();
        let pubkeys = keys
            .iter()
            .map(|k| bitcoin::PublicKey::new(k.derive_child(child).unwrap().ec_public_key()))
            .collect::<Vec<_>>();
        let redeem = redeem::build(2, keys.len(), &pubkeys).unwrap();
        UnsignedSpend::build(
            Txid::all_zeros(),
            0,
            &redeem,
            ScriptBuf::new_p2sh(&redeem.as_script().script_hash()),
            Amount::from_sat(1_000),
        )
    }

    #[test]
    fn test_signature_hash_matches_legacy_sighash() {
        let keys = vec![signer(1), signer(2), signer(3)];
        let unsigned = unsigned_for(&keys, 3);

        let cache = SighashCache::new(unsigned.transaction());
        let legacy = cache
            .legacy_signature_hash(0, unsigned.redeem_script(), EcdsaSighashType::All.to_u32())
            .unwrap();
        assert_eq!(signature_hash(&unsigned).to_byte_array(), legacy.to_byte_array());
    }

    #[test]
    fn test_signature_verifies_for_derived_key() {
        let keys = vec![signer(1), signer(2), signer(3)];
        let unsigned = unsigned_for(&keys, 3);
        let child = child_number(3, false).unwrap();

        let partial = sign(&keys[1], child, &unsigned).unwrap();
        let sig = ecdsa::Signature::from_der(partial.as_bytes()).unwrap();
        let pk = keys[1].derive_child(child).unwrap().ec_public_key();
        let msg = Message::from_digest(signature_hash(&unsigned).to_byte_array());
        assert!(Secp256k1::new().verify_ecdsa(&msg, &sig, &pk).is_ok());

        // RFC 6979 nonces make signing repeatable
        assert_eq!(sign(&keys[1], child, &unsigned).unwrap(), partial);
    }

    #[test]
    fn test_sign_rejects_public_key() {
        let keys = vec![signer(1), signer(2)];
        let unsigned = unsigned_for(&keys, 0);
        let public = ExtendedKey::Public(keys[0].neuter());
        let child = child_number(0, false).unwrap();
        assert!(matches!(sign(&public, child, &unsigned), Err(Error::KeyType(_))));
    }

    #[test]
    fn test_sign_hardened_child() {
        let keys = vec![signer(1), signer(2)];
        let unsigned = unsigned_for(&keys, 0);
        let hardened = child_number(0, true).unwrap();
        assert!(sign(&keys[0], hardened, &unsigned).is_ok());
    }
}
