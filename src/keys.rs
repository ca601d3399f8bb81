//! Extended keys, key files and private key export.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bitcoin::bip32::{ChildNumber, Xpriv, Xpub};
use bitcoin::hashes::{Hash, HashEngine, sha512};
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Error, Result};
use crate::network::Network;

/// A node of an HD key tree, private or watch-only.
#[derive(Debug, Clone)]
pub enum ExtendedKey {
    Private(Xpriv),
    Public(Xpub),
}

impl ExtendedKey {
    pub fn is_private(&self) -> bool {
        matches!(self, ExtendedKey::Private(_))
    }

    /// Public counterpart of this key.
    pub fn neuter(&self) -> Xpub {
        match self {
            ExtendedKey::Private(xprv) => Xpub::from_priv(&Secp256k1::new(), xprv),
            ExtendedKey::Public(xpub) => *xpub,
        }
    }

    pub fn derive_child(&self, child: ChildNumber) -> Result<ExtendedKey> {
        let secp = Secp256k1::new();
        match self {
            ExtendedKey::Private(xprv) => Ok(ExtendedKey::Private(xprv.derive_priv(&secp, &[child])?)),
            ExtendedKey::Public(xpub) => Ok(ExtendedKey::Public(xpub.derive_pub(&secp, &[child])?)),
        }
    }

    pub fn ec_private_key(&self) -> Result<SecretKey> {
        match self {
            ExtendedKey::Private(xprv) => Ok(xprv.private_key),
            ExtendedKey::Public(_) => Err(Error::KeyType("expected a private key, got a public key".into())),
        }
    }

    pub fn ec_public_key(&self) -> PublicKey {
        match self {
            ExtendedKey::Private(xprv) => PublicKey::from_secret_key(&Secp256k1::new(), &xprv.private_key),
            ExtendedKey::Public(xpub) => xpub.public_key,
        }
    }

    /// Fails with `KeyType` unless this is a private key.
    pub fn require_private(&self) -> Result<&Xpriv> {
        match self {
            ExtendedKey::Private(xprv) => Ok(xprv),
            ExtendedKey::Public(_) => Err(Error::KeyType("given key was not a private key".into())),
        }
    }

    /// Fails with `KeyType` unless this is a public key.
    pub fn require_public(&self) -> Result<&Xpub> {
        match self {
            ExtendedKey::Public(xpub) => Ok(xpub),
            ExtendedKey::Private(_) => Err(Error::KeyType("given key was a private key, not public".into())),
        }
    }
}

impl Drop for ExtendedKey {
    fn drop(&mut self) {
        if let ExtendedKey::Private(xprv) = self {
            xprv.private_key.non_secure_erase();
        }
    }
}

impl FromStr for ExtendedKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(xprv) = Xpriv::from_str(s) {
            return Ok(ExtendedKey::Private(xprv));
        }
        Xpub::from_str(s)
            .map(ExtendedKey::Public)
            .map_err(|e| Error::Decode(format!("not an extended key: {}", e)))
    }
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedKey::Private(xprv) => write!(f, "{}", xprv),
            ExtendedKey::Public(xpub) => write!(f, "{}", xpub),
        }
    }
}

/// `--index` / `--harden` selection of a child key.
#[derive(Debug, Clone, Copy, Args)]
pub struct ChildArgs {
    /// HD wallet index of the child key
    #[arg(long)]
    pub index: u32,

    /// Offset the index into the hardened range
    #[arg(long)]
    pub harden: bool,
}

impl ChildArgs {
    pub fn child_number(&self) -> Result<ChildNumber> {
        child_number(self.index, self.harden)
    }
}

/// Child index; `hardened` offsets it by 2^31.
pub fn child_number(index: u32, hardened: bool) -> Result<ChildNumber> {
    let child = if hardened {
        ChildNumber::from_hardened_idx(index)?
    } else {
        ChildNumber::from_normal_idx(index)?
    };
    Ok(child)
}

/// On-disk key file written by `keygen`.
#[derive(Debug, Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xprv: Option<String>,
    pub xpub: String,
    pub fingerprint: String,
}

impl KeyFile {
    pub fn from_master(name: &str, master: &Xpriv) -> Self {
        let secp = Secp256k1::new();
        Self {
            name: name.to_string(),
            xprv: Some(master.to_string()),
            xpub: Xpub::from_priv(&secp, master).to_string(),
            fingerprint: master.fingerprint(&secp).to_string(),
        }
    }

    /// The most capable key the file carries.
    pub fn key(&self) -> Result<ExtendedKey> {
        match self.xprv.as_deref() {
            Some(xprv) => xprv.parse(),
            None => self.xpub.parse(),
        }
    }
}

/// Parses key file contents: a bare base58 extended key or a JSON [`KeyFile`].
pub fn parse_key(contents: &str) -> Result<ExtendedKey> {
    let trimmed = contents.trim();
    if trimmed.starts_with('{') {
        let file: KeyFile = serde_json::from_str(trimmed)?;
        file.key()
    } else {
        trimmed.parse()
    }
}

pub fn load_key(path: impl AsRef<Path>) -> Result<ExtendedKey> {
    let path = path.as_ref();
    let contents = Zeroizing::new(std::fs::read_to_string(path)?);
    let key = parse_key(&contents)?;
    log::debug!(
        "loaded {} key from {}",
        if key.is_private() { "private" } else { "public" },
        path.display()
    );
    Ok(key)
}

/// Output encoding for an exported child private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyFormat {
    /// Wallet import format, for Bitcoin and Zcash
    Wif,
    /// Raw 32-byte hex, for Ethereum
    Eth,
}

pub fn export_private(sk: &SecretKey, format: KeyFormat, network: Network, compressed: bool) -> Zeroizing<String> {
    match format {
        KeyFormat::Wif => {
            let key = bitcoin::PrivateKey {
                compressed,
                network: network.kind(),
                inner: *sk,
            };
            Zeroizing::new(key.to_wif())
        }
        KeyFormat::Eth => {
            let bytes = Zeroizing::new(sk.secret_bytes());
            Zeroizing::new(hex::encode(&bytes[..]))
        }
    }
}

/// Master seed: SHA-512 over the randomness source followed by the
/// operator's keyboard input.
pub fn seed_from_entropy(source: &[u8], keyboard: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut engine = sha512::Hash::engine();
    engine.input(source);
    engine.input(keyboard);
    Zeroizing::new(sha512::Hash::from_engine(engine).to_byte_array().to_vec())
}

pub fn new_master(seed: &[u8], network: Network) -> Result<Xpriv> {
    Ok(Xpriv::new_master(network.kind(), seed)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VECTOR1_SEED: &str = "000102030405060708090a0b0c0d0e0f";
    const VECTOR1_XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";

    fn master() -> Xpriv {
        new_master(&hex::decode(VECTOR1_SEED).unwrap(), Network::Mainnet).unwrap()
    }

    fn key_one() -> SecretKey {
        let mut sk = [0u8; 32];
        sk[31] = 1;
        SecretKey::from_slice(&sk).unwrap()
    }

    #[test]
    fn test_master_from_seed() {
        let key = ExtendedKey::Private(master());
        assert!(key.is_private());
        assert_eq!(key.neuter().to_string(), VECTOR1_XPUB);
    }

    #[test]
    fn test_public_and_private_derivation_agree() {
        let private = ExtendedKey::Private(master());
        let public = ExtendedKey::Public(private.neuter());
        let child = child_number(7, false).unwrap();

        let from_private = private.derive_child(child).unwrap();
        let from_public = public.derive_child(child).unwrap();
        assert_eq!(from_private.ec_public_key(), from_public.ec_public_key());
        assert_eq!(from_private.neuter(), *from_public.require_public().unwrap());
    }

    #[test]
    fn test_derivation_errors() {
        assert!(matches!(child_number(1 << 31, false), Err(Error::Derivation(_))));
        assert!(matches!(child_number(1 << 31, true), Err(Error::Derivation(_))));

        let public = ExtendedKey::Public(ExtendedKey::Private(master()).neuter());
        let hardened = child_number(0, true).unwrap();
        assert!(matches!(public.derive_child(hardened), Err(Error::Derivation(_))));
    }

    #[test]
    fn test_key_type_checks() {
        let public = ExtendedKey::Public(ExtendedKey::Private(master()).neuter());
        assert!(matches!(public.ec_private_key(), Err(Error::KeyType(_))));
        assert!(matches!(public.require_private(), Err(Error::KeyType(_))));

        let private = ExtendedKey::Private(master());
        assert!(matches!(private.require_public(), Err(Error::KeyType(_))));
    }

    #[test]
    fn test_parse_key_formats() {
        let file = KeyFile::from_master("key_a", &master());
        let json = serde_json::to_string_pretty(&file).unwrap();

        let from_json = parse_key(&json).unwrap();
        assert!(from_json.is_private());
        assert_eq!(from_json.neuter().to_string(), VECTOR1_XPUB);

        let bare = parse_key(&format!("{}\n", VECTOR1_XPUB)).unwrap();
        assert!(!bare.is_private());

        assert!(matches!(parse_key("not a key"), Err(Error::Decode(_))));
        assert!(matches!(parse_key("{\"name\": 1}"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_watch_only_key_file() {
        let json = format!(
            "{{\"name\":\"b\",\"xpub\":\"{}\",\"fingerprint\":\"3442193e\"}}",
            VECTOR1_XPUB
        );
        let key = parse_key(&json).unwrap();
        assert!(!key.is_private());
    }

    #[test]
    fn test_export_private() {
        let sk = key_one();
        let wif = export_private(&sk, KeyFormat::Wif, Network::Mainnet, true);
        assert_eq!(wif.as_str(), "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn");

        let legacy = export_private(&sk, KeyFormat::Wif, Network::Mainnet, false);
        assert_eq!(legacy.as_str(), "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf");

        let eth = export_private(&sk, KeyFormat::Eth, Network::Mainnet, true);
        assert_eq!(eth.len(), 64);
        assert!(eth.ends_with("01"));
    }

    #[test]
    fn test_seed_from_entropy() {
        let a = seed_from_entropy(b"os", b"keyboard");
        let b = seed_from_entropy(b"os", b"keyboard");
        let c = seed_from_entropy(b"os", b"other");
        assert_eq!(a.len(), 64);
        assert_eq!(*a, *b);
        assert_ne!(*a, *c);
        assert!(new_master(&a, Network::Testnet).unwrap().to_string().starts_with("tprv"));
    }
}
