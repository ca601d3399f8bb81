//! HD multisig wallet: N extended keys and a threshold, one redeem script
//! per child index.

use bitcoin::bip32::ChildNumber;
use bitcoin::PublicKey;

use crate::error::{Error, Result};
use crate::keys::ExtendedKey;
use crate::network::{AddressFormat, Network};
use crate::redeem::{self, RedeemScript};

#[derive(Debug, Clone)]
pub struct MultisigWallet {
    pub threshold: usize,
    pub keys: Vec<ExtendedKey>,
}

impl MultisigWallet {
    /// `keys` must hold exactly `n` keys, in the order all signers agreed on.
    pub fn new(m: usize, n: usize, keys: Vec<ExtendedKey>) -> Result<Self> {
        if keys.len() != n {
            return Err(Error::InvalidParameter(format!(
                "expected {} extended keys, got {}",
                n,
                keys.len()
            )));
        }
        if m == 0 || m > n {
            return Err(Error::InvalidParameter(format!("invalid threshold {}-of-{}", m, n)));
        }
        Ok(Self { threshold: m, keys })
    }

    pub fn from_key_strings<S: AsRef<str>>(m: usize, n: usize, keys: &[S]) -> Result<Self> {
        let keys = keys
            .iter()
            .map(|k| k.as_ref().parse::<ExtendedKey>())
            .collect::<Result<Vec<_>>>()?;
        Self::new(m, n, keys)
    }

    pub fn signer_count(&self) -> usize {
        self.keys.len()
    }

    /// Compressed child public keys at `child`, in wallet order.
    pub fn child_pubkeys(&self, child: ChildNumber) -> Result<Vec<PublicKey>> {
        self.keys
            .iter()
            .map(|key| Ok(PublicKey::new(key.derive_child(child)?.ec_public_key())))
            .collect()
    }

    pub fn redeem_script(&self, child: ChildNumber) -> Result<RedeemScript> {
        let pubkeys = self.child_pubkeys(child)?;
        for (i, pk) in pubkeys.iter().enumerate() {
            log::debug!("signer {} child {} pubkey {}", i + 1, child, pk);
        }
        redeem::build(self.threshold, self.keys.len(), &pubkeys)
    }

    pub fn address(&self, child: ChildNumber, format: AddressFormat, network: Network) -> Result<String> {
        self.redeem_script(child)?.address(format, network)
    }
}

pub fn log_wallet_info(wallet: &MultisigWallet) {
    log::info!("threshold: {}-of-{}", wallet.threshold, wallet.signer_count());
    for (i, key) in wallet.keys.iter().enumerate() {
        let xpub = key.neuter();
        log::info!("signer {}: [{}] {}", i + 1, xpub.fingerprint(), &xpub.to_string()[..24]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{child_number, new_master};

    fn xpubs(count: u8) -> Vec<String> {
        (0..count)
            .map(|i| {
                let master = new_master(&[i + 1; 32], Network::Mainnet).unwrap();
                ExtendedKey::Private(master).neuter().to_string()
            })
            .collect()
    }

    #[test]
    fn test_wallet_creation() {
        let wallet = MultisigWallet::from_key_strings(2, 3, &xpubs(3)).unwrap();
        assert_eq!(wallet.threshold, 2);
        assert_eq!(wallet.signer_count(), 3);

        assert!(MultisigWallet::from_key_strings(2, 3, &xpubs(2)).is_err());
        assert!(MultisigWallet::from_key_strings(0, 3, &xpubs(3)).is_err());
        assert!(MultisigWallet::from_key_strings(4, 3, &xpubs(3)).is_err());
        assert!(matches!(
            MultisigWallet::from_key_strings(1, 1, &["garbage"]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_addresses_per_index() {
        let wallet = MultisigWallet::from_key_strings(2, 3, &xpubs(3)).unwrap();
        let a0 = wallet.address(child_number(0, false).unwrap(), AddressFormat::Btc, Network::Mainnet).unwrap();
        let a1 = wallet.address(child_number(1, false).unwrap(), AddressFormat::Btc, Network::Mainnet).unwrap();
        let again = wallet.address(child_number(0, false).unwrap(), AddressFormat::Btc, Network::Mainnet).unwrap();

        assert!(a0.starts_with('3'));
        assert_ne!(a0, a1);
        assert_eq!(a0, again);
    }

    #[test]
    fn test_private_and_public_keys_give_same_script() {
        let masters: Vec<ExtendedKey> = (1..=3u8)
            .map(|i| ExtendedKey::Private(new_master(&[i; 32], Network::Mainnet).unwrap()))
            .collect();
        let publics: Vec<ExtendedKey> = masters.iter().map(|k| ExtendedKey::Public(k.neuter())).collect();

        let child = child_number(5, false).unwrap();
        let private_wallet = MultisigWallet::new(2, 3, masters).unwrap();
        let public_wallet = MultisigWallet::new(2, 3, publics).unwrap();
        assert_eq!(
            private_wallet.redeem_script(child).unwrap(),
            public_wallet.redeem_script(child).unwrap()
        );

        let hardened = child_number(5, true).unwrap();
        assert!(private_wallet.redeem_script(hardened).is_ok());
        assert!(matches!(public_wallet.redeem_script(hardened), Err(Error::Derivation(_))));
    }
}
