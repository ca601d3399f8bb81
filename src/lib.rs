//! Shared pieces of the HD multisig toolkit.
//!
//! Keys come from BIP32 extended keys, child keys are derived with a single
//! index, addresses are produced for Bitcoin, Zcash and Ethereum, and bare
//! multisig spends are built, signed by each signer on their own and then
//! assembled.

pub mod address;
pub mod checksum;
pub mod error;
pub mod keys;
pub mod network;
pub mod redeem;
pub mod sign;
pub mod spend;
pub mod wallet;

pub use error::{Error, Result};
pub use keys::{ChildArgs, ExtendedKey, KeyFile, KeyFormat};
pub use network::{AddressFormat, Network, NetworkProfile};
pub use redeem::RedeemScript;
pub use spend::{FinishedSpend, PartialSignature, UnsignedSpend};
pub use wallet::{MultisigWallet, log_wallet_info};

/// Logger setup shared by the binaries: `info` unless `RUST_LOG` says
/// otherwise, written to stderr.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Command-line blob argument: the contents of the named file if it exists,
/// otherwise the argument itself.
pub fn read_blob(arg: &str) -> Result<String> {
    let path = std::path::Path::new(arg);
    if path.is_file() {
        Ok(std::fs::read_to_string(path)?.trim().to_string())
    } else {
        Ok(arg.trim().to_string())
    }
}
