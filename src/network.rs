//! Version-prefix table per chain and network.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::Error;

/// Address family selected on the command line. Parsed with
/// [`FromStr`] so that unknown names surface as `UnsupportedFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFormat {
    Btc,
    Zec,
    Eth,
}

/// Pubkey serialization hashed into a pubkey-hash address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySerialization {
    Compressed,
    Uncompressed,
}

impl AddressFormat {
    /// Bitcoin wallets expect compressed keys, legacy Zcash tooling hashed
    /// the uncompressed form. Ethereum always hashes the uncompressed point.
    pub fn key_serialization(self) -> KeySerialization {
        match self {
            AddressFormat::Btc => KeySerialization::Compressed,
            AddressFormat::Zec | AddressFormat::Eth => KeySerialization::Uncompressed,
        }
    }

    /// Base58Check profile of this format, `None` for Ethereum.
    pub fn profile(self, network: Network) -> Option<NetworkProfile> {
        NetworkProfile::lookup(self, network)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AddressFormat::Btc => "btc",
            AddressFormat::Zec => "zec",
            AddressFormat::Eth => "eth",
        }
    }
}

impl fmt::Display for AddressFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "btc" => Ok(AddressFormat::Btc),
            "zec" => Ok(AddressFormat::Zec),
            "eth" => Ok(AddressFormat::Eth),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn kind(self) -> bitcoin::NetworkKind {
        match self {
            Network::Mainnet => bitcoin::NetworkKind::Main,
            Network::Testnet => bitcoin::NetworkKind::Test,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => f.write_str("mainnet"),
            Network::Testnet => f.write_str("testnet"),
        }
    }
}

/// Version prefixes for one (chain, network) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkProfile {
    pub pubkey_hash: &'static [u8],
    pub script_hash: &'static [u8],
}

pub const BITCOIN_MAINNET: NetworkProfile = NetworkProfile {
    pubkey_hash: &[0x00],
    script_hash: &[0x05],
};

pub const BITCOIN_TESTNET: NetworkProfile = NetworkProfile {
    pubkey_hash: &[0x6f],
    script_hash: &[0xc4],
};

pub const ZCASH_MAINNET: NetworkProfile = NetworkProfile {
    pubkey_hash: &[0x1c, 0xb8],
    script_hash: &[0x1c, 0xbd],
};

pub const ZCASH_TESTNET: NetworkProfile = NetworkProfile {
    pubkey_hash: &[0x1d, 0x25],
    script_hash: &[0x1c, 0xba],
};

impl NetworkProfile {
    pub fn lookup(format: AddressFormat, network: Network) -> Option<NetworkProfile> {
        match (format, network) {
            (AddressFormat::Btc, Network::Mainnet) => Some(BITCOIN_MAINNET),
            (AddressFormat::Btc, Network::Testnet) => Some(BITCOIN_TESTNET),
            (AddressFormat::Zec, Network::Mainnet) => Some(ZCASH_MAINNET),
            (AddressFormat::Zec, Network::Testnet) => Some(ZCASH_TESTNET),
            (AddressFormat::Eth, _) => None,
        }
    }

    /// All prefixes of one profile share a length.
    pub fn prefix_len(&self) -> usize {
        self.pubkey_hash.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_table() {
        let btc = NetworkProfile::lookup(AddressFormat::Btc, Network::Mainnet).unwrap();
        assert_eq!(btc.pubkey_hash, &[0x00]);
        assert_eq!(btc.script_hash, &[0x05]);

        let ztest = NetworkProfile::lookup(AddressFormat::Zec, Network::Testnet).unwrap();
        assert_eq!(ztest.pubkey_hash, &[0x1d, 0x25]);
        assert_eq!(ztest.script_hash, &[0x1c, 0xba]);

        assert!(NetworkProfile::lookup(AddressFormat::Eth, Network::Mainnet).is_none());
    }

    #[test]
    fn test_profiles_are_well_formed() {
        for format in [AddressFormat::Btc, AddressFormat::Zec] {
            for network in [Network::Mainnet, Network::Testnet] {
                let p = format.profile(network).unwrap();
                assert!(!p.pubkey_hash.is_empty());
                assert_eq!(p.pubkey_hash.len(), p.script_hash.len());
                assert_ne!(p.pubkey_hash, p.script_hash);
            }
        }
        assert_ne!(
            AddressFormat::Btc.profile(Network::Mainnet),
            AddressFormat::Btc.profile(Network::Testnet)
        );
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("zec".parse::<AddressFormat>().unwrap(), AddressFormat::Zec);
        assert!(matches!(
            "ltc".parse::<AddressFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[derive(clap::Parser)]
    struct FormatCli {
        #[arg(long, value_parser = str::parse::<AddressFormat>, default_value_t = AddressFormat::Btc)]
        format: AddressFormat,
    }

    #[test]
    fn test_cli_format_goes_through_from_str() {
        use clap::Parser;

        let cli = FormatCli::try_parse_from(["tool", "--format", "eth"]).unwrap();
        assert_eq!(cli.format, AddressFormat::Eth);
        assert_eq!(FormatCli::try_parse_from(["tool"]).unwrap().format, AddressFormat::Btc);

        let err = FormatCli::try_parse_from(["tool", "--format", "ltc"]).err().unwrap();
        assert!(err.to_string().contains("unsupported format: ltc"));
    }
}
