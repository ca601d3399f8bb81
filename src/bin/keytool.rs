//! Utilities for HD private and public keys.

use std::path::PathBuf;

use bitcoin::PublicKey;
use clap::{Parser, Subcommand};
use hdkeyutils::keys::{self, ChildArgs, KeyFormat};
use hdkeyutils::{AddressFormat, Network, Result, address};

#[derive(Parser)]
#[command(name = "keytool", version, about = "A command line utility for manipulating HD wallet keys", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Utilities for working with HD private keys
    Priv {
        #[command(subcommand)]
        action: PrivCommands,
    },

    /// Tools for working with HD public keys
    Pub {
        #[command(subcommand)]
        action: PubCommands,
    },
}

#[derive(Subcommand)]
enum PrivCommands {
    /// Derive the master public key from the given master private key
    Getmasterpub {
        /// Private key file
        keyfile: PathBuf,
    },

    /// Derive a child private key and print it.
    ///
    /// WIF is for Bitcoin and Zcash wallets; `--format eth` prints the raw
    /// key as hex for Ethereum.
    Child {
        /// Private key file
        keyfile: PathBuf,

        #[command(flatten)]
        child: ChildArgs,

        #[arg(long, value_enum, default_value_t = KeyFormat::Wif)]
        format: KeyFormat,

        /// Mark the WIF key as belonging to an uncompressed public key
        #[arg(long)]
        uncompressed: bool,

        #[arg(long, value_enum, default_value_t = Network::Mainnet)]
        network: Network,
    },
}

#[derive(Subcommand)]
enum PubCommands {
    /// Derive a child public key and print its address
    Child {
        /// Public key file
        keyfile: PathBuf,

        #[command(flatten)]
        child: ChildArgs,

        /// Address format: btc, zec or eth
        #[arg(long, value_parser = str::parse::<AddressFormat>, default_value_t = AddressFormat::Btc)]
        format: AddressFormat,

        #[arg(long, value_enum, default_value_t = Network::Mainnet)]
        network: Network,
    },
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Priv { action: PrivCommands::Getmasterpub { keyfile } } => {
            let key = keys::load_key(&keyfile)?;
            key.require_private()?;
            print!("{}", key.neuter());
        }
        Commands::Priv {
            action:
                PrivCommands::Child {
                    keyfile,
                    child,
                    format,
                    uncompressed,
                    network,
                },
        } => {
            let key = keys::load_key(&keyfile)?;
            key.require_private()?;

            let derived = key.derive_child(child.child_number()?)?;
            let mut secret = derived.ec_private_key()?;
            let out = keys::export_private(&secret, format, network, !uncompressed);
            secret.non_secure_erase();
            println!("{}", out.as_str());
        }
        Commands::Pub {
            action:
                PubCommands::Child {
                    keyfile,
                    child,
                    format,
                    network,
                },
        } => {
            let key = keys::load_key(&keyfile)?;
            key.require_public()?;

            let child = child.child_number()?;
            let pubkey = key.derive_child(child)?.ec_public_key();
            log::info!("child {} public key {}", child, PublicKey::new(pubkey));
            println!("{}", address::from_public_key(&pubkey, format, network));
        }
    }
    Ok(())
}

fn main() {
    hdkeyutils::init_logging();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
