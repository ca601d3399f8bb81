//! Builds multisig redeem scripts, deposit addresses and unsigned spends.

use std::str::FromStr;

use bitcoin::{Amount, Txid};
use clap::{Args, Parser, Subcommand};
use hdkeyutils::keys::ChildArgs;
use hdkeyutils::{
    AddressFormat, Error, MultisigWallet, Network, RedeemScript, Result, UnsignedSpend, address,
    log_wallet_info,
};

#[derive(Parser)]
#[command(name = "coordinator", version, about = "Manipulate HD multisig wallets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MultisigArgs {
    /// 'm' parameter for m of n
    #[arg(short)]
    m: usize,

    /// 'n' parameter for m of n
    #[arg(short)]
    n: usize,

    #[command(flatten)]
    child: ChildArgs,

    /// Extended keys of every signer, in the agreed order
    #[arg(required = true)]
    keys: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a multisig redeem script for the given keys
    RedeemScript {
        #[command(flatten)]
        multisig: MultisigArgs,
    },

    /// Create an HD multisig wallet address
    Addr {
        #[command(flatten)]
        multisig: MultisigArgs,

        /// Address format: btc, zec or eth
        #[arg(long, value_parser = str::parse::<AddressFormat>, default_value_t = AddressFormat::Btc)]
        format: AddressFormat,

        #[arg(long, value_enum, default_value_t = Network::Mainnet)]
        network: Network,

        /// Also print the sh(multi(..)) descriptor
        #[arg(long)]
        descriptor: bool,
    },

    /// Create a bare multisig spend transaction
    Mktx {
        /// Redeem script, hex
        redeem_script: String,

        /// Transaction holding the output to spend
        txid: String,

        /// Address to pay to
        target: String,

        /// Amount to pay, in the chain's base unit
        value: u64,

        /// Index of the previous output
        #[arg(long, default_value_t = 0)]
        prevoutindex: u32,

        /// Address family of the target: btc, zec or eth
        #[arg(long, value_parser = str::parse::<AddressFormat>, default_value_t = AddressFormat::Btc)]
        format: AddressFormat,

        #[arg(long, value_enum, default_value_t = Network::Mainnet)]
        network: Network,
    },
}

fn redeem_script(args: &MultisigArgs) -> Result<RedeemScript> {
    let wallet = MultisigWallet::from_key_strings(args.m, args.n, &args.keys)?;
    log_wallet_info(&wallet);
    wallet.redeem_script(args.child.child_number()?)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::RedeemScript { multisig } => {
            println!("{}", redeem_script(&multisig)?.to_hex());
        }
        Commands::Addr {
            multisig,
            format,
            network,
            descriptor,
        } => {
            let script = redeem_script(&multisig)?;
            println!("{}", script.address(format, network)?);
            if descriptor {
                println!("{}", script.descriptor()?);
            }
        }
        Commands::Mktx {
            redeem_script,
            txid,
            target,
            value,
            prevoutindex,
            format,
            network,
        } => {
            let redeem = RedeemScript::from_hex(&redeem_script)?;
            let prev = Txid::from_str(txid.trim())
                .map_err(|e| Error::Decode(format!("invalid txid: {}", e)))?;
            let destination = address::locking_script(&target, format, network)?;

            let unsigned = UnsignedSpend::build(prev, prevoutindex, &redeem, destination, Amount::from_sat(value));
            println!("{}", unsigned.to_hex());
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
