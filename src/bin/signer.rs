//! Signs an unsigned multisig spend with a single key.
//!
//! A signer only ever loads its own private key. It prints one detached
//! signature for the operator to carry back to the finalizer; nothing else
//! leaves the machine.

use std::path::PathBuf;

use clap::Parser;
use hdkeyutils::keys::{self, ChildArgs};
use hdkeyutils::{Result, UnsignedSpend, sign};

#[derive(Parser)]
#[command(name = "signer", version, about = "Sign a multisig transaction", long_about = None)]
struct Cli {
    /// Private key file of this signer
    keyfile: PathBuf,

    /// Unsigned transaction, hex or a file holding it
    tx: String,

    #[command(flatten)]
    child: ChildArgs,
}

fn log_details(unsigned: &UnsignedSpend) {
    let tx = unsigned.transaction();
    for input in &tx.input {
        log::info!("spending {}", input.previous_output);
    }
    for (i, output) in tx.output.iter().enumerate() {
        log::info!("output {}: {} sat to {}", i, output.value.to_sat(), output.script_pubkey);
    }
}

fn run(cli: Cli) -> Result<()> {
    let key = keys::load_key(&cli.keyfile)?;
    let unsigned = UnsignedSpend::from_hex(&hdkeyutils::read_blob(&cli.tx)?)?;
    log_details(&unsigned);

    let sig = sign::sign(&key, cli.child.child_number()?, &unsigned)?;
    println!("{}", sig);
    Ok(())
}

fn main() {
    hdkeyutils::init_logging();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
