//! Completes a multisig spend with the collected signatures.
//!
//! Signatures go into the scriptSig in the order given, which has to follow
//! the order of the keys in the redeem script. `--verify` checks that before
//! printing anything.

use clap::Parser;
use hdkeyutils::{PartialSignature, Result, UnsignedSpend};

#[derive(Parser)]
#[command(name = "finalizer", version, about = "Complete a multisig spend tx with signatures", long_about = None)]
struct Cli {
    /// Unsigned transaction, hex or a file holding it
    tx: String,

    /// Signatures, hex, in redeem script key order
    #[arg(required = true)]
    sigs: Vec<String>,

    /// Check the signatures against the redeem script before assembling
    #[arg(long)]
    verify: bool,
}

fn run(cli: Cli) -> Result<()> {
    let unsigned = UnsignedSpend::from_hex(&hdkeyutils::read_blob(&cli.tx)?)?;
    let sigs = cli
        .sigs
        .iter()
        .map(|s| s.parse::<PartialSignature>())
        .collect::<Result<Vec<_>>>()?;

    let finished = if cli.verify {
        unsigned.finish_verified(&sigs)?
    } else {
        unsigned.finish(&sigs)?
    };

    log::info!("txid {}", finished.txid());
    println!("{}", finished.to_hex());
    Ok(())
}

fn main() {
    hdkeyutils::init_logging();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
