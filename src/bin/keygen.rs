//! Generates an HD wallet master private key.
//!
//! The seed is SHA-512 over bytes from a randomness source (the OS by
//! default) followed by whatever the operator types before Ctrl-D. The key
//! file is the only place the master key is written.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser;
use hdkeyutils::keys::{self, ExtendedKey, KeyFile};
use hdkeyutils::{Network, Result};
use rand::RngCore;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "keygen", version, about = "Generate an HD wallet master key", long_about = None)]
struct Cli {
    /// File to read randomness from instead of the OS generator
    #[arg(long)]
    randsrc: Option<PathBuf>,

    /// Number of bytes of randomness to read from the randomness source
    #[arg(long, default_value_t = 8192)]
    randlen: usize,

    /// Key file to write
    #[arg(short, long, default_value = "output.key")]
    output: PathBuf,

    /// Use this hex string as the entire seed
    #[arg(long)]
    seedhex: Option<String>,

    /// Name recorded in the key file
    #[arg(long, default_value = "key")]
    name: String,

    #[arg(long, value_enum, default_value_t = Network::Mainnet)]
    network: Network,
}

fn read_seed(cli: &Cli) -> Result<Zeroizing<Vec<u8>>> {
    if let Some(seedhex) = &cli.seedhex {
        log::info!("using seed given on the command line");
        return Ok(Zeroizing::new(hex::decode(seedhex.trim())?));
    }

    eprintln!("Please enter some randomness, press Ctrl+D when you're done");
    let mut keyboard = Zeroizing::new(Vec::new());
    std::io::stdin().read_to_end(&mut keyboard)?;
    log::info!("read {} bytes of random data from the keyboard", keyboard.len());

    let mut source = Zeroizing::new(vec![0u8; cli.randlen]);
    match &cli.randsrc {
        Some(path) => {
            log::info!("reading {} bytes from {}", cli.randlen, path.display());
            fs::File::open(path)?.read_exact(&mut source)?;
        }
        None => {
            log::info!("no alternate randomness source given, using the OS generator");
            rand::rngs::OsRng.fill_bytes(&mut source);
        }
    }

    Ok(keys::seed_from_entropy(&source, &keyboard))
}

fn run(cli: Cli) -> Result<()> {
    let seed = read_seed(&cli)?;

    log::info!("creating {} master private key", cli.network);
    let master = ExtendedKey::Private(keys::new_master(&seed, cli.network)?);
    let file = KeyFile::from_master(&cli.name, master.require_private()?);

    let json = Zeroizing::new(serde_json::to_string_pretty(&file)?);
    fs::write(&cli.output, json.as_bytes())?;

    log::info!("{}: {} -> {}", file.name, file.fingerprint, cli.output.display());
    log::info!("keep the key file secret, share only the xpub");
    Ok(())
}

fn main() {
    hdkeyutils::init_logging();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
