fn main() {
    println!("hdkeyutils: HD wallet keys and bare multisig toolkit");
    println!();
    println!("Available commands:");
    println!("  cargo run --bin keygen       Generate a master private key");
    println!("  cargo run --bin keytool      Derive child keys and addresses");
    println!("  cargo run --bin coordinator  Build redeem scripts, addresses, unsigned spends");
    println!("  cargo run --bin signer       Sign an unsigned spend with one key");
    println!("  cargo run --bin finalizer    Assemble signatures into the final spend");
}
