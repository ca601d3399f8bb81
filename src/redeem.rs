//! M-of-N `OP_CHECKMULTISIG` redeem scripts.
//!
//! Keys are pushed in the order supplied. Nothing is sorted, so every party
//! deriving the deposit address has to agree on the key order beforehand.

use std::str::FromStr;

use bitcoin::opcodes::Opcode;
use bitcoin::opcodes::all::{OP_CHECKMULTISIG, OP_PUSHNUM_1, OP_PUSHNUM_16};
use bitcoin::script::{Builder, Instruction};
use bitcoin::{PublicKey, Script, ScriptBuf};
use miniscript::Descriptor;

use crate::address;
use crate::error::{Error, Result};
use crate::network::{AddressFormat, Network};

/// Largest `n` expressible with a single small-integer opcode.
pub const MAX_PUBKEYS: usize = 16;

/// Largest element a P2SH spend may push; longer redeem scripts are
/// unspendable through a script-hash address.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemScript {
    script: ScriptBuf,
    threshold: usize,
    keys: Vec<PublicKey>,
}

fn check_params(m: usize, n: usize, keys: usize) -> Result<()> {
    if m == 0 {
        return Err(Error::InvalidParameter("m must be at least 1".into()));
    }
    if m > n {
        return Err(Error::InvalidParameter(format!("m ({}) must not exceed n ({})", m, n)));
    }
    if n > MAX_PUBKEYS {
        return Err(Error::InvalidParameter(format!("n ({}) must not exceed {}", n, MAX_PUBKEYS)));
    }
    if keys != n {
        return Err(Error::InvalidParameter(format!("expected {} public keys, got {}", n, keys)));
    }
    Ok(())
}

/// Builds `OP_m <key_1> .. <key_n> OP_n OP_CHECKMULTISIG`.
pub fn build(m: usize, n: usize, pubkeys: &[PublicKey]) -> Result<RedeemScript> {
    check_params(m, n, pubkeys.len())?;

    if let Some(pos) = pubkeys.iter().position(|k| !k.compressed) {
        return Err(Error::InvalidParameter(format!("public key {} is not compressed", pos)));
    }

    let mut builder = Builder::new().push_int(m as i64);
    for key in pubkeys {
        builder = builder.push_key(key);
    }
    let script = builder.push_int(n as i64).push_opcode(OP_CHECKMULTISIG).into_script();

    if script.len() > MAX_SCRIPT_ELEMENT_SIZE {
        log::warn!(
            "{}-of-{} redeem script is {} bytes, over the {} byte push limit for P2SH spends",
            m,
            n,
            script.len(),
            MAX_SCRIPT_ELEMENT_SIZE
        );
    }
    log::debug!("built {}-of-{} redeem script ({} bytes)", m, n, script.len());

    Ok(RedeemScript {
        script,
        threshold: m,
        keys: pubkeys.to_vec(),
    })
}

fn small_int(op: Opcode) -> Option<usize> {
    let first = OP_PUSHNUM_1.to_u8();
    let v = op.to_u8();
    (first..=OP_PUSHNUM_16.to_u8())
        .contains(&v)
        .then(|| (v - first + 1) as usize)
}

impl RedeemScript {
    /// Reads back a multisig script. Uncompressed keys are accepted here so
    /// scripts built by older tooling still load.
    pub fn parse(script: ScriptBuf) -> Result<Self> {
        let malformed = |why: &str| Error::Decode(format!("not a multisig redeem script: {}", why));

        let instructions = script
            .instructions()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Decode(format!("invalid script: {}", e)))?;

        let (last, rest) = instructions.split_last().ok_or_else(|| malformed("empty"))?;
        if *last != Instruction::Op(OP_CHECKMULTISIG) {
            return Err(malformed("missing OP_CHECKMULTISIG"));
        }

        let (m, n, pushes) = match rest {
            [Instruction::Op(m), pushes @ .., Instruction::Op(n)] => (*m, *n, pushes),
            _ => return Err(malformed("missing m or n")),
        };
        let m = small_int(m).ok_or_else(|| malformed("m is not a small integer"))?;
        let n = small_int(n).ok_or_else(|| malformed("n is not a small integer"))?;

        let keys = pushes
            .iter()
            .map(|ins| match ins {
                Instruction::PushBytes(bytes) => PublicKey::from_slice(bytes.as_bytes())
                    .map_err(|e| Error::Decode(format!("invalid public key: {}", e))),
                Instruction::Op(_) => Err(malformed("unexpected opcode between keys")),
            })
            .collect::<Result<Vec<_>>>()?;

        check_params(m, n, keys.len()).map_err(|e| malformed(&e.to_string()))?;

        Ok(Self {
            script,
            threshold: m,
            keys,
        })
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        Self::parse(ScriptBuf::from_bytes(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.script.as_bytes())
    }

    pub fn as_script(&self) -> &Script {
        &self.script
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn pubkeys(&self) -> &[PublicKey] {
        &self.keys
    }

    /// Pay-to-script-hash deposit address.
    pub fn address(&self, format: AddressFormat, network: Network) -> Result<String> {
        address::from_script_hash(&self.script, format, network)
    }

    /// `sh(multi(..))` descriptor for watch-only import.
    pub fn descriptor(&self) -> Result<Descriptor<PublicKey>> {
        let keys = self.keys.iter().map(|k| k.to_string()).collect::<Vec<_>>();
        let desc = format!("sh(multi({},{}))", self.threshold, keys.join(","));
        Descriptor::<PublicKey>::from_str(&desc)
            .map_err(|e| Error::InvalidParameter(format!("no descriptor for this script: {}", e)))
    }
}
