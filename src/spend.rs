//! Bare multisig spend transactions.
//!
//! An [`UnsignedSpend`] carries the redeem script in its only input's
//! signature-script slot so signers have something to commit to. Finishing
//! swaps that placeholder for
//! `OP_0 <sig_1 || 0x01> .. <sig_k || 0x01> <redeem script>`.

use std::fmt;
use std::str::FromStr;

use bitcoin::consensus::encode;
use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::OP_PUSHBYTES_0;
use bitcoin::script::{Builder, PushBytes, PushBytesBuf};
use bitcoin::secp256k1::{Message, Secp256k1, ecdsa};
use bitcoin::{
    Amount, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness, absolute,
    transaction,
};

use crate::error::{Error, Result};
use crate::redeem::RedeemScript;
use crate::sign;

/// Signature hash type appended to every signature: SIGHASH_ALL.
pub const SIGHASH_ALL: u8 = 0x01;

/// One signer's DER-encoded signature, without the sighash type byte.
///
/// Always held in low-S form, which is what standard relay accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSignature(Vec<u8>);

impl PartialSignature {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let sig = ecdsa::Signature::from_der(der).map_err(|e| Error::Decode(format!("invalid DER signature: {}", e)))?;
        Ok(Self::from_signature(&sig))
    }

    pub fn from_signature(sig: &ecdsa::Signature) -> Self {
        let mut sig = *sig;
        sig.normalize_s();
        Self(sig.serialize_der().to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn to_ecdsa(&self) -> Result<ecdsa::Signature> {
        ecdsa::Signature::from_der(&self.0).map_err(|e| Error::Decode(format!("invalid DER signature: {}", e)))
    }
}

impl FromStr for PartialSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_der(&hex::decode(s.trim())?)
    }
}

impl fmt::Display for PartialSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

fn single_input(tx: &Transaction) -> Result<&TxIn> {
    match tx.input.as_slice() {
        [input] => Ok(input),
        inputs => Err(Error::InvalidParameter(format!(
            "expected a transaction with one input, got {}",
            inputs.len()
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedSpend {
    tx: Transaction,
}

impl UnsignedSpend {
    /// Spends `prev_txid:output_index`, paying `value` to `destination`.
    pub fn build(
        prev_txid: Txid,
        output_index: u32,
        redeem: &RedeemScript,
        destination: ScriptBuf,
        value: Amount,
    ) -> Self {
        let tx = Transaction {
            version: transaction::Version::ONE,
            lock_time: absolute::LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint {
                    txid: prev_txid,
                    vout: output_index,
                },
                script_sig: redeem.as_script().to_owned(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output: vec![TxOut {
                value,
                script_pubkey: destination,
            }],
        };
        log::info!(
            "built spend of {}:{} paying {} sat",
            prev_txid,
            output_index,
            value.to_sat()
        );
        Self { tx }
    }

    /// Accepts only a transaction whose single input still holds a bare
    /// multisig redeem script. A finished spend does not qualify.
    pub fn from_tx(tx: Transaction) -> Result<Self> {
        let input = single_input(&tx)?;
        if input.script_sig.is_empty() {
            return Err(Error::InvalidParameter(
                "transaction input carries no redeem script".into(),
            ));
        }
        RedeemScript::parse(input.script_sig.clone()).map_err(|e| {
            Error::InvalidParameter(format!("transaction input is not an unsigned multisig spend: {}", e))
        })?;
        Ok(Self { tx })
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let tx: Transaction = encode::deserialize(&hex::decode(s.trim())?)?;
        Self::from_tx(tx)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(encode::serialize(&self.tx))
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// The placeholder redeem script in the input's signature-script slot.
    pub fn redeem_script(&self) -> &Script {
        &self.tx.input[0].script_sig
    }

    /// Assembles the scriptSig from `sigs` in the given order. Signatures are
    /// not checked against the redeem script.
    pub fn finish(self, sigs: &[PartialSignature]) -> Result<FinishedSpend> {
        if sigs.is_empty() {
            return Err(Error::InvalidParameter("at least one signature is required".into()));
        }

        let mut builder = Builder::new().push_opcode(OP_PUSHBYTES_0);
        for sig in sigs {
            let mut data = Vec::with_capacity(sig.as_bytes().len() + 1);
            data.extend_from_slice(sig.as_bytes());
            data.push(SIGHASH_ALL);
            let push = PushBytesBuf::try_from(data)
                .map_err(|_| Error::InvalidParameter("signature too large to push".into()))?;
            builder = builder.push_slice(push);
        }

        let redeem = <&PushBytes>::try_from(self.redeem_script().as_bytes())
            .map_err(|_| Error::InvalidParameter("redeem script too large to push".into()))?;
        let script_sig = builder.push_slice(redeem).into_script();

        let mut tx = self.tx;
        tx.input[0].script_sig = script_sig;
        log::info!("assembled scriptSig with {} signature(s)", sigs.len());
        Ok(FinishedSpend { tx })
    }

    /// [`UnsignedSpend::finish`] after [`UnsignedSpend::verify_signatures`].
    pub fn finish_verified(self, sigs: &[PartialSignature]) -> Result<FinishedSpend> {
        self.verify_signatures(sigs)?;
        self.finish(sigs)
    }

    /// Checks `sigs` the way `OP_CHECKMULTISIG` will: exactly `m` of them,
    /// each valid for a key that comes later in the script than the key
    /// matched by the previous signature.
    pub fn verify_signatures(&self, sigs: &[PartialSignature]) -> Result<()> {
        let redeem = RedeemScript::parse(self.redeem_script().to_owned())?;
        if sigs.len() != redeem.threshold() {
            return Err(Error::Verification(format!(
                "{}-of-{} script needs {} signatures, got {}",
                redeem.threshold(),
                redeem.pubkeys().len(),
                redeem.threshold(),
                sigs.len()
            )));
        }

        let secp = Secp256k1::verification_only();
        let msg = Message::from_digest(sign::signature_hash(self).to_byte_array());

        let mut keys = redeem.pubkeys().iter().enumerate();
        for (i, sig) in sigs.iter().enumerate() {
            let sig = sig.to_ecdsa()?;
            match keys.by_ref().find(|(_, pk)| secp.verify_ecdsa(&msg, &sig, &pk.inner).is_ok()) {
                Some((k, _)) => log::debug!("signature {} matches key {}", i + 1, k + 1),
                None => {
                    return Err(Error::Verification(format!(
                        "signature {} matches no remaining key in script order",
                        i + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A spend whose input carries the assembled scriptSig, ready to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSpend {
    tx: Transaction,
}

impl FinishedSpend {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn script_sig(&self) -> &Script {
        &self.tx.input[0].script_sig
    }

    pub fn txid(&self) -> Txid {
        self.tx.compute_txid()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(encode::serialize(&self.tx))
    }
}
