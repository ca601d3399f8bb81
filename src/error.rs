//! Error kinds shared by every component.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("wrong key type: {0}")]
    KeyType(String),
    #[error("derivation error: {0}")]
    Derivation(#[from] bitcoin::bip32::Error),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("signature verification failed: {0}")]
    Verification(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Decode(format!("invalid hex: {}", e))
    }
}

impl From<bitcoin::consensus::encode::Error> for Error {
    fn from(e: bitcoin::consensus::encode::Error) -> Self {
        Error::Decode(format!("invalid transaction: {}", e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(format!("invalid key file: {}", e))
    }
}
