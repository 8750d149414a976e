//! Error types for the vault factory mappings.
//!
//! - [`CallError`] - read-only contract call failures
//! - [`StoreError`] - entity persistence failures
//! - [`MappingError`] - top-level handler errors
//!
//! None of these are retried: a handler returning an error fails the whole
//! unit of work and the host discards its writes.

use thiserror::Error;

/// Failures of read-only contract calls.
#[derive(Debug, Error)]
pub enum CallError {
    /// The call reverted or its output could not be decoded.
    #[error("call `{method}` on {contract} failed")]
    Failed {
        contract: String,
        method: &'static str,
    },

    /// The target is not a 20-byte hex address.
    #[error("invalid contract address: {0}")]
    InvalidAddress(String),
}

impl CallError {
    pub fn failed(contract: &str, method: &'static str) -> Self {
        CallError::Failed {
            contract: contract.to_string(),
            method,
        }
    }
}

/// Entity store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An entity with this id already exists and cannot be created again.
    #[error("{entity} `{id}` already exists")]
    DuplicateKey { entity: &'static str, id: String },

    /// A stored entity could not be decoded.
    #[error("failed to decode {entity} `{id}`: {source}")]
    Decode {
        entity: &'static str,
        id: String,
        #[source]
        source: prost::DecodeError,
    },
}

/// Errors returned by the mapping handlers.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Contract call error: {0}")]
    Call(#[from] CallError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A singleton expected to exist is absent.
    #[error("{entity} `{id}` is missing")]
    MissingEntity { entity: &'static str, id: String },

    #[error("Block {block} missing header or timestamp")]
    MissingTimestamp { block: u64 },

    /// Module params could not be parsed or validated.
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type MappingResult<T> = Result<T, MappingError>;
