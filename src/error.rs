//! Engine error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Operation not allowed in the entity's current state
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
    /// Time-scale must be finite and positive
    #[error("invalid time scale {0}")]
    InvalidTimeScale(f32),
    /// LCG modulus must be at least 2
    #[error("invalid rng modulus {0}")]
    InvalidRngModulus(u64),
    /// `Scheduler::tick` called from inside a scheduled callback
    #[error("scheduler tick re-entered from a callback")]
    ReentrantTick,
    /// A logical action was bound to no keys
    #[error("key binding must contain at least one key")]
    EmptyKeyBinding,
    /// The asset collaborator has nothing under this name
    #[error("asset not found: {name}")]
    AssetNotFound { name: String },
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do when gameplay code asks for something the current state forbids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvalidStatePolicy {
    /// Return `EngineError::InvalidState`
    #[default]
    Error,
    /// Log a warning and carry on
    Warn,
    /// Carry on silently
    Ignore,
}

impl InvalidStatePolicy {
    /// Apply the policy to a rejected operation
    pub fn reject(self, operation: &'static str, state: &'static str) -> Result<(), EngineError> {
        match self {
            InvalidStatePolicy::Error => Err(EngineError::InvalidState { operation, state }),
            InvalidStatePolicy::Warn => {
                log::warn!("ignored: cannot {} while {}", operation, state);
                Ok(())
            }
            InvalidStatePolicy::Ignore => Ok(()),
        }
    }
}
