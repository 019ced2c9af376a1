//! Errors surfaced by the odds engine.
use thiserror::Error;

use crate::constants::{MAX_POOL_SIZE, MIN_TARGET_NUMBER};

/// Broad category of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A dice pool argument is outside the range the engine can enumerate.
    InvalidArgument,
    /// The attack or band table is misconfigured; no work was done.
    Configuration,
}

/// Errors raised before any probability is computed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("dice pool must hold at least one die (got {size})")]
    InvalidPoolSize { size: i64 },
    #[error("dice pool of {size} dice exceeds the maximum of {max}")]
    PoolTooLarge { size: i64, max: u8 },
    #[error("injury bands must be provided")]
    MissingInjuryBands,
    #[error("hit target number must be at least {min} (got {target})")]
    TargetNumberTooLow { target: i32, min: i32 },
    #[error("injury band {index} has maximum {max} below its minimum {min}")]
    InvalidBand { index: usize, min: i32, max: i32 },
}

impl EngineError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPoolSize { .. } | Self::PoolTooLarge { .. } => ErrorKind::InvalidArgument,
            Self::MissingInjuryBands
            | Self::TargetNumberTooLow { .. }
            | Self::InvalidBand { .. } => ErrorKind::Configuration,
        }
    }

    pub(crate) const fn pool_too_large(size: i64) -> Self {
        Self::PoolTooLarge {
            size,
            max: MAX_POOL_SIZE,
        }
    }

    pub(crate) const fn target_too_low(target: i32) -> Self {
        Self::TargetNumberTooLow {
            target,
            min: MIN_TARGET_NUMBER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_split_arguments_from_configuration() {
        assert_eq!(
            EngineError::InvalidPoolSize { size: 0 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            EngineError::pool_too_large(21).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            EngineError::MissingInjuryBands.kind(),
            ErrorKind::Configuration
        );
        assert_eq!(EngineError::target_too_low(1).kind(), ErrorKind::Configuration);
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = EngineError::InvalidPoolSize { size: -3 };
        assert_eq!(err.to_string(), "dice pool must hold at least one die (got -3)");
        let err = EngineError::pool_too_large(25);
        assert!(err.to_string().contains("25"));
        assert!(err.to_string().contains("20"));
    }
}
