//! Error types for the motion-module interface

use thiserror::Error;

use crate::control::{ControlRequest, OperatingState};

/// Error type for motion-module operations
#[derive(Error, Debug)]
pub enum MotionModuleError {
    /// The requested toggle has no reachable target state
    #[error("invalid transition: {request:?} enable={enable} while {state:?}")]
    InvalidTransition {
        request: ControlRequest,
        enable: bool,
        state: OperatingState,
    },

    /// Raw control id outside the defined output set
    #[error("unsupported control requested: {0}, valid range is [1,2]")]
    UnsupportedControl(u8),

    /// The hardware command send failed or timed out
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type for motion-module operations
pub type Result<T> = std::result::Result<T, MotionModuleError>;
