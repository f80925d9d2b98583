//! Error types for VM operations
//!
//! Input starvation and halting are ordinary outcomes reported through
//! [`Status`](crate::vm::Status). Everything in this module is fatal: it means
//! the program image is corrupt or the VM itself is defective.

use thiserror::Error;

/// Error variants that can occur during VM execution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VMError {
    /// The low two digits of an instruction cell do not name an instruction
    #[error("Unknown opcode {opcode} at address {address}")]
    UnknownOpcode { opcode: i64, address: usize },

    /// A parameter mode digit other than 0, 1 or 2
    #[error("Invalid parameter mode {mode} for operand {operand} of instruction {instruction}")]
    InvalidParameterMode {
        mode: i64,
        operand: usize,
        instruction: i64,
    },

    /// Immediate mode used for an operand that is written to
    #[error("Immediate mode is not valid for the destination operand of {instruction} at address {address}")]
    ImmediateDestination { instruction: String, address: usize },

    /// A read or write resolved to an address below zero
    #[error("Negative memory address: {0}")]
    NegativeAddress(i64),

    /// A jump target resolved to an address below zero
    #[error("Jump to negative address {target} from address {address}")]
    NegativeInstructionPointer { target: i64, address: usize },

    /// The result of an Add or Multiply does not fit in a cell
    #[error("Arithmetic overflow in {instruction} at address {address}")]
    ArithmeticOverflow { instruction: String, address: usize },
}
