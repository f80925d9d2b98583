//! Type definitions for the virtual machine
//!
//! This module contains the core data types used by the VM: the status state
//! machine, parameter modes, the closed instruction set and the result of a
//! single `process` call.
//!
//! The primary types defined here include:
//! - `Status`: Where the VM stands between two `process` calls
//! - `ParameterMode`: How an operand is interpreted
//! - `Opcode`: The ten Intcode instructions
//! - `Instruction`: A decoded opcode together with its operand modes
//! - `ProcessResult`: The outputs and status produced by one `process` call

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vm::errors::VMError;

/// A single addressable unit of memory, code and data alike
pub type Cell = i64;

/// Execution status of a VM
///
/// `Processing` is only ever held while the dispatch loop is running, so a
/// caller never observes it between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// No instruction has been executed yet
    Initial,

    /// The dispatch loop is running
    Processing,

    /// Execution stopped at an Input instruction with an empty input queue
    WaitingForInput,

    /// The program reached a Halt instruction
    Done,
}

impl Status {
    /// True once the program has halted
    pub fn is_done(&self) -> bool {
        *self == Status::Done
    }

    /// True while the VM is suspended on input
    pub fn is_waiting(&self) -> bool {
        *self == Status::WaitingForInput
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Initial => write!(f, "initial"),
            Status::Processing => write!(f, "processing"),
            Status::WaitingForInput => write!(f, "waiting for input"),
            Status::Done => write!(f, "done"),
        }
    }
}

/// Operand addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParameterMode {
    /// The operand is an address to dereference
    #[default]
    Position,

    /// The operand is the value itself
    Immediate,

    /// The operand is an offset from the relative base
    Relative,
}

impl ParameterMode {
    /// Map a single mode digit to a mode
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(ParameterMode::Position),
            1 => Some(ParameterMode::Immediate),
            2 => Some(ParameterMode::Relative),
            _ => None,
        }
    }
}

/// The Intcode instruction set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// `mem[dst] = a + b`
    Add,

    /// `mem[dst] = a * b`
    Multiply,

    /// Pop one input value into `mem[dst]`, suspending if none is queued
    Input,

    /// Append `a` to the output log
    Output,

    /// Jump to `b` if `a` is non-zero
    JumpIfTrue,

    /// Jump to `b` if `a` is zero
    JumpIfFalse,

    /// `mem[dst] = (a < b) as cell`
    LessThan,

    /// `mem[dst] = (a == b) as cell`
    Equals,

    /// `relative_base += a`
    AdjustRelativeBase,

    /// Stop execution
    Halt,
}

impl Opcode {
    /// Numeric code of the instruction as it appears in the low two digits
    pub fn code(&self) -> i64 {
        match self {
            Opcode::Add => 1,
            Opcode::Multiply => 2,
            Opcode::Input => 3,
            Opcode::Output => 4,
            Opcode::JumpIfTrue => 5,
            Opcode::JumpIfFalse => 6,
            Opcode::LessThan => 7,
            Opcode::Equals => 8,
            Opcode::AdjustRelativeBase => 9,
            Opcode::Halt => 99,
        }
    }

    /// Number of operand cells following the instruction cell
    pub fn operand_count(&self) -> usize {
        match self {
            Opcode::Add | Opcode::Multiply | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustRelativeBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Look up an instruction by its numeric code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Opcode::Add),
            2 => Some(Opcode::Multiply),
            3 => Some(Opcode::Input),
            4 => Some(Opcode::Output),
            5 => Some(Opcode::JumpIfTrue),
            6 => Some(Opcode::JumpIfFalse),
            7 => Some(Opcode::LessThan),
            8 => Some(Opcode::Equals),
            9 => Some(Opcode::AdjustRelativeBase),
            99 => Some(Opcode::Halt),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Add => write!(f, "Add"),
            Opcode::Multiply => write!(f, "Multiply"),
            Opcode::Input => write!(f, "Input"),
            Opcode::Output => write!(f, "Output"),
            Opcode::JumpIfTrue => write!(f, "JumpIfTrue"),
            Opcode::JumpIfFalse => write!(f, "JumpIfFalse"),
            Opcode::LessThan => write!(f, "LessThan"),
            Opcode::Equals => write!(f, "Equals"),
            Opcode::AdjustRelativeBase => write!(f, "AdjustRelativeBase"),
            Opcode::Halt => write!(f, "Halt"),
        }
    }
}

impl TryFrom<i64> for Opcode {
    type Error = i64;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Opcode::from_code(code).ok_or(code)
    }
}

/// A decoded instruction cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The instruction to dispatch
    pub opcode: Opcode,

    /// Mode of each operand in operand order
    pub modes: [ParameterMode; 3],
}

/// Outcome of executing a single instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Continue at the given instruction pointer
    Continue(usize),

    /// Input queue was empty; the instruction pointer must not move
    Suspend,

    /// Halt was reached
    Halt,
}

/// What a single `process` call produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Status after the call returned
    pub status: Status,

    /// Outputs appended during this call only
    pub outputs: Vec<Cell>,
}

impl ProcessResult {
    /// The most recent output of this call, `None` if it produced none
    pub fn last_output(&self) -> Option<Cell> {
        self.outputs.last().copied()
    }
}

/// Result alias used throughout the VM
pub type VMResult<T> = Result<T, VMError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_codes_round_trip() {
        for code in [1, 2, 3, 4, 5, 6, 7, 8, 9, 99] {
            let opcode = Opcode::from_code(code).unwrap();
            assert_eq!(opcode.code(), code);
        }
        assert_eq!(Opcode::from_code(10), None);
        assert_eq!(Opcode::try_from(0), Err(0));
    }

    #[test]
    fn test_status_predicates() {
        assert!(Status::WaitingForInput.is_waiting());
        assert!(!Status::Initial.is_waiting());
        assert!(Status::Done.is_done());
        assert!(!Status::WaitingForInput.is_done());
    }
}
