//! Intcode virtual machine
//!
//! This module contains the VM that executes Intcode programs, split into
//! memory, decoding, instruction execution and the status-tracking driver.

mod decoder;
mod errors;
mod execution;
mod memory;
mod types;

pub use decoder::decode;
pub use errors::VMError;
pub use execution::VMExecution;
pub use memory::VMMemory;
pub use types::{Cell, Instruction, Opcode, ParameterMode, ProcessResult, Status, Step, VMResult};

// Main VM struct that coordinates components
#[allow(clippy::module_inception)]
mod vm;
pub use vm::VM;
