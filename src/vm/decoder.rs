//! Instruction decoding
//!
//! An instruction cell packs the opcode into its low two digits and one
//! parameter mode per operand into the digits above, least significant first.
//! `1002` is Multiply with modes `[Position, Immediate, Position]`.

use crate::vm::errors::VMError;
use crate::vm::types::{Cell, Instruction, Opcode, ParameterMode, VMResult};

/// Split an instruction cell into its opcode and operand modes
///
/// Missing mode digits default to position mode. `address` is only used to
/// report where an unknown opcode was found.
pub fn decode(value: Cell, address: usize) -> VMResult<Instruction> {
    let opcode = Opcode::try_from(value % 100)
        .map_err(|opcode| VMError::UnknownOpcode { opcode, address })?;

    let mut modes = [ParameterMode::Position; 3];
    let mut remaining = value / 100;
    for (operand, mode) in modes.iter_mut().enumerate() {
        let digit = remaining % 10;
        *mode = ParameterMode::from_digit(digit).ok_or(VMError::InvalidParameterMode {
            mode: digit,
            operand,
            instruction: value,
        })?;
        remaining /= 10;
    }

    Ok(Instruction { opcode, modes })
}
