//! VM instruction execution
//!
//! `VMExecution` holds the complete continuation of a running program:
//! memory, instruction pointer, relative base and input queue. Given those,
//! decoding and dispatching the next instruction is stateless, which is what
//! makes suspension on input a plain early return.
//!
//! Each call to [`VMExecution::step`] executes exactly one instruction and
//! reports whether to continue, suspend or halt. The instruction pointer is
//! only moved by the caller, using the `Step::Continue` target.

use log::trace;
use std::collections::VecDeque;

use crate::vm::decoder::decode;
use crate::vm::errors::VMError;
use crate::vm::memory::VMMemory;
use crate::vm::types::{Cell, Instruction, Opcode, ParameterMode, Step, VMResult};

/// Execution state of a single program
#[derive(Debug, Clone)]
pub struct VMExecution {
    /// Program memory
    pub(crate) memory: VMMemory,

    /// Address of the next instruction to decode
    pub(crate) ip: usize,

    /// Offset applied to relative-mode operands
    pub(crate) relative_base: Cell,

    /// Values waiting to be consumed by Input
    pub(crate) inputs: VecDeque<Cell>,

    /// Every value produced by Output since construction
    pub(crate) outputs: Vec<Cell>,

    /// Number of instructions that ran to completion
    pub(crate) steps: u64,
}

impl VMExecution {
    /// Create an execution state for a program image
    pub fn new(image: &[Cell]) -> Self {
        Self {
            memory: VMMemory::from_image(image),
            ip: 0,
            relative_base: 0,
            inputs: VecDeque::new(),
            outputs: Vec::new(),
            steps: 0,
        }
    }

    /// Decode the instruction at the current instruction pointer
    pub fn current_instruction(&self) -> VMResult<Instruction> {
        decode(self.memory.read(self.ip), self.ip)
    }

    /// Execute the instruction at the instruction pointer
    pub fn step(&mut self) -> VMResult<Step> {
        let instruction = self.current_instruction()?;
        trace!(
            "{:>6}: {}({:02}) {:?} base={}",
            self.ip,
            instruction.opcode,
            instruction.opcode.code(),
            self.raw_operands(instruction.opcode),
            self.relative_base
        );

        let step = match instruction.opcode {
            Opcode::Add => {
                let a = self.value(&instruction, 0)?;
                let b = self.value(&instruction, 1)?;
                let dst = self.address(&instruction, 2)?;
                let sum = a.checked_add(b).ok_or_else(|| self.overflow(instruction.opcode))?;
                self.memory.set(dst, sum)?;
                self.advance(instruction.opcode)
            }

            Opcode::Multiply => {
                let a = self.value(&instruction, 0)?;
                let b = self.value(&instruction, 1)?;
                let dst = self.address(&instruction, 2)?;
                let product = a.checked_mul(b).ok_or_else(|| self.overflow(instruction.opcode))?;
                self.memory.set(dst, product)?;
                self.advance(instruction.opcode)
            }

            Opcode::Input => {
                let dst = self.address(&instruction, 0)?;
                match self.inputs.pop_front() {
                    Some(value) => {
                        self.memory.set(dst, value)?;
                        self.advance(instruction.opcode)
                    }
                    None => return Ok(Step::Suspend),
                }
            }

            Opcode::Output => {
                let value = self.value(&instruction, 0)?;
                self.outputs.push(value);
                self.advance(instruction.opcode)
            }

            Opcode::JumpIfTrue => {
                let condition = self.value(&instruction, 0)?;
                let target = self.value(&instruction, 1)?;
                if condition != 0 {
                    Step::Continue(self.jump_target(target)?)
                } else {
                    self.advance(instruction.opcode)
                }
            }

            Opcode::JumpIfFalse => {
                let condition = self.value(&instruction, 0)?;
                let target = self.value(&instruction, 1)?;
                if condition == 0 {
                    Step::Continue(self.jump_target(target)?)
                } else {
                    self.advance(instruction.opcode)
                }
            }

            Opcode::LessThan => {
                let a = self.value(&instruction, 0)?;
                let b = self.value(&instruction, 1)?;
                let dst = self.address(&instruction, 2)?;
                self.memory.set(dst, Cell::from(a < b))?;
                self.advance(instruction.opcode)
            }

            Opcode::Equals => {
                let a = self.value(&instruction, 0)?;
                let b = self.value(&instruction, 1)?;
                let dst = self.address(&instruction, 2)?;
                self.memory.set(dst, Cell::from(a == b))?;
                self.advance(instruction.opcode)
            }

            Opcode::AdjustRelativeBase => {
                let offset = self.value(&instruction, 0)?;
                self.relative_base = self
                    .relative_base
                    .checked_add(offset)
                    .ok_or_else(|| self.overflow(instruction.opcode))?;
                self.advance(instruction.opcode)
            }

            Opcode::Halt => Step::Halt,
        };

        self.steps += 1;
        Ok(step)
    }

    /// Raw operand cell at zero-based `index` after the instruction pointer
    fn operand(&self, index: usize) -> Cell {
        self.memory.read(self.ip + 1 + index)
    }

    fn raw_operands(&self, opcode: Opcode) -> Vec<Cell> {
        (0..opcode.operand_count()).map(|i| self.operand(i)).collect()
    }

    /// Resolve an operand for reading
    fn value(&self, instruction: &Instruction, index: usize) -> VMResult<Cell> {
        let raw = self.operand(index);
        match instruction.modes[index] {
            ParameterMode::Position => self.memory.get(raw),
            ParameterMode::Immediate => Ok(raw),
            ParameterMode::Relative => self.memory.get(self.relative(raw, instruction.opcode)?),
        }
    }

    /// Resolve an operand that names the address to write to
    fn address(&self, instruction: &Instruction, index: usize) -> VMResult<Cell> {
        let raw = self.operand(index);
        match instruction.modes[index] {
            ParameterMode::Position => Ok(raw),
            ParameterMode::Relative => self.relative(raw, instruction.opcode),
            ParameterMode::Immediate => Err(VMError::ImmediateDestination {
                instruction: instruction.opcode.to_string(),
                address: self.ip,
            }),
        }
    }

    fn relative(&self, raw: Cell, opcode: Opcode) -> VMResult<Cell> {
        self.relative_base
            .checked_add(raw)
            .ok_or_else(|| self.overflow(opcode))
    }

    fn jump_target(&self, target: Cell) -> VMResult<usize> {
        usize::try_from(target).map_err(|_| VMError::NegativeInstructionPointer {
            target,
            address: self.ip,
        })
    }

    fn advance(&self, opcode: Opcode) -> Step {
        Step::Continue(self.ip + 1 + opcode.operand_count())
    }

    fn overflow(&self, opcode: Opcode) -> VMError {
        VMError::ArithmeticOverflow {
            instruction: opcode.to_string(),
            address: self.ip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(execution: &mut VMExecution) -> VMResult<Step> {
        loop {
            match execution.step()? {
                Step::Continue(ip) => execution.ip = ip,
                other => return Ok(other),
            }
        }
    }

    #[test]
    fn test_add_advances_by_four() {
        let mut execution = VMExecution::new(&[1, 0, 0, 0, 99]);
        assert_eq!(execution.step().unwrap(), Step::Continue(4));
        assert_eq!(execution.memory.read(0), 2);
    }

    #[test]
    fn test_multiply_with_immediate_operand() {
        let mut execution = VMExecution::new(&[1002, 4, 3, 4, 33]);
        assert_eq!(run_to_end(&mut execution).unwrap(), Step::Halt);
        assert_eq!(execution.memory.read(4), 99);
    }

    #[test]
    fn test_negative_immediate_values() {
        let mut execution = VMExecution::new(&[1101, 100, -1, 4, 0]);
        assert_eq!(run_to_end(&mut execution).unwrap(), Step::Halt);
        assert_eq!(execution.memory.read(4), 99);
    }

    #[test]
    fn test_input_suspends_without_mutation() {
        let mut execution = VMExecution::new(&[3, 0, 99]);
        let before = execution.memory.clone();

        assert_eq!(execution.step().unwrap(), Step::Suspend);
        assert_eq!(execution.ip, 0);
        assert_eq!(execution.memory, before);
        assert_eq!(execution.steps, 0);

        execution.inputs.push_back(7);
        assert_eq!(execution.step().unwrap(), Step::Continue(2));
        assert_eq!(execution.memory.read(0), 7);
    }

    #[test]
    fn test_jumps() {
        // JumpIfTrue taken, JumpIfFalse not taken
        let mut execution = VMExecution::new(&[1105, 1, 7, 99, 0, 0, 0, 1106, 1, 3, 99]);
        assert_eq!(execution.step().unwrap(), Step::Continue(7));
        execution.ip = 7;
        assert_eq!(execution.step().unwrap(), Step::Continue(10));
    }

    #[test]
    fn test_comparisons() {
        let mut execution = VMExecution::new(&[1107, 1, 2, 9, 1108, 5, 5, 10, 99, 0, 0]);
        assert_eq!(run_to_end(&mut execution).unwrap(), Step::Halt);
        assert_eq!(execution.memory.read(9), 1);
        assert_eq!(execution.memory.read(10), 1);
    }

    #[test]
    fn test_relative_base_adjustment() {
        let mut execution = VMExecution::new(&[109, 19, 204, -34, 99]);
        execution.relative_base = 2000;
        execution.memory.write(1985, 123);

        assert_eq!(run_to_end(&mut execution).unwrap(), Step::Halt);
        assert_eq!(execution.relative_base, 2019);
        assert_eq!(execution.outputs, vec![123]);
    }

    #[test]
    fn test_immediate_destination_is_rejected() {
        let mut execution = VMExecution::new(&[11101, 1, 1, 0, 99]);
        assert!(matches!(
            execution.step(),
            Err(VMError::ImmediateDestination { address: 0, .. })
        ));
    }

    #[test]
    fn test_negative_address_is_rejected() {
        let mut execution = VMExecution::new(&[4, -1, 99]);
        assert_eq!(execution.step(), Err(VMError::NegativeAddress(-1)));
    }

    #[test]
    fn test_negative_jump_is_rejected() {
        let mut execution = VMExecution::new(&[1105, 1, -4, 99]);
        assert_eq!(
            execution.step(),
            Err(VMError::NegativeInstructionPointer { target: -4, address: 0 })
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut execution = VMExecution::new(&[1102, i64::MAX, 2, 0, 99]);
        assert!(matches!(
            execution.step(),
            Err(VMError::ArithmeticOverflow { .. })
        ));
    }
}
