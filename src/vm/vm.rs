//! Main Virtual Machine implementation
//!
//! The VM struct is the central coordinator that:
//! - Owns the execution state (memory, instruction pointer, relative base, queues)
//! - Drives the dispatch loop until the program halts or starves for input
//! - Tracks the status state machine between calls
//! - Provides the primary API for drivers and tests
//!
//! A driver constructs a VM from a program image and calls [`VM::process`]
//! repeatedly, feeding new input each time. Each call returns only the outputs
//! produced during that call together with the resulting status.

use log::debug;
use std::str::FromStr;

use crate::program::{parse_program, ProgramError};
use crate::vm::execution::VMExecution;
use crate::vm::memory::VMMemory;
use crate::vm::types::{Cell, ProcessResult, Status, Step, VMResult};

/// An Intcode computer
#[derive(Debug, Clone)]
pub struct VM {
    /// Execution state
    executor: VMExecution,

    /// Current position in the status state machine
    status: Status,
}

impl VM {
    /// Create a VM that owns a private copy of `program`
    pub fn new(program: &[Cell]) -> Self {
        Self {
            executor: VMExecution::new(program),
            status: Status::Initial,
        }
    }

    /// Append `inputs` to the input queue and run until the program halts or
    /// needs more input
    ///
    /// Once the program is done, further calls do nothing and return an empty
    /// result with status `Done`.
    ///
    /// An `Err` leaves the VM unusable. Its status is put back to what it was
    /// before the failing call, even if some instructions ran, so it no longer
    /// describes the machine and must not be used to decide whether to call
    /// again.
    pub fn process(&mut self, inputs: &[Cell]) -> VMResult<ProcessResult> {
        if self.status == Status::Done {
            return Ok(ProcessResult {
                status: Status::Done,
                outputs: Vec::new(),
            });
        }

        let previous = self.status;
        self.status = Status::Processing;
        self.executor.inputs.extend(inputs.iter().copied());
        let first_output = self.executor.outputs.len();
        debug!(
            "Resuming at {} from {} with {} queued input(s)",
            self.executor.ip,
            previous,
            self.executor.inputs.len()
        );

        let status = self.run();
        // Processing must never be observable between calls.
        self.status = match &status {
            Ok(status) => *status,
            Err(_) => previous,
        };
        let status = status?;

        let outputs = self.executor.outputs[first_output..].to_vec();
        debug!(
            "Stopped at {} with status {} after producing {} output(s)",
            self.executor.ip,
            status,
            outputs.len()
        );

        Ok(ProcessResult { status, outputs })
    }

    /// Process with at most one new input
    pub fn process_one(&mut self, input: Option<Cell>) -> VMResult<ProcessResult> {
        match input {
            Some(value) => self.process(&[value]),
            None => self.process(&[]),
        }
    }

    fn run(&mut self) -> VMResult<Status> {
        loop {
            match self.executor.step()? {
                Step::Continue(ip) => self.executor.ip = ip,
                Step::Suspend => {
                    debug!("Waiting for input at {}", self.executor.ip);
                    return Ok(Status::WaitingForInput);
                }
                Step::Halt => return Ok(Status::Done),
            }
        }
    }

    /// Current status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Address of the next instruction to execute
    pub fn position(&self) -> usize {
        self.executor.ip
    }

    /// Current relative base
    pub fn relative_base(&self) -> Cell {
        self.executor.relative_base
    }

    /// Number of instructions executed so far
    pub fn steps(&self) -> u64 {
        self.executor.steps
    }

    /// Read-only view of memory
    pub fn memory(&self) -> &VMMemory {
        &self.executor.memory
    }

    /// Copy of the contiguous memory from address 0 up to the high-water mark
    ///
    /// Only the dense region is included. Cells written at or above 2^20 are
    /// listed by `memory().sparse_cells()`.
    pub fn memory_snapshot(&self) -> Vec<Cell> {
        self.executor.memory.snapshot()
    }

    /// Read a single memory cell
    pub fn read(&self, address: Cell) -> VMResult<Cell> {
        self.executor.memory.get(address)
    }

    /// Patch a memory cell between calls, e.g. to set a program's parameters
    /// before the first run
    pub fn write(&mut self, address: Cell, value: Cell) -> VMResult<()> {
        self.executor.memory.set(address, value)
    }

    /// Every output produced since construction
    pub fn output_log(&self) -> &[Cell] {
        &self.executor.outputs
    }

    /// The most recent output ever produced, `None` if there has been none
    pub fn last_output(&self) -> Option<Cell> {
        self.executor.outputs.last().copied()
    }

    /// Inputs supplied but not yet consumed
    pub fn pending_inputs(&self) -> Vec<Cell> {
        self.executor.inputs.iter().copied().collect()
    }
}

impl FromStr for VM {
    type Err = ProgramError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Ok(VM::new(&parse_program(source)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::errors::VMError;

    #[test]
    fn test_initial_status() {
        let vm = VM::new(&[99]);
        assert_eq!(vm.status(), Status::Initial);
        assert_eq!(vm.position(), 0);
        assert_eq!(vm.relative_base(), 0);
        assert_eq!(vm.last_output(), None);
    }

    #[test]
    fn test_day2_example() {
        let mut vm: VM = "1,9,10,3,2,3,11,0,99,30,40,50".parse().unwrap();
        let result = vm.process(&[]).unwrap();

        assert_eq!(result.status, Status::Done);
        assert!(result.outputs.is_empty());
        assert_eq!(vm.read(0).unwrap(), 3500);
        assert_eq!(
            vm.memory_snapshot(),
            vec![3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]
        );
    }

    #[test]
    fn test_echo() {
        let mut vm = VM::new(&[3, 0, 4, 0, 99]);
        let result = vm.process(&[42]).unwrap();

        assert_eq!(result.status, Status::Done);
        assert_eq!(result.outputs, vec![42]);
        assert_eq!(result.last_output(), Some(42));
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut vm = VM::new(&[3, 0, 4, 0, 99]);

        let result = vm.process(&[]).unwrap();
        assert_eq!(result.status, Status::WaitingForInput);
        assert!(result.outputs.is_empty());
        assert_eq!(vm.position(), 0);

        let result = vm.process_one(Some(5)).unwrap();
        assert_eq!(result.status, Status::Done);
        assert_eq!(result.outputs, vec![5]);
    }

    #[test]
    fn test_resume_without_input_stays_waiting() {
        let mut vm = VM::new(&[3, 0, 99]);
        vm.process(&[]).unwrap();

        let result = vm.process_one(None).unwrap();
        assert_eq!(result.status, Status::WaitingForInput);
        assert_eq!(vm.steps(), 0);
    }

    #[test]
    fn test_outputs_are_per_call() {
        // Output, wait for input, output it, halt
        let mut vm = VM::new(&[104, 1, 3, 9, 4, 9, 99, 0, 0, 0]);

        let first = vm.process(&[]).unwrap();
        assert_eq!(first.outputs, vec![1]);
        assert_eq!(first.status, Status::WaitingForInput);

        let second = vm.process(&[2]).unwrap();
        assert_eq!(second.outputs, vec![2]);
        assert_eq!(vm.output_log(), &[1, 2]);
        assert_eq!(vm.last_output(), Some(2));
    }

    #[test]
    fn test_done_is_idempotent() {
        let mut vm = VM::new(&[104, 7, 99]);
        vm.process(&[]).unwrap();
        let memory = vm.memory_snapshot();

        for _ in 0..3 {
            let result = vm.process(&[1, 2, 3]).unwrap();
            assert_eq!(result.status, Status::Done);
            assert!(result.outputs.is_empty());
        }

        assert_eq!(vm.memory_snapshot(), memory);
        assert_eq!(vm.output_log(), &[7]);
        assert!(vm.pending_inputs().is_empty());
    }

    #[test]
    fn test_extra_inputs_stay_queued() {
        let mut vm = VM::new(&[3, 0, 3, 1, 3, 2, 99]);
        vm.process(&[1]).unwrap();
        assert_eq!(vm.pending_inputs(), Vec::<Cell>::new());

        let mut vm = VM::new(&[3, 0, 99]);
        vm.process(&[1, 2, 3]).unwrap();
        assert_eq!(vm.pending_inputs(), vec![2, 3]);
    }

    #[test]
    fn test_write_before_run() {
        let mut vm = VM::new(&[1, 0, 0, 0, 99]);
        vm.write(1, 4).unwrap();
        vm.write(2, 4).unwrap();
        vm.process(&[]).unwrap();

        assert_eq!(vm.read(0).unwrap(), 198);
    }

    #[test]
    fn test_error_is_propagated() {
        let mut vm = VM::new(&[1, 0, 0, 0, 42]);
        let err = vm.process(&[]).unwrap_err();

        assert_eq!(err, VMError::UnknownOpcode { opcode: 42, address: 4 });
        // Status is restored to its value before the call, though the Add ran
        assert_eq!(vm.status(), Status::Initial);
        assert_eq!(vm.steps(), 1);
        assert_eq!(vm.read(0).unwrap(), 2);
    }

    #[test]
    fn test_error_after_suspension_restores_waiting() {
        let mut vm = VM::new(&[3, 0, 1, 0, 0, 0, 42]);
        vm.process(&[]).unwrap();

        assert!(vm.process(&[1]).is_err());
        assert_eq!(vm.status(), Status::WaitingForInput);
    }

    #[test]
    fn test_snapshot_excludes_far_cells() {
        // Writes 5 to address 2^20 + 3
        let mut vm = VM::new(&[1101, 2, 3, 1_048_579, 99]);
        vm.process(&[]).unwrap();

        assert_eq!(vm.memory_snapshot(), vec![1101, 2, 3, 1_048_579, 99]);
        assert_eq!(vm.memory().sparse_cells(), vec![(1_048_579, 5)]);
        assert_eq!(vm.read(1_048_579).unwrap(), 5);
    }
}
