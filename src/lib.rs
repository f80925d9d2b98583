pub mod ascii;
pub mod config;
pub mod program;
pub mod vm;

pub use crate::program::{load_program, parse_program, ProgramError};
pub use crate::vm::{Cell, ProcessResult, Status, VMError, VM};
