//! Program image parsing
//!
//! Intcode programs are distributed as a single line of comma-separated
//! signed integers. Surrounding whitespace, line breaks and a trailing comma
//! are tolerated.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::vm::Cell;

/// Errors that can occur while reading a program image
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// The source contained no cells at all
    #[error("Program is empty")]
    EmptyProgram,

    /// A cell that is not a valid 64-bit signed integer
    #[error("Invalid cell '{text}' at index {index}")]
    InvalidCell { index: usize, text: String },

    /// The program file could not be read
    #[error("Failed to read program {path}: {message}")]
    Io { path: String, message: String },
}

/// Parse comma-separated source into a program image
pub fn parse_program(source: &str) -> Result<Vec<Cell>, ProgramError> {
    let trimmed = source.trim();
    let trimmed = trimmed.strip_suffix(',').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Err(ProgramError::EmptyProgram);
    }

    trimmed
        .split(',')
        .enumerate()
        .map(|(index, text)| {
            let text = text.trim();
            text.parse::<Cell>().map_err(|_| ProgramError::InvalidCell {
                index,
                text: text.to_string(),
            })
        })
        .collect()
}

/// Read and parse a program file
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Vec<Cell>, ProgramError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| ProgramError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_program(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        assert_eq!(parse_program("3,0,4,0,99").unwrap(), vec![3, 0, 4, 0, 99]);
    }

    #[test]
    fn test_parse_negative_and_large() {
        assert_eq!(
            parse_program("104,1125899906842624,-34,99").unwrap(),
            vec![104, 1125899906842624, -34, 99]
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        assert_eq!(parse_program(" 1, 2,\n3 ,99,\n").unwrap(), vec![1, 2, 3, 99]);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_program(""), Err(ProgramError::EmptyProgram));
        assert_eq!(parse_program("  \n"), Err(ProgramError::EmptyProgram));
    }

    #[test]
    fn test_parse_invalid_cell() {
        assert_eq!(
            parse_program("1,2,x,99"),
            Err(ProgramError::InvalidCell {
                index: 2,
                text: "x".to_string()
            })
        );
        assert!(matches!(
            parse_program("1,,99"),
            Err(ProgramError::InvalidCell { index: 1, .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_program("/nonexistent/program.txt"),
            Err(ProgramError::Io { .. })
        ));
    }
}
