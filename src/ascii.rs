//! ASCII conventions for text-driven programs
//!
//! Many Intcode programs talk in ASCII: each input cell is one character and
//! a command ends with a newline. Output cells in the ASCII range render as
//! text; anything else (typically a final numeric answer) is kept aside.

use serde::{Deserialize, Serialize};

use crate::vm::Cell;

/// Encode one line of text as input cells, terminated by `'\n'`
pub fn encode_line(line: &str) -> Vec<Cell> {
    line.chars()
        .map(|c| c as Cell)
        .chain(std::iter::once('\n' as Cell))
        .collect()
}

/// Rendered program output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsciiOutput {
    /// Concatenated characters for cells in `0..=127`
    pub text: String,

    /// Cells outside the ASCII range, in order
    pub values: Vec<Cell>,
}

/// Split output cells into text and non-ASCII values
pub fn render(outputs: &[Cell]) -> AsciiOutput {
    let mut rendered = AsciiOutput::default();
    for &cell in outputs {
        match u8::try_from(cell) {
            Ok(byte) if byte.is_ascii() => rendered.text.push(byte as char),
            _ => rendered.values.push(cell),
        }
    }
    rendered
}
