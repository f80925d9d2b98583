//! VM Memory
//!
//! An address space of signed cells seeded from the program image. Reads of
//! addresses that were never written return zero; writes extend the address
//! space on demand.
//!
//! Addresses below `DENSE_LIMIT` live in a growable vector whose length is the
//! high-water mark. Programs occasionally poke a single far-away cell, so
//! anything above the limit goes to a map instead of forcing a huge resize.

use std::collections::HashMap;
use std::fmt;

use crate::vm::errors::VMError;
use crate::vm::types::{Cell, VMResult};

/// Addresses at or above this go to the sparse map
const DENSE_LIMIT: usize = 1 << 20;

/// Memory owned by a single VM instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VMMemory {
    /// Contiguous cells `0..dense.len()`
    dense: Vec<Cell>,

    /// Cells at addresses `>= DENSE_LIMIT`
    sparse: HashMap<usize, Cell>,

    /// Number of successful writes since construction
    writes: u64,
}

impl VMMemory {
    /// Create an empty memory space
    pub fn new() -> Self {
        Self::default()
    }

    /// Create memory seeded with a program image at addresses `0..image.len()`
    pub fn from_image(image: &[Cell]) -> Self {
        let mut memory = Self::new();
        if image.len() <= DENSE_LIMIT {
            memory.dense = image.to_vec();
        } else {
            memory.dense = image[..DENSE_LIMIT].to_vec();
            memory
                .sparse
                .extend(image[DENSE_LIMIT..].iter().enumerate().map(|(i, v)| (DENSE_LIMIT + i, *v)));
        }
        memory
    }

    /// Convert a resolved address into an index, rejecting negative values
    pub fn index(address: Cell) -> VMResult<usize> {
        usize::try_from(address).map_err(|_| VMError::NegativeAddress(address))
    }

    /// Read the cell at `address`, zero if never written
    pub fn get(&self, address: Cell) -> VMResult<Cell> {
        Ok(self.read(Self::index(address)?))
    }

    /// Store `value` at `address`, growing the address space if needed
    pub fn set(&mut self, address: Cell, value: Cell) -> VMResult<()> {
        let index = Self::index(address)?;
        self.write(index, value);
        Ok(())
    }

    /// Read by index
    pub fn read(&self, index: usize) -> Cell {
        if index < DENSE_LIMIT {
            self.dense.get(index).copied().unwrap_or(0)
        } else {
            self.sparse.get(&index).copied().unwrap_or(0)
        }
    }

    /// Write by index
    pub fn write(&mut self, index: usize, value: Cell) {
        if index < DENSE_LIMIT {
            if index >= self.dense.len() {
                self.dense.resize(index + 1, 0);
            }
            self.dense[index] = value;
        } else {
            self.sparse.insert(index, value);
        }
        self.writes += 1;
    }

    /// One past the highest dense address that was seeded or written
    pub fn high_water_mark(&self) -> usize {
        self.dense.len()
    }

    /// Copy of the contiguous memory `0..high_water_mark()`
    pub fn snapshot(&self) -> Vec<Cell> {
        self.dense.clone()
    }

    /// Cells stored beyond the dense region, sorted by address
    pub fn sparse_cells(&self) -> Vec<(usize, Cell)> {
        let mut cells: Vec<(usize, Cell)> = self.sparse.iter().map(|(k, v)| (*k, *v)).collect();
        cells.sort_unstable();
        cells
    }

    /// Number of writes performed through `set`/`write`
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Format the memory as a string for display
    pub fn format_memory(&self) -> String {
        let cells: Vec<String> = self.dense.iter().map(|v| v.to_string()).collect();
        let mut result = format!("Memory[{}]: [{}]", self.dense.len(), cells.join(","));

        for (address, value) in self.sparse_cells() {
            result.push_str(&format!("\n  {}: {}", address, value));
        }

        result
    }
}

impl fmt::Display for VMMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_memory())
    }
}
