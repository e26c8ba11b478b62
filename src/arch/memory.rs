// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// memory.rs
//
// This file contains the memory model for the simulator: a sparse,
// word-addressable map where untouched cells read as zero.

use std::collections::HashMap;

/// Sparse word-addressable memory.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    cells: HashMap<i64, i64>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
        }
    }

    /// Read one word. Unwritten addresses return 0.
    pub fn read(&self, address: i64) -> i64 {
        self.cells.get(&address).copied().unwrap_or(0)
    }

    pub fn write(&mut self, address: i64, value: i64) {
        self.cells.insert(address, value);
    }

    /// All written cells ordered by address, for display and comparison.
    pub fn cells_sorted(&self) -> Vec<(i64, i64)> {
        let mut cells: Vec<(i64, i64)> = self.cells.iter().map(|(&a, &v)| (a, v)).collect();
        cells.sort_by_key(|&(a, _)| a);
        cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
