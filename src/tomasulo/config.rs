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

// config.rs
//
// This file contains the construction parameters of the simulator: how
// many reservation stations each functional unit pool carries and how
// large the reorder buffer is.

/// Sizing of the reservation station pools and the reorder buffer.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Load/store stations (MEM pool).
    pub num_mem_stations: usize,
    /// ADD/SUB stations (ADD pool).
    pub num_add_stations: usize,
    /// Logic/shift/branch stations (LOGIC pool).
    pub num_logic_stations: usize,
    /// MUL/DIV stations (MUL pool).
    pub num_mul_stations: usize,
    /// Number of reorder buffer entries.
    pub rob_size: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            num_mem_stations: 2,
            num_add_stations: 3,
            num_logic_stations: 2,
            num_mul_stations: 1,
            rob_size: 8,
        }
    }
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mem_stations(mut self, num: usize) -> Self {
        self.num_mem_stations = num;
        self
    }

    pub fn with_add_stations(mut self, num: usize) -> Self {
        self.num_add_stations = num;
        self
    }

    pub fn with_logic_stations(mut self, num: usize) -> Self {
        self.num_logic_stations = num;
        self
    }

    pub fn with_mul_stations(mut self, num: usize) -> Self {
        self.num_mul_stations = num;
        self
    }

    pub fn with_rob_size(mut self, size: usize) -> Self {
        assert!(size > 0, "ROB size must be positive");
        self.rob_size = size;
        self
    }
}
