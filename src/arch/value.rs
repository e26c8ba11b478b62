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

// value.rs
//
// This file defines the values that travel through the pipeline: register
// contents, reservation station operands, CDB broadcasts, and reorder
// buffer results. Non-numeric results (store completion, branch
// resolution, divide-by-zero) stay in-band as markers.

use std::fmt;

/// A value held in a register, a reservation station operand slot, or a
/// reorder buffer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// An ordinary integer word.
    Int(i64),
    /// Sentinel produced by DIV when the divisor is zero. Broadcast and
    /// committed like any other value.
    DivByZero,
    /// Marker recorded once a store has updated memory.
    MemStored,
    /// Marker recorded once a branch outcome is known.
    BranchResolved,
}

impl Value {
    /// The integer interpretation of this value. Markers coerce to 0.
    pub fn as_int(self) -> i64 {
        match self {
            Value::Int(v) => v,
            _ => 0,
        }
    }

    pub fn is_int(self) -> bool {
        matches!(self, Value::Int(_))
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::DivByZero => write!(f, "DIV_BY_ZERO_ERROR"),
            Value::MemStored => write!(f, "MEM_STORED"),
            Value::BranchResolved => write!(f, "BRANCH_EVALUATED"),
        }
    }
}
