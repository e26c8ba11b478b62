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

// reservation_station.rs
//
// This file contains the reservation station slot. A station holds a
// dispatched instruction's operation, its captured operand values (Vj,
// Vk), the ROB tags it is still waiting on (Qj, Qk), and the ROB entry
// its result is destined for.

use std::fmt;

use crate::arch::instructions::{FuPool, Opcode};
use crate::arch::value::Value;

/// One slot in a typed reservation station pool.
#[derive(Debug, Clone)]
pub struct ReservationStation {
    pub name: String,
    pub pool: FuPool,
    pub busy: bool,
    pub op: Option<Opcode>,
    /// First operand value, once captured.
    pub vj: Option<Value>,
    /// Second operand value, once captured.
    pub vk: Option<Value>,
    /// ROB id that will produce the first operand.
    pub qj: Option<usize>,
    /// ROB id that will produce the second operand.
    pub qk: Option<usize>,
    /// ROB entry the result is written to.
    pub dest_rob_id: Option<usize>,
    /// Program index of the resident instruction.
    pub inst_index: Option<usize>,
}

impl ReservationStation {
    pub fn new(name: String, pool: FuPool) -> Self {
        Self {
            name,
            pool,
            busy: false,
            op: None,
            vj: None,
            vk: None,
            qj: None,
            qk: None,
            dest_rob_id: None,
            inst_index: None,
        }
    }

    /// Occupy the station at issue time.
    pub fn issue(
        &mut self,
        op: Opcode,
        inst_index: usize,
        dest_rob_id: usize,
        vj: Option<Value>,
        vk: Option<Value>,
        qj: Option<usize>,
        qk: Option<usize>,
    ) {
        self.busy = true;
        self.op = Some(op);
        self.vj = vj;
        self.vk = vk;
        self.qj = qj;
        self.qk = qk;
        self.dest_rob_id = Some(dest_rob_id);
        self.inst_index = Some(inst_index);
    }

    /// Apply a CDB broadcast: any operand waiting on `rob_id` captures
    /// `value`.
    pub fn capture(&mut self, rob_id: usize, value: Value) {
        if self.qj == Some(rob_id) {
            self.vj = Some(value);
            self.qj = None;
        }
        if self.qk == Some(rob_id) {
            self.vk = Some(value);
            self.qk = None;
        }
    }

    /// True when no operand is still pending on the CDB.
    pub fn operands_ready(&self) -> bool {
        self.qj.is_none() && self.qk.is_none()
    }

    pub fn is_clear(&self) -> bool {
        !self.busy
    }

    pub fn clear(&mut self) {
        self.busy = false;
        self.op = None;
        self.vj = None;
        self.vk = None;
        self.qj = None;
        self.qk = None;
        self.dest_rob_id = None;
        self.inst_index = None;
    }
}

impl fmt::Display for ReservationStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value.as_ref().map_or_else(|| "-".to_string(), |v| v.to_string())
        }
        write!(
            f,
            "Name:{} Busy:{} Op:{} Vj:{} Vk:{} Qj:{} Qk:{} Dest_ROB:{}",
            self.name,
            self.busy,
            opt(&self.op),
            opt(&self.vj),
            opt(&self.vk),
            opt(&self.qj),
            opt(&self.qk),
            opt(&self.dest_rob_id),
        )
    }
}
