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

// registers.rs
//
// This file contains the renaming register file. Each register carries an
// architectural value plus the rename tag of the reorder buffer entry
// that will produce its next value, if any. Registers are created lazily
// as programs and seeds mention them.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::arch::value::Value;

/// A single named register.
#[derive(Debug, Clone)]
pub struct Register {
    pub name: String,
    pub value: Value,
    /// True while an in-flight instruction will produce this register's
    /// next value.
    pub busy: bool,
    /// ROB id of the youngest in-flight producer.
    pub reorder_tag: Option<usize>,
}

impl Register {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: Value::Int(0),
            busy: false,
            reorder_tag: None,
        }
    }

    /// Drop the rename state, leaving the architectural value in place.
    pub fn clear_rename(&mut self) {
        self.busy = false;
        self.reorder_tag = None;
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Val={}, ROB={}, Busy={}",
            self.name,
            self.value,
            self.reorder_tag.map_or_else(|| "-".to_string(), |t| t.to_string()),
            self.busy
        )
    }
}

/// The name-keyed register file.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    registers: HashMap<String, Register>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self {
            registers: HashMap::new(),
        }
    }

    /// Look up a register, creating it (value 0, not busy) on first use.
    pub fn ensure(&mut self, name: &str) -> &mut Register {
        self.registers
            .entry(name.to_string())
            .or_insert_with(|| Register::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&Register> {
        self.registers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Register> {
        self.registers.get_mut(name)
    }

    /// Current architectural value; absent registers read as 0.
    pub fn read(&self, name: &str) -> Value {
        self.registers.get(name).map_or(Value::Int(0), |r| r.value)
    }

    /// Point the register at the ROB entry that will produce its next
    /// value. Overwrites any earlier tag: the youngest rename wins.
    pub fn rename(&mut self, name: &str, rob_id: usize) {
        let reg = self.ensure(name);
        reg.busy = true;
        reg.reorder_tag = Some(rob_id);
    }

    /// Misprediction recovery: drop the rename state of every register
    /// whose tag is unset or refers to a flushed ROB entry, and pin R0
    /// back to 0.
    pub fn clear_speculative(&mut self, flushed: &HashSet<usize>) {
        for reg in self.registers.values_mut() {
            match reg.reorder_tag {
                None => reg.clear_rename(),
                Some(tag) if flushed.contains(&tag) => reg.clear_rename(),
                Some(_) => {},
            }
        }
        let r0 = self.ensure("R0");
        r0.value = Value::Int(0);
        r0.clear_rename();
    }

    /// Registers ordered by name, for display and deterministic
    /// comparison.
    pub fn sorted(&self) -> Vec<&Register> {
        let mut regs: Vec<&Register> = self.registers.values().collect();
        regs.sort_by(|a, b| a.name.cmp(&b.name));
        regs
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.registers.values()
    }

    pub fn clear(&mut self) {
        self.registers.clear();
    }
}
