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

// reorder_buffer.rs
//
// This file contains the reorder buffer: a fixed-size circular queue that
// enforces in-order commit over out-of-order execution. Entries are
// pre-allocated at construction and cleared in place; head, tail, and
// count are plain indices.

use std::fmt;

use crate::arch::instructions::InstKind;
use crate::arch::value::Value;

/// Pipeline position of a ROB entry's instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobState {
    Issued,
    Executing,
    ReadyToWrite,
    WriteResult,
    Commit,
}

impl fmt::Display for RobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobState::Issued => write!(f, "Issued"),
            RobState::Executing => write!(f, "Executing"),
            RobState::ReadyToWrite => write!(f, "Ready to Write"),
            RobState::WriteResult => write!(f, "Write Result"),
            RobState::Commit => write!(f, "Commit"),
        }
    }
}

/// Where a ROB entry's result retires to.
#[derive(Debug, Clone, PartialEq)]
pub enum RobDest {
    Register(String),
    /// Symbolic store destination; the effective address is computed at
    /// execute time from the base register and offset.
    Memory { base: String, offset: i64 },
}

impl fmt::Display for RobDest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobDest::Register(name) => write!(f, "{}", name),
            RobDest::Memory { base, offset } => write!(f, "Mem[{} + {}]", offset, base),
        }
    }
}

/// Resolved or predicted direction of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchOutcome {
    Taken,
    NotTaken,
}

impl fmt::Display for BranchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchOutcome::Taken => write!(f, "TAKEN"),
            BranchOutcome::NotTaken => write!(f, "NOT_TAKEN"),
        }
    }
}

/// One slot of the reorder buffer.
#[derive(Debug, Clone)]
pub struct ReorderBufferEntry {
    /// Fixed index of this slot; rename tags refer to it.
    pub id: usize,
    pub busy: bool,
    /// Program index of the resident instruction (its program order).
    pub inst_index: Option<usize>,
    pub state: Option<RobState>,
    pub dest: Option<RobDest>,
    pub value: Option<Value>,
    pub kind: Option<InstKind>,
    pub is_branch: bool,
    pub predicted_taken: Option<BranchOutcome>,
    pub actual_taken: Option<BranchOutcome>,
    /// Branch target (absolute program index) or memory offset.
    pub target_address: Option<i64>,
}

impl ReorderBufferEntry {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            busy: false,
            inst_index: None,
            state: None,
            dest: None,
            value: None,
            kind: None,
            is_branch: false,
            predicted_taken: None,
            actual_taken: None,
            target_address: None,
        }
    }

    /// Occupy the entry at issue time. Branches start out predicted
    /// not-taken.
    pub fn issue(
        &mut self,
        inst_index: usize,
        kind: InstKind,
        dest: Option<RobDest>,
        target_address: Option<i64>,
    ) {
        self.busy = true;
        self.inst_index = Some(inst_index);
        self.state = Some(RobState::Issued);
        self.dest = dest;
        self.value = None;
        self.kind = Some(kind);
        self.is_branch = kind == InstKind::Branch;
        self.predicted_taken = if self.is_branch {
            Some(BranchOutcome::NotTaken)
        } else {
            None
        };
        self.actual_taken = None;
        self.target_address = target_address;
    }

    /// Release the slot, keeping its fixed id.
    pub fn clear(&mut self) {
        self.busy = false;
        self.inst_index = None;
        self.state = None;
        self.dest = None;
        self.value = None;
        self.kind = None;
        self.is_branch = false;
        self.predicted_taken = None;
        self.actual_taken = None;
        self.target_address = None;
    }
}

/// The circular reorder buffer window [head, tail).
#[derive(Debug, Clone)]
pub struct ReorderBuffer {
    pub entries: Vec<ReorderBufferEntry>,
    /// Oldest in-flight entry, next to commit.
    pub head: usize,
    /// Next free slot, used at issue.
    pub tail: usize,
    /// Number of busy entries in the window.
    pub count: usize,
}

impl ReorderBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            entries: (0..size).map(ReorderBufferEntry::new).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// The buffer is full when the tail slot is still occupied.
    pub fn is_full(&self) -> bool {
        self.entries[self.tail].busy
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.entries.len()
    }

    pub fn advance_tail(&mut self) {
        self.tail = self.next_index(self.tail);
        self.count += 1;
    }

    pub fn busy_entries(&self) -> impl Iterator<Item = &ReorderBufferEntry> {
        self.entries.iter().filter(|e| e.busy)
    }

    pub fn clear_all(&mut self) {
        for entry in &mut self.entries {
            entry.clear();
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }
}
