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

// instructions.rs
//
// This file defines the recognized instruction set: opcodes with their
// execution latencies and functional unit pools, and the decoded
// Instruction record that the pipeline stages stamp as it moves through
// Issue, Execute, Write Result, and Commit.

use std::fmt;

/// A recognized opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Add,
    Sub,
    Or,
    And,
    Slli,
    Srli,
    Mul,
    Div,
    Lw,
    Lb,
    Sw,
    Sb,
    Beq,
    Bne,
}

/// Broad classification of an instruction, recorded in its ROB entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstKind {
    Alu,
    Load,
    Store,
    Branch,
}

/// The functional unit pool an opcode executes on. Each pool starts at
/// most one new execution per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuPool {
    Mem,
    Add,
    Logic,
    Mul,
}

impl Opcode {
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        match mnemonic.to_ascii_uppercase().as_str() {
            "ADD" => Some(Opcode::Add),
            "SUB" => Some(Opcode::Sub),
            "OR" => Some(Opcode::Or),
            "AND" => Some(Opcode::And),
            "SLLI" => Some(Opcode::Slli),
            "SRLI" => Some(Opcode::Srli),
            "MUL" => Some(Opcode::Mul),
            "DIV" => Some(Opcode::Div),
            "LW" => Some(Opcode::Lw),
            "LB" => Some(Opcode::Lb),
            "SW" => Some(Opcode::Sw),
            "SB" => Some(Opcode::Sb),
            "BEQ" => Some(Opcode::Beq),
            "BNE" => Some(Opcode::Bne),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Or => "OR",
            Opcode::And => "AND",
            Opcode::Slli => "SLLI",
            Opcode::Srli => "SRLI",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Lw => "LW",
            Opcode::Lb => "LB",
            Opcode::Sw => "SW",
            Opcode::Sb => "SB",
            Opcode::Beq => "BEQ",
            Opcode::Bne => "BNE",
        }
    }

    /// Cycles spent in the functional unit once operands are available.
    pub fn latency(self) -> usize {
        match self {
            Opcode::Add | Opcode::Sub => 2,
            Opcode::Or | Opcode::And | Opcode::Slli | Opcode::Srli => 1,
            Opcode::Mul | Opcode::Div => 3,
            Opcode::Lw | Opcode::Lb | Opcode::Sw | Opcode::Sb => 5,
            Opcode::Beq | Opcode::Bne => 1,
        }
    }

    pub fn kind(self) -> InstKind {
        match self {
            Opcode::Lw | Opcode::Lb => InstKind::Load,
            Opcode::Sw | Opcode::Sb => InstKind::Store,
            Opcode::Beq | Opcode::Bne => InstKind::Branch,
            _ => InstKind::Alu,
        }
    }

    pub fn pool(self) -> FuPool {
        match self {
            Opcode::Lw | Opcode::Lb | Opcode::Sw | Opcode::Sb => FuPool::Mem,
            Opcode::Add | Opcode::Sub => FuPool::Add,
            Opcode::Mul | Opcode::Div => FuPool::Mul,
            Opcode::Or | Opcode::And | Opcode::Slli | Opcode::Srli | Opcode::Beq | Opcode::Bne => {
                FuPool::Logic
            },
        }
    }

    pub fn is_store(self) -> bool {
        self.kind() == InstKind::Store
    }

    pub fn is_branch(self) -> bool {
        self.kind() == InstKind::Branch
    }

    /// True for instructions that rename a destination register at issue
    /// (everything except stores and branches).
    pub fn writes_register(self) -> bool {
        !self.is_store() && !self.is_branch()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

impl fmt::Display for InstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstKind::Alu => write!(f, "ALU"),
            InstKind::Load => write!(f, "LOAD"),
            InstKind::Store => write!(f, "STORE"),
            InstKind::Branch => write!(f, "BRANCH"),
        }
    }
}

impl FuPool {
    /// Prefix used when naming the reservation stations of this pool.
    pub fn station_prefix(self) -> &'static str {
        match self {
            FuPool::Mem => "MEM",
            FuPool::Add => "ADD",
            FuPool::Logic => "LOG",
            FuPool::Mul => "MUL",
        }
    }
}

impl fmt::Display for FuPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuPool::Mem => write!(f, "MEM"),
            FuPool::Add => write!(f, "ADD"),
            FuPool::Logic => write!(f, "LOGIC"),
            FuPool::Mul => write!(f, "MUL"),
        }
    }
}

/// A decoded instruction together with its pipeline progress.
///
/// The program vector owns every instruction; reservation stations and
/// reorder buffer entries refer to one by its program index. The stages
/// stamp the cycle at which the instruction entered them.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Destination register (ALU ops and loads).
    pub dest: Option<String>,
    /// First source register: base register for memory ops, first operand
    /// otherwise.
    pub src1: Option<String>,
    /// Second source register: the value to store for SW/SB, second
    /// operand for R-type and branches.
    pub src2: Option<String>,
    /// Shift amount for SLLI/SRLI.
    pub immediate: Option<i64>,
    /// Memory offset for loads/stores, absolute program index for branches.
    pub offset: Option<i64>,

    pub exec_cycles_remaining: usize,
    pub ready_to_write: bool,

    pub issue_cycle: Option<usize>,
    pub execute_start_cycle: Option<usize>,
    pub write_result_cycle: Option<usize>,
    pub commit_cycle: Option<usize>,
}

impl Instruction {
    fn with_opcode(opcode: Opcode) -> Self {
        Self {
            opcode,
            dest: None,
            src1: None,
            src2: None,
            immediate: None,
            offset: None,
            exec_cycles_remaining: opcode.latency(),
            ready_to_write: false,
            issue_cycle: None,
            execute_start_cycle: None,
            write_result_cycle: None,
            commit_cycle: None,
        }
    }

    /// `OP rd, rs1, rs2` for ADD, SUB, OR, AND, MUL, DIV.
    pub fn r_type(opcode: Opcode, rd: &str, rs1: &str, rs2: &str) -> Self {
        let mut inst = Self::with_opcode(opcode);
        inst.dest = Some(rd.to_string());
        inst.src1 = Some(rs1.to_string());
        inst.src2 = Some(rs2.to_string());
        inst
    }

    /// `OP rd, rs1, imm` for SLLI, SRLI.
    pub fn shift(opcode: Opcode, rd: &str, rs1: &str, imm: i64) -> Self {
        let mut inst = Self::with_opcode(opcode);
        inst.dest = Some(rd.to_string());
        inst.src1 = Some(rs1.to_string());
        inst.immediate = Some(imm);
        inst
    }

    /// `OP rd, base, offset` for LW, LB.
    pub fn load(opcode: Opcode, rd: &str, base: &str, offset: i64) -> Self {
        let mut inst = Self::with_opcode(opcode);
        inst.dest = Some(rd.to_string());
        inst.src1 = Some(base.to_string());
        inst.offset = Some(offset);
        inst
    }

    /// `OP src, base, offset` for SW, SB. `src` holds the value to store.
    pub fn store(opcode: Opcode, src: &str, base: &str, offset: i64) -> Self {
        let mut inst = Self::with_opcode(opcode);
        inst.src2 = Some(src.to_string());
        inst.src1 = Some(base.to_string());
        inst.offset = Some(offset);
        inst
    }

    /// `OP rs1, rs2, target` for BEQ, BNE. `target` is an absolute 0-based
    /// program index.
    pub fn branch(opcode: Opcode, rs1: &str, rs2: &str, target: i64) -> Self {
        let mut inst = Self::with_opcode(opcode);
        inst.src1 = Some(rs1.to_string());
        inst.src2 = Some(rs2.to_string());
        inst.offset = Some(target);
        inst
    }

    /// Every register name the instruction mentions.
    pub fn register_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(name) = self.dest.as_deref() {
            names.push(name);
        }
        if let Some(name) = self.src1.as_deref() {
            names.push(name);
        }
        if let Some(name) = self.src2.as_deref() {
            names.push(name);
        }
        names
    }

    /// Forget all pipeline progress so the instruction can be issued again
    /// after a misprediction flush discarded it.
    pub fn reset_progress(&mut self) {
        self.exec_cycles_remaining = self.opcode.latency();
        self.ready_to_write = false;
        self.issue_cycle = None;
        self.execute_start_cycle = None;
        self.write_result_cycle = None;
        self.commit_cycle = None;
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dest = self.dest.as_deref().unwrap_or("?");
        let src1 = self.src1.as_deref().unwrap_or("?");
        let src2 = self.src2.as_deref().unwrap_or("?");
        match self.opcode {
            Opcode::Slli | Opcode::Srli => {
                write!(f, "{} {}, {}, {}", self.opcode, dest, src1, self.immediate.unwrap_or(0))
            },
            Opcode::Lw | Opcode::Lb => {
                write!(f, "{} {}, {}, {}", self.opcode, dest, src1, self.offset.unwrap_or(0))
            },
            Opcode::Sw | Opcode::Sb => {
                write!(f, "{} {}, {}, {}", self.opcode, src2, src1, self.offset.unwrap_or(0))
            },
            Opcode::Beq | Opcode::Bne => {
                write!(f, "{} {}, {}, {}", self.opcode, src1, src2, self.offset.unwrap_or(0))
            },
            _ => write!(f, "{} {}, {}, {}", self.opcode, dest, src1, src2),
        }
    }
}
