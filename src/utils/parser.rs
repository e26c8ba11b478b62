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

// parser.rs
//
// This file contains the program text parser. One instruction per line,
// '#' starts a comment, blank lines are ignored, tokens are whitespace
// separated with optional trailing commas. Lines that do not parse are
// skipped with a warning.

use log::warn;

use crate::arch::instructions::{Instruction, Opcode};

/// Parse a whole program. Unrecognized or malformed lines are skipped
/// with a warning rather than failing the load.
pub fn parse_program(source: &str) -> Vec<Instruction> {
    let mut program = Vec::new();
    for (line_number, raw_line) in source.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some(instruction) => program.push(instruction),
            None => {
                warn!(
                    "Skipping unrecognized instruction on line {}: {}",
                    line_number + 1,
                    line
                );
            },
        }
    }
    program
}

/// Parse a single instruction line. Returns None for unknown opcodes and
/// malformed operand lists.
pub fn parse_line(line: &str) -> Option<Instruction> {
    let tokens: Vec<&str> = line
        .split_whitespace()
        .map(|t| t.trim_end_matches(','))
        .filter(|t| !t.is_empty())
        .collect();
    let (mnemonic, operands) = tokens.split_first()?;
    let opcode = Opcode::from_mnemonic(mnemonic)?;

    match opcode {
        Opcode::Add | Opcode::Sub | Opcode::Or | Opcode::And | Opcode::Mul | Opcode::Div => {
            match operands {
                [rd, rs1, rs2] => Some(Instruction::r_type(opcode, rd, rs1, rs2)),
                _ => None,
            }
        },
        Opcode::Slli | Opcode::Srli => match operands {
            [rd, rs1, imm] => Some(Instruction::shift(opcode, rd, rs1, imm.parse().ok()?)),
            _ => None,
        },
        Opcode::Lw | Opcode::Lb => match operands {
            [rd, base, offset] => Some(Instruction::load(opcode, rd, base, offset.parse().ok()?)),
            _ => None,
        },
        Opcode::Sw | Opcode::Sb => match operands {
            [src, base, offset] => {
                Some(Instruction::store(opcode, src, base, offset.parse().ok()?))
            },
            _ => None,
        },
        Opcode::Beq | Opcode::Bne => match operands {
            [rs1, rs2, target] => {
                Some(Instruction::branch(opcode, rs1, rs2, target.parse().ok()?))
            },
            _ => None,
        },
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(position) => &line[..position],
        None => line,
    }
}
