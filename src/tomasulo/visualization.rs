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

// visualization.rs
//
// This file renders the simulator's state tables for per-cycle tracing:
// the program listing with the PC line highlighted, the reorder buffer,
// the reservation stations, the register file, and memory.

use colored::Colorize;

use crate::tomasulo::simulator::Simulator;

#[derive(Debug, Clone)]
pub struct StateVisualization {
    pub show_program: bool,
    pub show_memory: bool,
    pub colorize_output: bool,
}

impl Default for StateVisualization {
    fn default() -> Self {
        Self::new()
    }
}

impl StateVisualization {
    pub fn new() -> Self {
        Self {
            show_program: true,
            show_memory: true,
            colorize_output: true,
        }
    }

    /// Render every state table for the simulator's current cycle.
    pub fn render(&self, simulator: &Simulator) -> String {
        let mut result = String::new();

        result.push_str(&format!("=== Cycle {} ===\n", simulator.current_cycle));

        if self.show_program {
            result.push_str("\n--- Program ---\n");
            for (idx, inst) in simulator.program.iter().enumerate() {
                let marker = if idx == simulator.pc { "->" } else { "  " };
                let line = format!("{} [{}]: {}", marker, idx, inst);
                if self.colorize_output && idx == simulator.pc {
                    result.push_str(&format!("{}\n", line.yellow()));
                } else {
                    result.push_str(&line);
                    result.push('\n');
                }
            }
        }

        result.push_str("\n--- Reorder Buffer ---\n");
        result.push_str(&format!(
            "{:<4} {:<5} {:<22} {:<15} {:<14} {:<18} {:<7} {:<10} {:<10}\n",
            "ID", "Busy", "Instruction", "State", "Dest", "Value", "Type", "Predicted", "Actual"
        ));
        for entry in &simulator.rob.entries {
            let head_marker = if entry.id == simulator.rob.head { "*" } else { "" };
            let inst = entry
                .inst_index
                .map_or(String::new(), |i| simulator.program[i].to_string());
            result.push_str(&format!(
                "{:<4} {:<5} {:<22} {:<15} {:<14} {:<18} {:<7} {:<10} {:<10}\n",
                format!("{}{}", entry.id, head_marker),
                entry.busy,
                inst,
                opt_string(&entry.state),
                opt_string(&entry.dest),
                opt_string(&entry.value),
                opt_string(&entry.kind),
                opt_string(&entry.predicted_taken),
                opt_string(&entry.actual_taken),
            ));
        }

        result.push_str("\n--- Reservation Stations ---\n");
        result.push_str(&format!(
            "{:<6} {:<5} {:<6} {:<18} {:<18} {:<4} {:<4} {:<8}\n",
            "Name", "Busy", "Op", "Vj", "Vk", "Qj", "Qk", "Dest ROB"
        ));
        for rs in &simulator.reservation_stations {
            result.push_str(&format!(
                "{:<6} {:<5} {:<6} {:<18} {:<18} {:<4} {:<4} {:<8}\n",
                rs.name,
                rs.busy,
                opt_string(&rs.op),
                opt_string(&rs.vj),
                opt_string(&rs.vk),
                opt_string(&rs.qj),
                opt_string(&rs.qk),
                opt_string(&rs.dest_rob_id),
            ));
        }

        result.push_str("\n--- Register File ---\n");
        result.push_str(&format!(
            "{:<10} {:<18} {:<8} {:<5}\n",
            "Register", "Value", "ROB Tag", "Busy"
        ));
        for reg in simulator.register_file.sorted() {
            result.push_str(&format!(
                "{:<10} {:<18} {:<8} {:<5}\n",
                reg.name,
                reg.value.to_string(),
                opt_string(&reg.reorder_tag),
                reg.busy,
            ));
        }

        if self.show_memory {
            result.push_str("\n--- Memory ---\n");
            let cells = simulator.memory.cells_sorted();
            if cells.is_empty() {
                result.push_str("(empty)\n");
            } else {
                for (address, value) in cells {
                    result.push_str(&format!("mem[{}] = {}\n", address, value));
                }
            }
        }

        result.push_str(&format!("\n{}\n", simulator.metrics()));
        result
    }
}

fn opt_string<T: std::fmt::Display>(value: &Option<T>) -> String {
    value.as_ref().map_or(String::new(), |v| v.to_string())
}
