// simulator.rs - Tomasulo's Algorithm with a reorder buffer
//
// The simulator drives four pipeline stages over a discrete clock:
//   - Issue: program-order dispatch into a reservation station + ROB entry,
//     with register renaming (youngest rename wins)
//   - Execute: per-pool functional units, one new start per pool per cycle
//   - Write Result: a single common data bus, one broadcast per cycle
//   - Commit: in-order retirement from the ROB head, two cycles per
//     instruction, with speculative flush on branch misprediction
//
// Stages run in reverse pipeline order within a tick so that each stage
// sees the previous cycle's outputs.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::arch::instructions::{FuPool, InstKind, Instruction, Opcode};
use crate::arch::memory::Memory;
use crate::arch::registers::RegisterFile;
use crate::arch::value::Value;
use crate::errors::SimulatorError;
use crate::tomasulo::config::SimulatorConfig;
use crate::tomasulo::reorder_buffer::{
    BranchOutcome, ReorderBuffer, ReorderBufferEntry, RobDest, RobState,
};
use crate::tomasulo::reservation_station::ReservationStation;
use crate::utils::parser;

/// The cycle-accurate out-of-order simulator.
///
/// All microarchitectural state is owned here; the fields are public so
/// hosts (CLI, tests, visualization) can inspect them between ticks.
pub struct Simulator {
    pub config: SimulatorConfig,
    /// The loaded program. Reservation stations and ROB entries refer to
    /// instructions by index into this vector.
    pub program: Vec<Instruction>,
    pub register_file: RegisterFile,
    pub memory: Memory,
    pub reservation_stations: Vec<ReservationStation>,
    pub rob: ReorderBuffer,
    /// Index of the next instruction to issue.
    pub pc: usize,
    pub current_cycle: usize,
    pub committed_count: usize,
    pub bubble_count: usize,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulatorConfig::default())
    }
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let mut stations = Vec::new();
        let pools = [
            (FuPool::Mem, config.num_mem_stations),
            (FuPool::Add, config.num_add_stations),
            (FuPool::Logic, config.num_logic_stations),
            (FuPool::Mul, config.num_mul_stations),
        ];
        for (pool, count) in pools {
            for i in 0..count {
                let name = format!("{}{}", pool.station_prefix(), i + 1);
                stations.push(ReservationStation::new(name, pool));
            }
        }

        Self {
            rob: ReorderBuffer::new(config.rob_size),
            config,
            program: Vec::new(),
            register_file: RegisterFile::new(),
            memory: Memory::new(),
            reservation_stations: stations,
            pc: 0,
            current_cycle: 0,
            committed_count: 0,
            bubble_count: 0,
        }
    }

    /// Parse and load a program file. Unrecognized lines are skipped with
    /// a warning; a missing file surfaces as an initialization error.
    pub fn load_program_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, SimulatorError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                SimulatorError::ProgramNotFound(path.display().to_string())
            } else {
                SimulatorError::IoError(err)
            }
        })?;
        let program = parser::parse_program(&source);
        self.load_program(program);
        Ok(self.program.len())
    }

    /// Install a parsed program, resetting all simulator state. Register
    /// and memory seeds are applied afterwards by the host.
    pub fn load_program(&mut self, program: Vec<Instruction>) {
        self.reset();
        for inst in &program {
            for name in inst.register_names() {
                let _ = self.register_file.ensure(name);
            }
        }
        self.program = program;
    }

    /// Host-supplied initial register valuation.
    pub fn seed_register(&mut self, name: &str, value: i64) {
        let reg = self.register_file.ensure(name);
        reg.value = Value::Int(value);
        reg.clear_rename();
    }

    /// Host-supplied initial memory cell.
    pub fn seed_memory(&mut self, address: i64, value: i64) {
        self.memory.write(address, value);
    }

    /// Return the simulator to its post-construction state. Reloading the
    /// same program and seeds afterwards reproduces the original run.
    pub fn reset(&mut self) {
        self.program.clear();
        self.register_file.clear();
        self.memory.clear();
        for rs in &mut self.reservation_stations {
            rs.clear();
        }
        self.rob.clear_all();
        self.pc = 0;
        self.current_cycle = 0;
        self.committed_count = 0;
        self.bubble_count = 0;
    }

    /// Advance the clock by one cycle. Stages run in reverse pipeline
    /// order so each reads the previous cycle's outputs.
    pub fn tick(&mut self) {
        self.current_cycle += 1;

        let committed = self.commit_stage();
        self.write_result_stage();
        self.execute_stage();
        let issued = self.issue_stage();

        if !issued && !committed && !self.is_finished() {
            self.bubble_count += 1;
        }
    }

    /// All instructions issued and the ROB drained.
    pub fn is_finished(&self) -> bool {
        self.pc >= self.program.len() && self.rob.is_empty()
    }

    /// Tick until finished or `max_cycles` elapse; returns the number of
    /// cycles executed.
    pub fn run(&mut self, max_cycles: usize) -> usize {
        let mut executed = 0;
        while !self.is_finished() && executed < max_cycles {
            self.tick();
            executed += 1;
        }
        executed
    }

    pub fn metrics(&self) -> Metrics {
        let ipc = if self.current_cycle > 0 {
            self.committed_count as f64 / self.current_cycle as f64
        } else {
            0.0
        };
        Metrics {
            total_cycles: self.current_cycle,
            committed_instructions: self.committed_count,
            ipc,
            bubble_cycles: self.bubble_count,
            program_counter: self.pc,
            rob_head: self.rob.head,
            rob_tail: self.rob.tail,
        }
    }

    // --- Issue ---------------------------------------------------------

    /// Dispatch at most one instruction, in program order. Requires a free
    /// ROB tail slot and a free reservation station of the matching pool;
    /// otherwise the cycle becomes a structural stall.
    fn issue_stage(&mut self) -> bool {
        if self.pc >= self.program.len() {
            return false;
        }
        if self.rob.is_full() {
            return false;
        }
        let opcode = self.program[self.pc].opcode;
        let Some(rs_idx) = self.find_free_station(opcode.pool()) else {
            return false;
        };

        let inst_index = self.pc;
        let rob_id = self.rob.tail;
        let inst = self.program[inst_index].clone();

        // Capture operands before touching any rename state.
        let (vj, qj) = match inst.src1.as_deref() {
            Some(name) => self.resolve_operand(name),
            None => (None, None),
        };
        let (vk, qk) = match opcode {
            // Shift amount comes from the immediate, not a register.
            Opcode::Slli | Opcode::Srli => (inst.immediate.map(Value::Int), None),
            // Loads are single-source: base register plus numeric offset.
            Opcode::Lw | Opcode::Lb => (None, None),
            _ => match inst.src2.as_deref() {
                Some(name) => self.resolve_operand(name),
                None => (None, None),
            },
        };

        let kind = opcode.kind();
        let dest = if opcode.is_store() {
            inst.src1.clone().map(|base| RobDest::Memory {
                base,
                offset: inst.offset.unwrap_or(0),
            })
        } else if opcode.is_branch() {
            None
        } else {
            inst.dest.clone().map(RobDest::Register)
        };

        self.rob.entries[rob_id].issue(inst_index, kind, dest, inst.offset);
        self.reservation_stations[rs_idx].issue(opcode, inst_index, rob_id, vj, vk, qj, qk);

        // Rename the destination register; the youngest rename wins.
        if opcode.writes_register() {
            if let Some(rd) = inst.dest.as_deref() {
                self.register_file.rename(rd, rob_id);
            }
        }

        self.program[inst_index].issue_cycle = Some(self.current_cycle);
        self.pc += 1;
        self.rob.advance_tail();
        true
    }

    /// Resolve one source register into either a captured value or the
    /// ROB tag to wait on. A busy register whose producer has already
    /// broadcast is read straight from the producer's ROB entry.
    fn resolve_operand(&self, name: &str) -> (Option<Value>, Option<usize>) {
        let Some(reg) = self.register_file.get(name) else {
            return (Some(Value::Int(0)), None);
        };
        if reg.busy {
            if let Some(tag) = reg.reorder_tag {
                let producer = &self.rob.entries[tag];
                // Once the producer has broadcast (Write Result, or already
                // in its Commit cycle) the CDB will not fire again for it;
                // the value must be captured directly.
                if matches!(
                    producer.state,
                    Some(RobState::WriteResult) | Some(RobState::Commit)
                ) {
                    if let Some(value) = producer.value {
                        return (Some(value), None);
                    }
                }
                return (None, Some(tag));
            }
        }
        (Some(reg.value), None)
    }

    fn find_free_station(&self, pool: FuPool) -> Option<usize> {
        self.reservation_stations
            .iter()
            .position(|rs| rs.is_clear() && rs.pool == pool)
    }

    // --- Execute -------------------------------------------------------

    /// Advance every in-flight execution by one cycle, then start at most
    /// one new execution per functional unit pool, oldest ROB id first.
    fn execute_stage(&mut self) {
        let mut in_flight: Vec<usize> = Vec::new();
        let mut ready: Vec<(usize, usize, usize)> = Vec::new(); // (rob_id, rs_idx, inst_index)

        for (rs_idx, rs) in self.reservation_stations.iter().enumerate() {
            if !rs.busy {
                continue;
            }
            let (Some(rob_id), Some(inst_index)) = (rs.dest_rob_id, rs.inst_index) else {
                continue;
            };
            if !self.rob.entries[rob_id].busy {
                continue;
            }
            let inst = &self.program[inst_index];
            if inst.ready_to_write {
                continue;
            }
            if inst.execute_start_cycle.is_some() {
                in_flight.push(rs_idx);
            } else if rs.operands_ready() {
                ready.push((rob_id, rs_idx, inst_index));
            }
        }

        for rs_idx in in_flight {
            self.advance_execution(rs_idx);
        }

        ready.sort_by_key(|&(rob_id, _, _)| rob_id);
        let mut started_pools: HashSet<FuPool> = HashSet::new();
        for (rob_id, rs_idx, inst_index) in ready {
            let pool = self.reservation_stations[rs_idx].pool;
            if !started_pools.insert(pool) {
                continue; // this pool already started an execution this cycle
            }
            self.program[inst_index].execute_start_cycle = Some(self.current_cycle);
            self.rob.entries[rob_id].state = Some(RobState::Executing);
            self.advance_execution(rs_idx);
        }
    }

    /// Burn one execution cycle in the given station; on completion,
    /// compute the result and mark the ROB entry ready to write.
    fn advance_execution(&mut self, rs_idx: usize) {
        let (Some(inst_index), Some(rob_id)) = (
            self.reservation_stations[rs_idx].inst_index,
            self.reservation_stations[rs_idx].dest_rob_id,
        ) else {
            return;
        };

        {
            let inst = &mut self.program[inst_index];
            if inst.exec_cycles_remaining > 0 {
                inst.exec_cycles_remaining -= 1;
            }
            if inst.exec_cycles_remaining > 0 {
                return;
            }
            inst.ready_to_write = true;
        }

        let value = self.compute_result(rs_idx, inst_index, rob_id);
        let entry = &mut self.rob.entries[rob_id];
        entry.state = Some(RobState::ReadyToWrite);
        entry.value = Some(value);
    }

    /// Produce the result for a completed execution. Stores update memory
    /// here, at execute completion; branches record their actual outcome
    /// in the ROB entry.
    fn compute_result(&mut self, rs_idx: usize, inst_index: usize, rob_id: usize) -> Value {
        let rs = &self.reservation_stations[rs_idx];
        let vj = rs.vj.map_or(0, Value::as_int);
        let vk = rs.vk.map_or(0, Value::as_int);
        let Some(op) = rs.op else {
            return Value::Int(0);
        };
        let offset = self.program[inst_index].offset.unwrap_or(0);

        match op {
            Opcode::Add => Value::Int(vj.wrapping_add(vk)),
            Opcode::Sub => Value::Int(vj.wrapping_sub(vk)),
            Opcode::Or => Value::Int(vj | vk),
            Opcode::And => Value::Int(vj & vk),
            Opcode::Mul => Value::Int(vj.wrapping_mul(vk)),
            Opcode::Div => {
                if vk == 0 {
                    Value::DivByZero
                } else {
                    Value::Int(vj.wrapping_div(vk))
                }
            },
            Opcode::Slli => Value::Int(vj.wrapping_shl(vk as u32)),
            Opcode::Srli => Value::Int(((vj as u64).wrapping_shr(vk as u32)) as i64),
            Opcode::Lw | Opcode::Lb => Value::Int(self.memory.read(vj.wrapping_add(offset))),
            Opcode::Sw | Opcode::Sb => {
                self.memory.write(vj.wrapping_add(offset), vk);
                Value::MemStored
            },
            Opcode::Beq | Opcode::Bne => {
                let taken = if op == Opcode::Beq { vj == vk } else { vj != vk };
                self.rob.entries[rob_id].actual_taken = Some(if taken {
                    BranchOutcome::Taken
                } else {
                    BranchOutcome::NotTaken
                });
                Value::BranchResolved
            },
        }
    }

    // --- Write Result --------------------------------------------------

    /// Broadcast at most one completed result per cycle on the common
    /// data bus, smallest ROB id first. Waiting stations capture the
    /// value; the producing station is freed.
    fn write_result_stage(&mut self) {
        let candidate = self
            .rob
            .entries
            .iter()
            .filter(|e| e.busy && e.state == Some(RobState::ReadyToWrite))
            .filter(|e| {
                e.inst_index
                    .map_or(false, |i| self.program[i].write_result_cycle.is_none())
            })
            .map(|e| e.id)
            .min();
        let Some(rob_id) = candidate else {
            return;
        };

        let value = self.rob.entries[rob_id].value.unwrap_or_default();
        self.rob.entries[rob_id].state = Some(RobState::WriteResult);
        if let Some(inst_index) = self.rob.entries[rob_id].inst_index {
            self.program[inst_index].write_result_cycle = Some(self.current_cycle);
        }

        for rs in &mut self.reservation_stations {
            if rs.busy {
                rs.capture(rob_id, value);
            }
        }

        for rs in &mut self.reservation_stations {
            if rs.busy && rs.dest_rob_id == Some(rob_id) {
                rs.clear();
                break;
            }
        }
    }

    // --- Commit --------------------------------------------------------

    /// Run one of the two commit sub-transitions on the ROB head: enter
    /// the visible Commit state, or (one cycle later) retire. Returns
    /// whether the stage made progress.
    fn commit_stage(&mut self) -> bool {
        let head = self.rob.head;
        let (busy, state, inst_index) = {
            let entry = &self.rob.entries[head];
            (entry.busy, entry.state, entry.inst_index)
        };
        if !busy {
            return false;
        }
        let commit_cycle = inst_index.and_then(|i| self.program[i].commit_cycle);

        match state {
            Some(RobState::WriteResult) if commit_cycle.is_none() => {
                self.rob.entries[head].state = Some(RobState::Commit);
                if let Some(inst_index) = self.rob.entries[head].inst_index {
                    self.program[inst_index].commit_cycle = Some(self.current_cycle);
                }
                true
            },
            Some(RobState::Commit) if commit_cycle == Some(self.current_cycle - 1) => {
                self.retire_head();
                true
            },
            _ => false,
        }
    }

    /// Retire the ROB head: update architectural state, detect branch
    /// mispredictions, and free the entry.
    fn retire_head(&mut self) {
        let head = self.rob.head;
        let entry = self.rob.entries[head].clone();
        let mispredicted = entry.is_branch && entry.predicted_taken != entry.actual_taken;

        match entry.kind {
            Some(InstKind::Alu) | Some(InstKind::Load) => {
                if let Some(RobDest::Register(ref name)) = entry.dest {
                    if let Some(reg) = self.register_file.get_mut(name) {
                        // A younger instruction may have re-renamed the
                        // register since issue; only the youngest producer
                        // writes back.
                        if reg.reorder_tag == Some(entry.id) {
                            reg.value = entry.value.unwrap_or_default();
                            reg.clear_rename();
                        }
                    }
                }
            },
            // Memory was already written at execute completion.
            Some(InstKind::Store) => {},
            Some(InstKind::Branch) => {
                if mispredicted {
                    self.recover_from_misprediction(&entry);
                }
            },
            None => {},
        }

        self.rob.entries[head].clear();
        self.rob.head = self.rob.next_index(head);
        if mispredicted {
            // recovery reset tail to head; the window is now empty
            self.rob.count = 0;
        } else if self.rob.count > 0 {
            self.rob.count -= 1;
        }
        self.committed_count += 1;
    }

    /// Atomically discard all speculative state younger than the
    /// mispredicted branch and redirect the PC.
    fn recover_from_misprediction(&mut self, entry: &ReorderBufferEntry) {
        let taken = entry.actual_taken == Some(BranchOutcome::Taken);
        let resume_pc = if taken {
            entry.target_address.unwrap_or(0).max(0) as usize
        } else {
            entry.inst_index.map_or(self.pc, |i| i + 1)
        };
        debug!(
            "branch misprediction at ROB {}: predicted {:?}, actual {:?}, resuming at {}",
            entry.id, entry.predicted_taken, entry.actual_taken, resume_pc
        );
        self.pc = resume_pc;

        // Walk the ring from head+1 up to tail, clearing every
        // speculatively issued entry.
        let mut flushed: HashSet<usize> = HashSet::new();
        let mut idx = self.rob.next_index(self.rob.head);
        while idx != self.rob.tail {
            if self.rob.entries[idx].busy {
                if let Some(inst_index) = self.rob.entries[idx].inst_index {
                    self.program[inst_index].reset_progress();
                }
                flushed.insert(idx);
                self.rob.entries[idx].clear();
            }
            idx = self.rob.next_index(idx);
        }

        self.register_file.clear_speculative(&flushed);
        for rs in &mut self.reservation_stations {
            rs.clear();
        }
        // After the branch itself retires, head catches up with tail and
        // the window is empty.
        self.rob.tail = self.rob.next_index(self.rob.head);
        self.bubble_count += 1;
    }
}

/// Performance counters exposed after every tick.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub total_cycles: usize,
    pub committed_instructions: usize,
    pub ipc: f64,
    pub bubble_cycles: usize,
    pub program_counter: usize,
    pub rob_head: usize,
    pub rob_tail: usize,
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Statistics:")?;
        writeln!(f, "  Total Cycles: {}", self.total_cycles)?;
        writeln!(f, "  Committed Instructions: {}", self.committed_instructions)?;
        writeln!(f, "  Instructions Per Cycle (IPC): {:.2}", self.ipc)?;
        writeln!(f, "  Bubble Cycles: {}", self.bubble_cycles)?;
        writeln!(f, "  Program Counter (PC): {}", self.program_counter)?;
        write!(f, "  ROB Head/Tail: {}/{}", self.rob_head, self.rob_tail)
    }
}
