// tests/property_tests.rs
//
// Property-based checks: the microarchitectural invariants hold after
// every cycle of randomly generated programs, runs are deterministic,
// and pausing/resuming never changes the observable outcome.

use proptest::prelude::*;
use quickcheck::TestResult;
use tomasulo_rust::arch::instructions::{Instruction, Opcode};
use tomasulo_rust::arch::memory::Memory;
use tomasulo_rust::arch::value::Value;
use tomasulo_rust::tomasulo::config::SimulatorConfig;
use tomasulo_rust::tomasulo::reorder_buffer::RobDest;
use tomasulo_rust::tomasulo::simulator::Simulator;
use tomasulo_rust::utils::parser;

const R_TYPE_OPCODES: [Opcode; 6] = [
    Opcode::Add,
    Opcode::Sub,
    Opcode::Or,
    Opcode::And,
    Opcode::Mul,
    Opcode::Div,
];

fn reg_name() -> impl Strategy<Value = String> {
    (0u8..8).prop_map(|i| format!("R{}", i))
}

fn arb_instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        ((0usize..6), reg_name(), reg_name(), reg_name())
            .prop_map(|(op, rd, rs1, rs2)| Instruction::r_type(R_TYPE_OPCODES[op], &rd, &rs1, &rs2)),
        (any::<bool>(), reg_name(), reg_name(), 0i64..8).prop_map(|(left, rd, rs1, imm)| {
            let opcode = if left { Opcode::Slli } else { Opcode::Srli };
            Instruction::shift(opcode, &rd, &rs1, imm)
        }),
        (any::<bool>(), reg_name(), reg_name(), 0i64..64).prop_map(|(word, rd, base, offset)| {
            let opcode = if word { Opcode::Lw } else { Opcode::Lb };
            Instruction::load(opcode, &rd, &base, offset)
        }),
        (any::<bool>(), reg_name(), reg_name(), 0i64..64).prop_map(|(word, src, base, offset)| {
            let opcode = if word { Opcode::Sw } else { Opcode::Sb };
            Instruction::store(opcode, &src, &base, offset)
        }),
    ]
}

fn arb_program() -> impl Strategy<Value = Vec<Instruction>> {
    prop::collection::vec(arb_instruction(), 1..12)
}

/// A straight-line program with one branch spliced in. The target always
/// lies strictly beyond the branch, so the program terminates whichever
/// way the branch resolves.
fn arb_branch_program() -> impl Strategy<Value = Vec<Instruction>> {
    (
        prop::collection::vec(arb_instruction(), 2..10),
        any::<u8>(),
        any::<u8>(),
        0u8..8,
        0u8..8,
        any::<bool>(),
    )
        .prop_map(|(mut program, pos_sel, target_sel, r1, r2, equal)| {
            let len = program.len();
            let pos = (pos_sel as usize) % len;
            let target = pos + 1 + (target_sel as usize) % (len - pos);
            let opcode = if equal { Opcode::Beq } else { Opcode::Bne };
            program[pos] = Instruction::branch(
                opcode,
                &format!("R{}", r1),
                &format!("R{}", r2),
                target as i64,
            );
            program
        })
}

fn setup_simulator(program: Vec<Instruction>) -> Simulator {
    let mut simulator = Simulator::new(SimulatorConfig::default());
    simulator.load_program(program);
    simulator.seed_register("R0", 0);
    for i in 1..8i64 {
        simulator.seed_register(&format!("R{}", i), i * 3);
    }
    simulator
}

/// The invariants that must hold between any two cycles.
fn check_invariants(simulator: &Simulator) {
    let rob = &simulator.rob;
    let size = rob.size();

    // Every busy station points at a busy ROB entry, and no two busy
    // stations share a destination.
    let mut seen_dests = Vec::new();
    for rs in &simulator.reservation_stations {
        if !rs.busy {
            continue;
        }
        let dest = rs.dest_rob_id.expect("busy station must have a destination");
        assert!(
            rob.entries[dest].busy,
            "station {} targets cleared ROB entry {}",
            rs.name, dest
        );
        assert!(
            !seen_dests.contains(&dest),
            "two busy stations share ROB destination {}",
            dest
        );
        seen_dests.push(dest);

        // A pending tag and a captured value are mutually exclusive.
        if rs.qj.is_some() {
            assert!(rs.vj.is_none(), "station {} has both Qj and Vj", rs.name);
        }
        if rs.qk.is_some() {
            assert!(rs.vk.is_none(), "station {} has both Qk and Vk", rs.name);
        }
    }

    // The busy count matches, and every busy entry sits inside the
    // circular window starting at head.
    let busy: Vec<usize> = rob.busy_entries().map(|e| e.id).collect();
    assert_eq!(rob.count, busy.len(), "rob_count out of sync with busy entries");
    for &id in &busy {
        let offset = (id + size - rob.head) % size;
        assert!(
            offset < rob.count,
            "busy ROB entry {} outside the window [head={}, count={}]",
            id,
            rob.head,
            rob.count
        );
    }

    // Every busy register names a busy producer whose destination is
    // that register.
    for reg in simulator.register_file.iter() {
        if !reg.busy {
            continue;
        }
        let tag = reg.reorder_tag.expect("busy register must carry a tag");
        let producer = &rob.entries[tag];
        assert!(
            producer.busy,
            "register {} renamed to cleared ROB entry {}",
            reg.name, tag
        );
        assert_eq!(
            producer.dest,
            Some(RobDest::Register(reg.name.clone())),
            "register {} renamed to an entry that does not produce it",
            reg.name
        );
    }
}

proptest! {
    #[test]
    fn test_invariants_hold_every_cycle(program in arb_program()) {
        let budget = program.len() * 40 + 40;
        let len = program.len();
        let mut simulator = setup_simulator(program);

        let mut ticks = 0;
        while !simulator.is_finished() {
            prop_assert!(ticks < budget, "straight-line program did not drain");
            simulator.tick();
            ticks += 1;
            check_invariants(&simulator);
        }

        prop_assert_eq!(simulator.committed_count, len);

        // Commit order is a prefix of program order: the stamps must be
        // strictly increasing along the program.
        let stamps: Vec<usize> = simulator
            .program
            .iter()
            .map(|inst| inst.commit_cycle.expect("every instruction committed"))
            .collect();
        for pair in stamps.windows(2) {
            prop_assert!(pair[0] < pair[1], "commit stamps out of order: {:?}", stamps);
        }
    }

    #[test]
    fn test_forward_branch_programs_terminate(program in arb_branch_program()) {
        let budget = program.len() * 60 + 60;
        let mut simulator = setup_simulator(program);

        let mut ticks = 0;
        while !simulator.is_finished() {
            prop_assert!(ticks < budget, "branch program did not drain");
            simulator.tick();
            ticks += 1;
            check_invariants(&simulator);
        }

        prop_assert_eq!(simulator.rob.count, 0);
        prop_assert!(simulator.reservation_stations.iter().all(|rs| !rs.busy));
    }

    #[test]
    fn test_identical_runs_are_deterministic(program in arb_program()) {
        let mut first = setup_simulator(program.clone());
        let mut second = setup_simulator(program);
        first.run(2_000);
        second.run(2_000);
        prop_assert!(first.is_finished() && second.is_finished());

        let regs = |sim: &Simulator| -> Vec<(String, Value)> {
            sim.register_file
                .sorted()
                .iter()
                .map(|r| (r.name.clone(), r.value))
                .collect()
        };
        prop_assert_eq!(regs(&first), regs(&second));
        prop_assert_eq!(first.memory.cells_sorted(), second.memory.cells_sorted());
        prop_assert_eq!(first.current_cycle, second.current_cycle);
        prop_assert_eq!(first.bubble_count, second.bubble_count);
    }

    #[test]
    fn test_pause_resume_equivalence(program in arb_branch_program(), pause in 0usize..24) {
        let mut straight = setup_simulator(program.clone());
        straight.run(2_000);
        prop_assert!(straight.is_finished());

        let mut paused = setup_simulator(program);
        for _ in 0..pause {
            if paused.is_finished() {
                break;
            }
            paused.tick();
        }
        paused.run(2_000);
        prop_assert!(paused.is_finished());

        let regs = |sim: &Simulator| -> Vec<(String, Value)> {
            sim.register_file
                .sorted()
                .iter()
                .map(|r| (r.name.clone(), r.value))
                .collect()
        };
        prop_assert_eq!(regs(&paused), regs(&straight));
        prop_assert_eq!(paused.memory.cells_sorted(), straight.memory.cells_sorted());
        prop_assert_eq!(paused.current_cycle, straight.current_cycle);
        prop_assert_eq!(paused.committed_count, straight.committed_count);
    }
}

// QuickCheck-based tests

fn qc_add_matches_reference(a: i32, b: i32) -> bool {
    let mut simulator = Simulator::new(SimulatorConfig::default());
    simulator.load_program(vec![Instruction::r_type(Opcode::Add, "R3", "R1", "R2")]);
    simulator.seed_register("R1", a as i64);
    simulator.seed_register("R2", b as i64);
    simulator.run(100);

    simulator.register_file.read("R3") == Value::Int((a as i64) + (b as i64))
}

fn qc_memory_read_write_consistency(address: i16, value: i32) -> bool {
    let mut memory = Memory::new();
    memory.write(address as i64, value as i64);
    memory.read(address as i64) == value as i64
}

fn qc_display_parse_round_trip(kind: u8, op_sel: u8, a: u8, b: u8, c: u8, imm: i16) -> TestResult {
    let ra = format!("R{}", a % 16);
    let rb = format!("R{}", b % 16);
    let rc = format!("R{}", c % 16);

    let instruction = match kind % 5 {
        0 => Instruction::r_type(R_TYPE_OPCODES[(op_sel as usize) % 6], &ra, &rb, &rc),
        1 => {
            let opcode = if op_sel % 2 == 0 { Opcode::Slli } else { Opcode::Srli };
            Instruction::shift(opcode, &ra, &rb, (imm as i64).rem_euclid(64))
        },
        2 => {
            let opcode = if op_sel % 2 == 0 { Opcode::Lw } else { Opcode::Lb };
            Instruction::load(opcode, &ra, &rb, imm as i64)
        },
        3 => {
            let opcode = if op_sel % 2 == 0 { Opcode::Sw } else { Opcode::Sb };
            Instruction::store(opcode, &ra, &rb, imm as i64)
        },
        _ => {
            let opcode = if op_sel % 2 == 0 { Opcode::Beq } else { Opcode::Bne };
            Instruction::branch(opcode, &ra, &rb, (imm as i64).rem_euclid(512))
        },
    };

    let text = instruction.to_string();
    match parser::parse_line(&text) {
        Some(reparsed) => TestResult::from_bool(reparsed == instruction),
        None => TestResult::failed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_quickcheck_tests() {
        quickcheck::QuickCheck::new()
            .tests(30)
            .quickcheck(qc_add_matches_reference as fn(i32, i32) -> bool);

        quickcheck::QuickCheck::new()
            .tests(30)
            .quickcheck(qc_memory_read_write_consistency as fn(i16, i32) -> bool);

        quickcheck::QuickCheck::new()
            .tests(50)
            .quickcheck(qc_display_parse_round_trip as fn(u8, u8, u8, u8, u8, i16) -> TestResult);
    }
}
