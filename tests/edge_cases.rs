// tests/edge_cases.rs
//
// Boundary behaviors: store timing, flush cleanliness, sentinel
// propagation, reset/reload determinism, and pause/resume equivalence.

use tomasulo_rust::arch::instructions::{Instruction, Opcode};
use tomasulo_rust::arch::value::Value;
use tomasulo_rust::tomasulo::config::SimulatorConfig;
use tomasulo_rust::tomasulo::simulator::Simulator;

fn setup_simulator(program: Vec<Instruction>) -> Simulator {
    let mut simulator = Simulator::new(SimulatorConfig::default());
    simulator.load_program(program);
    simulator.seed_register("R0", 0);
    simulator.seed_register("R1", 5);
    simulator.seed_register("R2", 5);
    simulator
}

fn final_registers(simulator: &Simulator) -> Vec<(String, Value)> {
    simulator
        .register_file
        .sorted()
        .iter()
        .map(|reg| (reg.name.clone(), reg.value))
        .collect()
}

#[test]
fn test_store_updates_memory_at_execute_completion() {
    let program = vec![
        Instruction::store(Opcode::Sw, "R1", "R0", 16),
        Instruction::load(Opcode::Lw, "R5", "R0", 16),
    ];
    let mut simulator = setup_simulator(program);

    // The store issues in cycle 1 and spends cycles 2-6 in the MEM unit;
    // memory is updated when execution completes, well before commit.
    for _ in 0..6 {
        simulator.tick();
    }
    assert_eq!(simulator.memory.read(16), 5, "memory written at execute completion");
    assert_eq!(simulator.committed_count, 0, "nothing has committed yet");

    simulator.run(1_000);
    assert!(simulator.is_finished());
    assert_eq!(simulator.register_file.read("R5"), Value::Int(5));
}

#[test]
fn test_flush_leaves_no_speculative_state() {
    // The branch targets the end of the program, so nothing re-issues
    // after the flush and every structure must come out empty.
    let program = vec![
        Instruction::r_type(Opcode::Add, "R3", "R1", "R2"),
        Instruction::branch(Opcode::Beq, "R1", "R2", 4),
        Instruction::r_type(Opcode::Add, "R4", "R1", "R2"),
        Instruction::r_type(Opcode::Mul, "R5", "R1", "R2"),
    ];
    let mut simulator = setup_simulator(program);

    let cycles = simulator.run(1_000);
    assert!(simulator.is_finished());
    println!("Flush-to-end scenario finished in {} cycles", cycles);

    for rs in &simulator.reservation_stations {
        assert!(!rs.busy, "station {} still busy after the flush", rs.name);
    }
    for entry in &simulator.rob.entries {
        assert!(!entry.busy, "ROB entry {} still busy after the flush", entry.id);
    }
    assert_eq!(simulator.rob.count, 0);
    for reg in simulator.register_file.iter() {
        assert!(!reg.busy, "register {} still renamed after the flush", reg.name);
        assert_eq!(reg.reorder_tag, None);
    }

    assert_eq!(simulator.committed_count, 2, "the ADD and the branch commit");
    assert_eq!(simulator.register_file.read("R3"), Value::Int(10));
    assert_eq!(simulator.register_file.read("R4"), Value::Int(0));
    assert_eq!(simulator.register_file.read("R5"), Value::Int(0));
    assert_eq!(simulator.bubble_count, 1, "only the flush penalty itself");
    assert_eq!(cycles, 8);
}

#[test]
fn test_div_by_zero_sentinel_reads_as_zero_downstream() {
    let program = vec![
        Instruction::r_type(Opcode::Div, "R6", "R1", "R0"),
        Instruction::r_type(Opcode::Add, "R7", "R6", "R1"),
    ];
    let mut simulator = setup_simulator(program);

    simulator.run(1_000);
    assert!(simulator.is_finished());

    assert_eq!(simulator.register_file.read("R6"), Value::DivByZero);
    assert_eq!(
        simulator.register_file.read("R7"),
        Value::Int(5),
        "the sentinel coerces to 0 when consumed as an operand"
    );
}

#[test]
fn test_reset_and_reload_reproduces_run() {
    let program_text = || {
        vec![
            Instruction::r_type(Opcode::Add, "R3", "R1", "R2"),
            Instruction::store(Opcode::Sw, "R3", "R0", 8),
            Instruction::load(Opcode::Lw, "R4", "R0", 8),
            Instruction::r_type(Opcode::Mul, "R5", "R4", "R3"),
        ]
    };

    let mut simulator = setup_simulator(program_text());
    simulator.run(1_000);
    assert!(simulator.is_finished());
    let first_registers = final_registers(&simulator);
    let first_memory = simulator.memory.cells_sorted();
    let first_metrics = simulator.metrics();

    // Reset, reload the same program and seeds, and run again.
    simulator.reset();
    assert_eq!(simulator.current_cycle, 0);
    assert_eq!(simulator.committed_count, 0);
    simulator.load_program(program_text());
    simulator.seed_register("R0", 0);
    simulator.seed_register("R1", 5);
    simulator.seed_register("R2", 5);
    simulator.run(1_000);
    assert!(simulator.is_finished());

    assert_eq!(final_registers(&simulator), first_registers);
    assert_eq!(simulator.memory.cells_sorted(), first_memory);
    assert_eq!(simulator.metrics().total_cycles, first_metrics.total_cycles);
    assert_eq!(
        simulator.metrics().committed_instructions,
        first_metrics.committed_instructions
    );
    assert_eq!(simulator.metrics().bubble_cycles, first_metrics.bubble_cycles);
}

#[test]
fn test_pause_and_resume_is_observationally_equivalent() {
    let build = || {
        vec![
            Instruction::r_type(Opcode::Add, "R3", "R1", "R2"),
            Instruction::r_type(Opcode::Sub, "R4", "R3", "R1"),
            Instruction::branch(Opcode::Bne, "R4", "R0", 4),
            Instruction::r_type(Opcode::Mul, "R5", "R1", "R2"),
            Instruction::store(Opcode::Sw, "R4", "R0", 32),
        ]
    };

    let mut straight = setup_simulator(build());
    straight.run(1_000);
    assert!(straight.is_finished());

    let mut paused = setup_simulator(build());
    for _ in 0..4 {
        paused.tick();
    }
    // ... host goes away, comes back ...
    paused.run(1_000);
    assert!(paused.is_finished());

    assert_eq!(final_registers(&paused), final_registers(&straight));
    assert_eq!(paused.memory.cells_sorted(), straight.memory.cells_sorted());
    assert_eq!(paused.current_cycle, straight.current_cycle);
    assert_eq!(paused.committed_count, straight.committed_count);
    assert_eq!(paused.bubble_count, straight.bubble_count);
}

#[test]
fn test_empty_program_is_finished_immediately() {
    let mut simulator = Simulator::new(SimulatorConfig::default());
    simulator.load_program(Vec::new());

    assert!(simulator.is_finished());
    let metrics = simulator.metrics();
    assert_eq!(metrics.total_cycles, 0);
    assert_eq!(metrics.committed_instructions, 0);
    assert_eq!(metrics.ipc, 0.0, "no cycles means IPC reports 0");
}

#[test]
fn test_unseen_register_reads_as_zero() {
    let simulator = Simulator::new(SimulatorConfig::default());
    assert_eq!(simulator.register_file.read("R99"), Value::Int(0));
}
