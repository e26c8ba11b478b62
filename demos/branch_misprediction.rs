// demos/branch_misprediction.rs

use tomasulo_rust::arch::instructions::{Instruction, Opcode};
use tomasulo_rust::tomasulo::config::SimulatorConfig;
use tomasulo_rust::tomasulo::simulator::Simulator;

fn main() {
    let mut simulator = Simulator::new(SimulatorConfig::default());

    // Branches are predicted not-taken, so a taken branch flushes the
    // speculatively issued instructions behind it and redirects the PC.
    let program = vec![
        Instruction::r_type(Opcode::Add, "R3", "R1", "R2"), // R3 = 10
        Instruction::branch(Opcode::Beq, "R1", "R2", 4),    // 5 == 5: taken
        Instruction::r_type(Opcode::Add, "R4", "R1", "R2"), // speculative, flushed
        Instruction::r_type(Opcode::Mul, "R5", "R1", "R2"), // speculative, flushed
        Instruction::r_type(Opcode::Sub, "R6", "R1", "R0"), // branch target
    ];
    simulator.load_program(program);
    simulator.seed_register("R1", 5);
    simulator.seed_register("R2", 5);

    println!("Running a taken branch that was predicted not-taken...");
    simulator.run(1000);

    println!("R3 = {} (committed before the branch)", simulator.register_file.read("R3"));
    println!("R4 = {} (flushed, never committed)", simulator.register_file.read("R4"));
    println!("R5 = {} (flushed, never committed)", simulator.register_file.read("R5"));
    println!("R6 = {} (branch target path)", simulator.register_file.read("R6"));
    println!();
    println!("{}", simulator.metrics());
}
