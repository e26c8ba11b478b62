// demos/basic_pipeline.rs

use tomasulo_rust::arch::instructions::{Instruction, Opcode};
use tomasulo_rust::tomasulo::config::SimulatorConfig;
use tomasulo_rust::tomasulo::simulator::Simulator;

fn main() {
    let mut simulator = Simulator::new(SimulatorConfig::default());

    // A dependency chain: the SUB and MUL both wait on the ADD's result,
    // which arrives over the common data bus.
    let program = vec![
        Instruction::r_type(Opcode::Add, "R3", "R1", "R2"), // R3 = 5 + 5 = 10
        Instruction::r_type(Opcode::Sub, "R4", "R3", "R1"), // R4 = 10 - 5 = 5
        Instruction::r_type(Opcode::Mul, "R5", "R3", "R4"), // R5 = 10 * 5 = 50
    ];
    simulator.load_program(program);
    simulator.seed_register("R1", 5);
    simulator.seed_register("R2", 5);

    println!("Running a three-instruction dependency chain...");
    simulator.run(1000);

    for name in ["R3", "R4", "R5"] {
        println!("{} = {}", name, simulator.register_file.read(name));
    }
    println!();
    println!("{}", simulator.metrics());
}
