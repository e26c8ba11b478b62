// demos/structural_hazards.rs

use tomasulo_rust::arch::instructions::{Instruction, Opcode};
use tomasulo_rust::tomasulo::config::SimulatorConfig;
use tomasulo_rust::tomasulo::simulator::Simulator;

fn main() {
    // A single MUL/DIV station and a tiny ROB make the structural stalls
    // easy to see in the stage stamps.
    let config = SimulatorConfig::new().with_mul_stations(1).with_rob_size(4);
    let mut simulator = Simulator::new(config);

    let program = vec![
        Instruction::r_type(Opcode::Mul, "R3", "R1", "R2"),
        Instruction::r_type(Opcode::Mul, "R4", "R1", "R2"), // waits for the MUL station
        Instruction::r_type(Opcode::Div, "R5", "R3", "R1"), // waits again, then on R3
    ];
    simulator.load_program(program);
    simulator.seed_register("R1", 6);
    simulator.seed_register("R2", 7);

    println!("Running back-to-back MUL/DIV through one multiplier station...");
    simulator.run(1000);

    for (index, inst) in simulator.program.iter().enumerate() {
        println!(
            "[{}] {:<18} issue={:?} exec_start={:?} write={:?} commit={:?}",
            index,
            inst.to_string(),
            inst.issue_cycle,
            inst.execute_start_cycle,
            inst.write_result_cycle,
            inst.commit_cycle,
        );
    }
    println!();
    println!("{}", simulator.metrics());
}
