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

// main.rs
//
// This file contains the main entry point for the Tomasulo simulator.
// It provides a command-line interface for running a program to
// completion or tracing it cycle by cycle.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tomasulo_rust::errors::SimulatorError;
use tomasulo_rust::tomasulo::config::SimulatorConfig;
use tomasulo_rust::tomasulo::simulator::Simulator;
use tomasulo_rust::tomasulo::visualization::StateVisualization;
use tomasulo_rust::utils::logger::{LogLevel, Logger};
use tomasulo_rust::utils::parser;

#[derive(Parser)]
#[command(name = "tomasulo_rust")]
#[command(about = "A cycle-accurate Tomasulo out-of-order execution simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program to completion and report metrics
    Run {
        /// Input program file (defaults to a built-in demo program)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Initial register value, e.g. --reg R1=5 (repeatable)
        #[arg(short, long, value_name = "NAME=VALUE")]
        reg: Vec<String>,

        /// Initial memory cell, e.g. --mem 16=5 (repeatable)
        #[arg(short, long, value_name = "ADDR=VALUE")]
        mem: Vec<String>,

        /// Reorder buffer size
        #[arg(long, default_value = "8")]
        rob_size: usize,

        /// Reservation stations in the load/store pool
        #[arg(long, default_value = "2")]
        mem_stations: usize,

        /// Reservation stations in the ADD/SUB pool
        #[arg(long, default_value = "3")]
        add_stations: usize,

        /// Reservation stations in the logic/shift/branch pool
        #[arg(long, default_value = "2")]
        logic_stations: usize,

        /// Reservation stations in the MUL/DIV pool
        #[arg(long, default_value = "1")]
        mul_stations: usize,

        /// Maximum cycles to simulate
        #[arg(long, default_value = "100000")]
        max_cycles: usize,

        /// Emit metrics as JSON instead of the human-readable report
        #[arg(long)]
        json: bool,

        /// Log level (error, warn, info, debug)
        #[arg(short, long, default_value = "info")]
        log_level: String,
    },
    /// Step cycle by cycle, dumping the state tables after every cycle
    Trace {
        /// Input program file (defaults to a built-in demo program)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Initial register value, e.g. --reg R1=5 (repeatable)
        #[arg(short, long, value_name = "NAME=VALUE")]
        reg: Vec<String>,

        /// Initial memory cell, e.g. --mem 16=5 (repeatable)
        #[arg(short, long, value_name = "ADDR=VALUE")]
        mem: Vec<String>,

        /// Reorder buffer size
        #[arg(long, default_value = "8")]
        rob_size: usize,

        /// Reservation stations in the load/store pool
        #[arg(long, default_value = "2")]
        mem_stations: usize,

        /// Reservation stations in the ADD/SUB pool
        #[arg(long, default_value = "3")]
        add_stations: usize,

        /// Reservation stations in the logic/shift/branch pool
        #[arg(long, default_value = "2")]
        logic_stations: usize,

        /// Reservation stations in the MUL/DIV pool
        #[arg(long, default_value = "1")]
        mul_stations: usize,

        /// Maximum cycles to trace
        #[arg(long, default_value = "1000")]
        max_cycles: usize,

        /// Output trace file (defaults to the console)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Log level (error, warn, info, debug)
        #[arg(short, long, default_value = "info")]
        log_level: String,
    },
}

// The program the original simulator ships as its default workload.
const DEFAULT_PROGRAM: &str = "\
# Demo workload: loads, dependent ALU traffic, a branch, and a store
LW R6, R12, 8
LW R2, R13, 11
OR R0, R2, R4
SUB R8, R2, R6
AND R10, R0, R6
ADD R6, R8, R2
BEQ R6, R0, 10
ADD R14, R12, R13
SUB R15, R14, R6
OR R16, R15, R0
AND R17, R16, R2
ADD R18, R17, R4
SW R18, R0, 16
LW R19, R0, 12
";

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            reg,
            mem,
            rob_size,
            mem_stations,
            add_stations,
            logic_stations,
            mul_stations,
            max_cycles,
            json,
            log_level,
        } => run_command(
            input,
            &reg,
            &mem,
            build_config(rob_size, mem_stations, add_stations, logic_stations, mul_stations),
            max_cycles,
            json,
            &log_level,
        ),
        Commands::Trace {
            input,
            reg,
            mem,
            rob_size,
            mem_stations,
            add_stations,
            logic_stations,
            mul_stations,
            max_cycles,
            output,
            log_level,
        } => trace_command(
            input,
            &reg,
            &mem,
            build_config(rob_size, mem_stations, add_stations, logic_stations, mul_stations),
            max_cycles,
            output,
            &log_level,
        ),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn build_config(
    rob_size: usize,
    mem_stations: usize,
    add_stations: usize,
    logic_stations: usize,
    mul_stations: usize,
) -> SimulatorConfig {
    SimulatorConfig::new()
        .with_rob_size(rob_size)
        .with_mem_stations(mem_stations)
        .with_add_stations(add_stations)
        .with_logic_stations(logic_stations)
        .with_mul_stations(mul_stations)
}

fn init_logging(log_level: &str) {
    let filter = match log_level.to_ascii_lowercase().as_str() {
        "debug" => log::LevelFilter::Debug,
        "warn" | "warning" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(filter)
        .try_init();
}

/// Load the requested program (or the built-in demo) and apply seeds.
fn prepare(
    simulator: &mut Simulator,
    input: Option<&PathBuf>,
    reg_seeds: &[String],
    mem_seeds: &[String],
) -> Result<(), SimulatorError> {
    match input {
        Some(path) => {
            let count = simulator.load_program_file(path)?;
            println!("Loaded {} instructions from {}", count, path.display());
        },
        None => {
            simulator.load_program(parser::parse_program(DEFAULT_PROGRAM));
            apply_default_seeds(simulator);
            println!(
                "No input file given; using the built-in demo program ({} instructions)",
                simulator.program.len()
            );
        },
    }

    // R0 is conventionally pinned to 0; an explicit seed may still override it.
    simulator.seed_register("R0", 0);
    for spec in reg_seeds {
        let (name, value) = parse_register_seed(spec)?;
        simulator.seed_register(&name, value);
    }
    for spec in mem_seeds {
        let (address, value) = parse_memory_seed(spec)?;
        simulator.seed_memory(address, value);
    }
    Ok(())
}

fn apply_default_seeds(simulator: &mut Simulator) {
    simulator.seed_register("R0", 0);
    simulator.seed_register("R4", 1);
    simulator.seed_register("R12", 100);
    simulator.seed_register("R13", 200);
    simulator.seed_memory(108, 500);
    simulator.seed_memory(211, 600);
    simulator.seed_memory(12, 777);
}

fn parse_register_seed(spec: &str) -> Result<(String, i64), SimulatorError> {
    let error = || SimulatorError::InvalidRegisterSeed(spec.to_string());
    let (name, value) = spec.split_once('=').ok_or_else(error)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(error());
    }
    let value: i64 = value.trim().parse().map_err(|_| error())?;
    Ok((name.to_string(), value))
}

fn parse_memory_seed(spec: &str) -> Result<(i64, i64), SimulatorError> {
    let error = || SimulatorError::InvalidMemorySeed(spec.to_string());
    let (address, value) = spec.split_once('=').ok_or_else(error)?;
    let address: i64 = address.trim().parse().map_err(|_| error())?;
    let value: i64 = value.trim().parse().map_err(|_| error())?;
    Ok((address, value))
}

fn run_command(
    input: Option<PathBuf>,
    reg_seeds: &[String],
    mem_seeds: &[String],
    config: SimulatorConfig,
    max_cycles: usize,
    json: bool,
    log_level: &str,
) -> Result<(), SimulatorError> {
    init_logging(log_level);

    let mut simulator = Simulator::new(config);
    prepare(&mut simulator, input.as_ref(), reg_seeds, mem_seeds)?;

    let executed = simulator.run(max_cycles);
    if !simulator.is_finished() {
        println!("Stopped after {} cycles without finishing", executed);
    }

    let metrics = simulator.metrics();
    if json {
        match serde_json::to_string_pretty(&metrics) {
            Ok(serialized) => println!("{}", serialized),
            Err(err) => eprintln!("Failed to serialize metrics: {}", err),
        }
        return Ok(());
    }

    println!("\n{}", metrics);

    println!("\nFinal Registers:");
    for reg in simulator.register_file.sorted() {
        println!("  {} = {}", reg.name, reg.value);
    }

    println!("\nFinal Memory:");
    if simulator.memory.is_empty() {
        println!("  (empty)");
    }
    for (address, value) in simulator.memory.cells_sorted() {
        println!("  mem[{}] = {}", address, value);
    }

    Ok(())
}

fn trace_command(
    input: Option<PathBuf>,
    reg_seeds: &[String],
    mem_seeds: &[String],
    config: SimulatorConfig,
    max_cycles: usize,
    output: Option<PathBuf>,
    log_level: &str,
) -> Result<(), SimulatorError> {
    init_logging(log_level);

    let mut simulator = Simulator::new(config);
    prepare(&mut simulator, input.as_ref(), reg_seeds, mem_seeds)?;

    let mut visualization = StateVisualization::new();
    let mut logger = match output {
        Some(path) => {
            visualization.colorize_output = false;
            Logger::to_file(&path, LogLevel::parse(log_level))?
        },
        None => Logger::console(LogLevel::parse(log_level)),
    };

    let mut executed = 0;
    while !simulator.is_finished() && executed < max_cycles {
        simulator.tick();
        executed += 1;
        logger.raw(&visualization.render(&simulator));
    }

    if !simulator.is_finished() {
        logger.warning(&format!("Stopped after {} cycles without finishing", executed));
    }
    logger.raw(&format!("{}", simulator.metrics()));
    Ok(())
}
