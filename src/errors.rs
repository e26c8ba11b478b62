use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum SimulatorError {
    // Program loading errors
    ProgramNotFound(String),

    // Host configuration errors
    InvalidRegisterSeed(String),
    InvalidMemorySeed(String),

    // System errors
    IoError(std::io::Error),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorError::ProgramNotFound(path) => {
                write!(f, "Program file not found: {}", path)
            },
            SimulatorError::InvalidRegisterSeed(seed) => {
                write!(f, "Invalid register seed (expected NAME=VALUE): {}", seed)
            },
            SimulatorError::InvalidMemorySeed(seed) => {
                write!(f, "Invalid memory seed (expected ADDR=VALUE): {}", seed)
            },
            SimulatorError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl Error for SimulatorError {}

impl From<std::io::Error> for SimulatorError {
    fn from(error: std::io::Error) -> Self {
        SimulatorError::IoError(error)
    }
}
