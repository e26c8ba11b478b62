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

// logger.rs
//
// This file contains a simple logger for the simulator's trace output.
// It writes to a file or to the console, with different log levels.

use std::fs::File;
use std::io::Write;
use std::path::Path;

pub struct Logger {
    pub file: Option<File>,
    pub level: LogLevel,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Lenient parse used by the CLI; anything unrecognized becomes Info.
    pub fn parse(level: &str) -> LogLevel {
        match level.to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warning,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl Logger {
    pub fn console(level: LogLevel) -> Self {
        Self { file: None, level }
    }

    pub fn to_file<P: AsRef<Path>>(path: P, level: LogLevel) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            file: Some(file),
            level,
        })
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        if level >= self.level {
            let log_message = format!("[{:?}] {}\n", level, message);
            if let Some(file) = &mut self.file {
                let _ = file.write_all(log_message.as_bytes());
            } else {
                print!("{}", log_message);
            }
        }
    }

    /// Emit a message regardless of level and without a level prefix,
    /// used for the per-cycle state tables.
    pub fn raw(&mut self, message: &str) {
        if let Some(file) = &mut self.file {
            let _ = file.write_all(message.as_bytes());
            let _ = file.write_all(b"\n");
        } else {
            println!("{}", message);
        }
    }

    pub fn debug(&mut self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}
