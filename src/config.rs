use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable naming the default program file
pub const PROGRAM_VAR: &str = "INTCODE_PROGRAM";

/// Environment variable selecting the default output format
pub const OUTPUT_VAR: &str = "INTCODE_OUTPUT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub program_path: String,
    pub output: OutputFormat,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputFormat {
    /// One output value per line
    Text,
    /// The process result as JSON
    Json,
    /// Outputs rendered as ASCII text
    Ascii,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "ascii" => Self::Ascii,
            _ => Self::Text,
        }
    }

    pub fn is_json(&self) -> bool {
        *self == OutputFormat::Json
    }

    pub fn is_ascii(&self) -> bool {
        *self == OutputFormat::Ascii
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program_path: "program.txt".to_string(),
            output: OutputFormat::Text,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `INTCODE_PROGRAM` and `INTCODE_OUTPUT`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Config {
            program_path: env::var(PROGRAM_VAR).unwrap_or(defaults.program_path),
            output: env::var(OUTPUT_VAR)
                .map(|value| OutputFormat::from_str(&value))
                .unwrap_or(defaults.output),
            log_level: defaults.log_level,
        }
    }

    /// Apply command line overrides on top of the environment
    pub fn with_overrides(
        mut self,
        program_path: Option<&str>,
        output: Option<OutputFormat>,
        verbose: bool,
        trace: bool,
    ) -> Self {
        if let Some(path) = program_path {
            self.program_path = path.to_string();
        }
        if let Some(output) = output {
            self.output = output;
        }
        if trace {
            self.log_level = "trace".to_string();
        } else if verbose {
            self.log_level = "debug".to_string();
        }
        self
    }
}
