use clap::{Arg, Command};
use colored::Colorize;
use intcode::ascii::{encode_line, render};
use intcode::config::{Config, OutputFormat};
use intcode::{load_program, Cell, ProcessResult, ProgramError, Status, VMError, VM};
use log::{debug, info, warn};
use serde::Serialize;
use std::process;
use thiserror::Error;

#[derive(Debug, Error)]
enum AppError {
    #[error("VM error: {0}")]
    VM(#[from] VMError),

    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Other(s)
    }
}

/// Summary printed in JSON mode
#[derive(Debug, Serialize)]
struct RunReport {
    status: Status,
    outputs: Vec<Cell>,
    last_output: Option<Cell>,
    steps: u64,
}

fn main() {
    let matches = Command::new("intcode")
        .version("0.5.1")
        .about("Runs Intcode programs with suspendable input")
        .arg(
            Arg::new("program")
                .short('p')
                .long("program")
                .value_name("FILE")
                .help("Program file of comma-separated integers (default: $INTCODE_PROGRAM or program.txt)"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("VALUES")
                .help("Comma-separated input values, or a text line in ASCII mode (can be used multiple times)")
                .allow_hyphen_values(true)
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .help("Prompt for input whenever the program is waiting for it")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ascii")
                .short('a')
                .long("ascii")
                .help("Treat input as text lines and render output as ASCII")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("json"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the result as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log status transitions")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("trace")
                .long("trace")
                .help("Log every executed instruction")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let output = if matches.get_flag("json") {
        Some(OutputFormat::Json)
    } else if matches.get_flag("ascii") {
        Some(OutputFormat::Ascii)
    } else {
        None
    };

    let config = Config::from_env().with_overrides(
        matches.get_one::<String>("program").map(|s| s.as_str()),
        output,
        matches.get_flag("verbose"),
        matches.get_flag("trace"),
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    let inputs: Vec<String> = matches
        .get_many::<String>("input")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let result = if matches.get_flag("interactive") {
        run_interactive(&config, &inputs)
    } else {
        run_program(&config, &inputs)
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

/// Turn command line or REPL input into cells according to the output mode
fn parse_inputs(config: &Config, raw: &[String]) -> Result<Vec<Cell>, AppError> {
    let mut cells = Vec::new();
    for entry in raw {
        if config.output.is_ascii() {
            cells.extend(encode_line(entry));
            continue;
        }
        for value in entry.split(',').map(str::trim).filter(|v| !v.is_empty()) {
            let cell = value
                .parse::<Cell>()
                .map_err(|_| format!("Invalid input value '{}'", value))?;
            cells.push(cell);
        }
    }
    Ok(cells)
}

fn load_vm(config: &Config) -> Result<VM, AppError> {
    info!("Loading program from {}", config.program_path);
    let program = load_program(&config.program_path)?;
    debug!("Program has {} cells", program.len());
    Ok(VM::new(&program))
}

fn run_program(config: &Config, raw_inputs: &[String]) -> Result<(), AppError> {
    let mut vm = load_vm(config)?;
    let inputs = parse_inputs(config, raw_inputs)?;
    let result = vm.process(&inputs)?;

    if result.status.is_waiting() {
        warn!("Program stopped at {} waiting for more input", vm.position());
    }

    match config.output {
        OutputFormat::Json => {
            let report = RunReport {
                status: result.status,
                last_output: result.last_output(),
                outputs: result.outputs,
                steps: vm.steps(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => print_outputs(config, &result),
    }

    if result.status.is_waiting() {
        eprintln!("{}", "Program is waiting for input".yellow());
    }

    Ok(())
}

fn print_outputs(config: &Config, result: &ProcessResult) {
    if config.output.is_ascii() {
        let rendered = render(&result.outputs);
        print!("{}", rendered.text);
        for value in rendered.values {
            println!("{}", value);
        }
    } else {
        for value in &result.outputs {
            println!("{}", value);
        }
    }
}

fn run_interactive(config: &Config, raw_inputs: &[String]) -> Result<(), AppError> {
    let mut vm = load_vm(config)?;
    let mut inputs = parse_inputs(config, raw_inputs)?;

    let mut rl = rustyline::DefaultEditor::new().map_err(|e| AppError::Other(e.to_string()))?;

    loop {
        let result = vm.process(&inputs)?;
        print_outputs(config, &result);

        if result.status.is_done() {
            println!("{}", "Program finished".green());
            if let Some(value) = vm.last_output() {
                println!("Last output: {}", value);
            }
            break;
        }

        inputs = loop {
            let line = match rl.readline("input> ") {
                Ok(line) => line,
                Err(rustyline::error::ReadlineError::Interrupted) => {
                    println!("Interrupted (Ctrl+C)");
                    return Ok(());
                }
                Err(rustyline::error::ReadlineError::Eof) => {
                    println!("EOF (Ctrl+D)");
                    return Ok(());
                }
                Err(e) => {
                    return Err(AppError::Other(format!("Error reading input: {}", e)));
                }
            };

            if let Err(e) = rl.add_history_entry(&line) {
                return Err(AppError::Other(format!("Error adding to history: {}", e)));
            }

            let trimmed = line.trim();
            if matches!(trimmed, "exit" | "quit") {
                println!("Exiting");
                return Ok(());
            }

            match parse_inputs(config, &[line.clone()]) {
                Ok(cells) if !cells.is_empty() => break cells,
                Ok(_) => continue,
                Err(e) => eprintln!("{}", e.to_string().red()),
            }
        };
    }

    Ok(())
}
