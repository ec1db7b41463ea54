use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use ch10gen::icd::load_icd_from_file;
use ch10gen::logging::{init_logger, log_error, log_info};
use ch10gen::scenario::load_scenario_from_file;
use ch10gen::validator::{validate, Severity};
use ch10gen::writer::WriterConfig;
use ch10gen::Ch10GenError;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ch10gen")]
#[command(about = "Generates and validates synthetic IRIG-106 Chapter 10 1553 recordings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a Chapter 10 file from an ICD and a scenario document.
    Generate {
        #[arg(long)]
        icd: PathBuf,
        #[arg(long)]
        scenario: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Validate a previously generated Chapter 10 file's structure.
    Validate {
        #[arg(long)]
        input: PathBuf,
    },
}

/// Exit code contract (spec §6): 0 success, 1 generic error, 2 invalid
/// arguments, 3 file not found, 4 validation failure, 5 I/O failure.
fn main() -> ExitCode {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            icd,
            scenario,
            output,
        } => run_generate(&icd, &scenario, &output),
        Commands::Validate { input } => run_validate(&input),
    }
}

fn run_generate(icd_path: &PathBuf, scenario_path: &PathBuf, output_path: &PathBuf) -> ExitCode {
    let icd = match load_icd_from_file(icd_path) {
        Ok(icd) => icd,
        Err(e) => return fail_config(icd_path, &e.to_string()),
    };

    let scenario = match load_scenario_from_file(scenario_path, &icd) {
        Ok(scenario) => scenario,
        Err(e) => return fail_config(scenario_path, &e.to_string()),
    };

    let file = match File::create(output_path) {
        Ok(file) => file,
        Err(e) => {
            log_error(&format!("could not create '{}': {e}", output_path.display()));
            return ExitCode::from(5);
        }
    };

    let writer_config = WriterConfig {
        program_name: scenario.name.clone(),
        target_packet_bytes: scenario.bus.packet_bytes_target,
        time_packet_interval_s: scenario.bus.time_packet_interval_s,
        start_time_utc: scenario.start_time_utc.unwrap_or_else(chrono::Utc::now),
        ..WriterConfig::default()
    };

    match ch10gen::generate(&icd, &scenario, writer_config, BufWriter::new(file), None) {
        Ok(report) => {
            log_info(&format!(
                "wrote {} messages in {} packets ({} bytes)",
                report.stats.messages_written,
                report.stats.packets_written,
                report.stats.bytes_written
            ));
            for warning in &report.schedule_warnings {
                log_error(&format!("{warning:?}"));
            }
            for warning in &report.generator_warnings {
                log_error(warning);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error(&e.to_string());
            match e {
                Ch10GenError::IoError(_) => ExitCode::from(5),
                Ch10GenError::ConfigError { .. } | Ch10GenError::DependencyError(_) => {
                    ExitCode::from(2)
                }
                _ => ExitCode::from(1),
            }
        }
    }
}

fn run_validate(input_path: &PathBuf) -> ExitCode {
    let data = match std::fs::read(input_path) {
        Ok(data) => data,
        Err(e) => {
            log_error(&format!("could not read '{}': {e}", input_path.display()));
            return ExitCode::from(3);
        }
    };

    let report = validate(&data);
    for diagnostic in &report.diagnostics {
        let line = format!(
            "[{:?}] {} @0x{:08X}: {}",
            diagnostic.severity, diagnostic.code, diagnostic.byte_offset, diagnostic.description
        );
        match diagnostic.severity {
            Severity::Error => log_error(&line),
            Severity::Warning | Severity::Info => log_info(&line),
        }
    }

    if report.is_ok() {
        log_info("validation passed");
        ExitCode::SUCCESS
    } else {
        ExitCode::from(4)
    }
}

fn fail_config(path: &PathBuf, reason: &str) -> ExitCode {
    if !path.exists() {
        log_error(&format!("file not found: '{}'", path.display()));
        return ExitCode::from(3);
    }
    log_error(&format!("invalid document '{}': {reason}", path.display()));
    ExitCode::from(2)
}
