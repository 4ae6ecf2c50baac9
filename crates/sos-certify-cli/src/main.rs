use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use sos_certify::error::CertifyError;
use sos_certify::verifier::Mode;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Outcome;
use commands::check::{OutputFormat, ToleranceOverrides};

/// Top-level CLI argument parser for the `sosc` command
#[derive(Parser)]
#[command(
    name = "sosc",
    about = "sos-certify — check sum-of-squares certificates",
    version
)]
struct Cli {
    /// Log verification progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `sosc` CLI
#[derive(Subcommand)]
enum Commands {
    /// Verify a certificate and print the verdict
    Check {
        /// Path to the certificate YAML file
        certificate: PathBuf,
        /// Verification mode: full (default), fast, or answer
        #[arg(long, default_value = "full")]
        mode: Mode,
        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,
        /// Bound on ‖M − Mᵀ‖_F for the symmetry test
        #[arg(long)]
        eps_matrix_norm: Option<f64>,
        /// Allowed negativity of the smallest eigenvalue
        #[arg(long)]
        eps_eig: Option<f64>,
        /// Bound on every residual coefficient
        #[arg(long)]
        eps_poly_coeff: Option<f64>,
    },
    /// Check a certificate document for structural errors only
    Validate {
        /// Path to the certificate YAML file
        certificate: PathBuf,
    },
    /// Summarize a certificate (targets, matrices, conditions)
    Status {
        /// Path to the certificate YAML file
        certificate: PathBuf,
    },
}

/// Dispatch a parsed CLI subcommand to its handler
fn run_command(command: Commands) -> Result<Outcome, Box<dyn std::error::Error>> {
    match command {
        Commands::Check {
            certificate,
            mode,
            format,
            eps_matrix_norm,
            eps_eig,
            eps_poly_coeff,
        } => commands::check::run(
            &certificate,
            mode,
            format,
            &ToleranceOverrides {
                matrix_norm: eps_matrix_norm,
                eigenvalue: eps_eig,
                poly_coeff: eps_poly_coeff,
            },
        ),
        Commands::Validate { certificate } => commands::validate::run(&certificate),
        Commands::Status { certificate } => commands::status::run(&certificate),
    }
}

/// `2` when the input must be fixed, `3` when the tooling failed.
fn exit_code(error: &(dyn std::error::Error + 'static)) -> i32 {
    match error.downcast_ref::<CertifyError>() {
        Some(e) if e.is_input_error() => 2,
        _ => 3,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// Entry point: parse CLI arguments and run the selected subcommand
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run_command(cli.command) {
        Ok(Outcome::Passed) => {}
        Ok(Outcome::Incorrect) => process::exit(1),
        Ok(Outcome::Malformed) => process::exit(2),
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(CertifyError::Malformed { violations }) = e.downcast_ref::<CertifyError>()
                && violations.len() > 1
            {
                for v in violations {
                    eprintln!("  {v}");
                }
            }
            process::exit(exit_code(e.as_ref()));
        }
    }
}
