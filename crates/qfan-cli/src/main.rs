//! qfan Command-Line Interface
//!
//! Packs controlled-gate sequences into fan-out layers.
//!
//! ```text
//!   CX(0→1) CX(0→2) CX(0→3)        FANOUT(0→{1,2,3})
//!   ───────────────────────   ──►   ─────────────────
//!        three links                    one link
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::{OutputOptions, PackOverrides};
use commands::{demo, pack};

/// qfan - conflict-aware fan-out packing for distributed quantum circuits
#[derive(Parser)]
#[command(name = "qfan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack an operation sequence from a file
    Pack {
        /// Input file (JSON or YAML: a circuit object or a bare operation array)
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Packing configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Repeated phase target handling (lenient, strict, accumulate)
        #[arg(long)]
        angle_policy: Option<String>,

        /// Layer placement heuristic (first-fit, merge-first)
        #[arg(long)]
        placement: Option<String>,

        /// Skip the reorder pass
        #[arg(long)]
        no_reorder: bool,

        /// Emission order (program, layer)
        #[arg(long)]
        emit: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Pack a built-in circuit
    Demo {
        /// Circuit name (c1, c2, c3, qft, ghz, cgr)
        name: String,

        /// Number of qubits for qft and ghz
        #[arg(short, long, default_value = "4")]
        num_qubits: u32,

        /// Emission order (program, layer)
        #[arg(long)]
        emit: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Pack {
            input,
            output,
            config,
            angle_policy,
            placement,
            no_reorder,
            emit,
            format,
        } => {
            let overrides = PackOverrides {
                angle_policy,
                placement,
                no_reorder,
                emit,
            };
            let out = OutputOptions {
                path: output,
                format,
                verbose: cli.verbose,
            };
            pack::execute(&input, config.as_deref(), &overrides, &out)
        }

        Commands::Demo {
            name,
            num_qubits,
            emit,
            format,
        } => {
            let overrides = PackOverrides {
                emit,
                ..PackOverrides::default()
            };
            let out = OutputOptions {
                path: None,
                format,
                verbose: cli.verbose,
            };
            demo::execute(&name, num_qubits, &overrides, &out)
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
