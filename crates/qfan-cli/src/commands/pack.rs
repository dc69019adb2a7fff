//! Pack command implementation.

use anyhow::Result;
use console::style;

use qfan_compile::Pipeline;

use super::common::{OutputOptions, PackOverrides, load_circuit, resolve_config, write_result};

/// Execute the pack command.
pub fn execute(
    input: &str,
    config: Option<&str>,
    overrides: &PackOverrides,
    out: &OutputOptions,
) -> Result<()> {
    eprintln!(
        "{} Packing {}",
        style("→").cyan().bold(),
        style(input).green()
    );

    let circuit = load_circuit(input)?;
    eprintln!(
        "  Loaded: {} qubits, {} ops",
        circuit.num_qubits(),
        circuit.len()
    );

    let config = resolve_config(config, overrides)?;
    let compiled = Pipeline::from_config(config).run(&circuit)?;

    write_result(&compiled, out)
}
