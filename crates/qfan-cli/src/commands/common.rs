//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::Deserialize;
use tracing::debug;

use qfan_compile::{AnglePolicy, CompiledCircuit, EmitOrder, PackConfig, PlacementStrategy};
use qfan_ir::{Circuit, Operation};

/// Command-line overrides applied on top of a configuration file.
#[derive(Debug, Default)]
pub struct PackOverrides {
    pub angle_policy: Option<String>,
    pub placement: Option<String>,
    pub no_reorder: bool,
    pub emit: Option<String>,
}

/// Where and how to write results.
#[derive(Debug)]
pub struct OutputOptions {
    pub path: Option<String>,
    pub format: String,
    pub verbose: u8,
}

/// Input document: a full circuit or a bare operation array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CircuitDocument {
    Circuit(Circuit),
    Operations(Vec<Operation>),
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn read_source(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

/// Load a circuit from a JSON or YAML file.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let path_obj = Path::new(path);
    let source = read_source(path)?;

    let document: CircuitDocument = match extension(path_obj).as_str() {
        "yaml" | "yml" => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Failed to parse YAML circuit: {path}"))?,
        _ => serde_json::from_str(&source)
            .with_context(|| format!("Failed to parse JSON circuit: {path}"))?,
    };

    let circuit = match document {
        CircuitDocument::Circuit(declared) => {
            // Keep the declared width; pushing only ever widens it.
            let mut circuit = Circuit::with_size(declared.name(), declared.num_qubits());
            for op in declared.into_operations() {
                circuit.push(op)?;
            }
            circuit
        }
        CircuitDocument::Operations(ops) => {
            let name = path_obj
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Circuit::from_operations(name, ops)?
        }
    };
    debug!(
        "Loaded circuit '{}' with {} operations",
        circuit.name(),
        circuit.len()
    );
    Ok(circuit)
}

/// Load a packing configuration from a YAML or JSON file.
pub fn load_config(path: &str) -> Result<PackConfig> {
    let source = read_source(path)?;
    match extension(Path::new(path)).as_str() {
        "yaml" | "yml" => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Failed to parse YAML config: {path}")),
        "json" => PackConfig::from_json(&source)
            .with_context(|| format!("Failed to parse JSON config: {path}")),
        other => anyhow::bail!("Unsupported config format: '{other}'. Use .yaml, .yml or .json"),
    }
}

/// Parse an angle policy name.
pub fn parse_angle_policy(name: &str) -> Result<AnglePolicy> {
    match name.to_lowercase().as_str() {
        "lenient" => Ok(AnglePolicy::Lenient),
        "strict" => Ok(AnglePolicy::Strict),
        "accumulate" => Ok(AnglePolicy::Accumulate),
        other => {
            anyhow::bail!("Unknown angle policy: '{other}'. Available: lenient, strict, accumulate")
        }
    }
}

/// Parse a placement strategy name.
pub fn parse_placement(name: &str) -> Result<PlacementStrategy> {
    match name.to_lowercase().as_str() {
        "first-fit" | "first_fit" => Ok(PlacementStrategy::FirstFit),
        "merge-first" | "merge_first" => Ok(PlacementStrategy::MergeFirst),
        other => anyhow::bail!("Unknown placement: '{other}'. Available: first-fit, merge-first"),
    }
}

/// Parse an emission order name.
pub fn parse_emit_order(name: &str) -> Result<EmitOrder> {
    match name.to_lowercase().as_str() {
        "program" => Ok(EmitOrder::Program),
        "layer" => Ok(EmitOrder::Layer),
        other => anyhow::bail!("Unknown emit order: '{other}'. Available: program, layer"),
    }
}

/// Build the effective configuration: file (or defaults), then overrides.
pub fn resolve_config(path: Option<&str>, overrides: &PackOverrides) -> Result<PackConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => PackConfig::default(),
    };
    if let Some(name) = &overrides.angle_policy {
        config.angle_policy = parse_angle_policy(name)?;
    }
    if let Some(name) = &overrides.placement {
        config.placement = parse_placement(name)?;
    }
    if let Some(name) = &overrides.emit {
        config.emit_order = parse_emit_order(name)?;
    }
    if overrides.no_reorder {
        config.reorder = false;
    }
    debug!("Effective config: {:?}", config);
    Ok(config)
}

/// Render a packing result as text or JSON.
pub fn render(compiled: &CompiledCircuit, format: &str) -> Result<String> {
    match format.to_lowercase().as_str() {
        "text" => {
            let mut out = String::new();
            for op in &compiled.operations {
                out.push_str(&op.to_string());
                out.push('\n');
            }
            Ok(out)
        }
        "json" => {
            let mut out = serde_json::to_string_pretty(compiled)?;
            out.push('\n');
            Ok(out)
        }
        other => anyhow::bail!("Unknown format: '{other}'. Available: text, json"),
    }
}

/// Print the summary to stderr and write the rendered result.
pub fn write_result(compiled: &CompiledCircuit, out: &OutputOptions) -> Result<()> {
    let rendered = render(compiled, &out.format)?;
    let stats = &compiled.stats;

    eprintln!(
        "{} Packed {} ops into {} ops over {} layers ({} merged)",
        style("✓").green().bold(),
        stats.input_ops,
        stats.output_ops,
        stats.layers,
        stats.merged
    );
    if stats.angle_conflicts > 0 {
        eprintln!(
            "  {} {} angle conflict(s) left unmerged",
            style("!").yellow().bold(),
            stats.angle_conflicts
        );
    }
    if out.verbose > 0 {
        for (i, layer) in compiled.layers.iter().enumerate() {
            let ops: Vec<String> = layer.operations().map(ToString::to_string).collect();
            eprintln!("  layer {}: {}", style(i).cyan(), ops.join(" | "));
        }
    }

    match &out.path {
        Some(path) => {
            fs::write(path, rendered).with_context(|| format!("Failed to write file: {path}"))?;
            eprintln!("  Output: {}", style(path).green());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
