//! Demo command implementation.

use anyhow::Result;
use console::style;

use qfan_compile::Pipeline;
use qfan_ir::{Circuit, QubitId};

use super::common::{OutputOptions, PackOverrides, resolve_config, write_result};

/// Build a named demo circuit.
pub fn demo_circuit(name: &str, num_qubits: u32) -> Result<Circuit> {
    let q = QubitId;
    let circuit = match name.to_lowercase().as_str() {
        "c1" => {
            let mut c = Circuit::new("c1");
            c.cx(q(0), q(1))?
                .cx(q(2), q(3))?
                .cx(q(0), q(2))?
                .cx(q(0), q(3))?;
            c
        }
        "c2" => {
            let mut c = Circuit::new("c2");
            c.cx(q(0), q(1))?
                .cx(q(0), q(2))?
                .cx(q(0), q(3))?
                .cx(q(0), q(1))?
                .cx(q(2), q(3))?;
            c
        }
        "c3" => {
            let mut c = Circuit::new("c3");
            c.h(q(0))?
                .cp(1.57, q(1), q(0))?
                .cp(0.785, q(2), q(0))?
                .cp(0.393, q(3), q(0))?
                .h(q(1))?;
            c
        }
        "cgr" => {
            let mut c = Circuit::new("cgr");
            c.cx(q(0), q(1))?
                .h(q(1))?
                .cx(q(0), q(2))?
                .rz(0.3, q(2))?
                .cx(q(0), q(3))?;
            c
        }
        "qft" => Circuit::qft(num_qubits)?,
        "ghz" => Circuit::ghz(num_qubits)?,
        other => {
            anyhow::bail!("Unknown demo: '{other}'. Available: c1, c2, c3, qft, ghz, cgr")
        }
    };
    Ok(circuit)
}

/// Execute the demo command.
pub fn execute(
    name: &str,
    num_qubits: u32,
    overrides: &PackOverrides,
    out: &OutputOptions,
) -> Result<()> {
    let circuit = demo_circuit(name, num_qubits)?;
    eprintln!(
        "{} Packing demo {} ({} qubits, {} ops)",
        style("→").cyan().bold(),
        style(circuit.name()).green(),
        circuit.num_qubits(),
        circuit.len()
    );
    for op in circuit.operations() {
        eprintln!("  {}", style(op).dim());
    }

    let config = resolve_config(None, overrides)?;
    let compiled = Pipeline::from_config(config).run(&circuit)?;

    write_result(&compiled, out)
}
