use std::fmt::Write as FmtWrite;
use std::io::Write;

use petgraph::visit::EdgeRef;

use crate::{BondOrder, Molecule};

/// Exports a built molecule to a DOT file and optionally renders it as an
/// image via the Graphviz `dot` binary (which must be on the PATH).
pub fn visualize_molecule(
    mol: &Molecule,
    output_dot: &str,
    output_image: Option<&str>,
) -> Result<(), String> {
    let dot_string = generate_dot(mol);

    let mut file = std::fs::File::create(output_dot)
        .map_err(|e| format!("Failed to create DOT file: {}", e))?;
    file.write_all(dot_string.as_bytes())
        .map_err(|e| format!("Failed to write to DOT file: {}", e))?;

    if let Some(image_path) = output_image {
        let status = std::process::Command::new("dot")
            .args(["-Tpng", output_dot, "-o", image_path])
            .status()
            .map_err(|e| format!("Failed to execute Graphviz 'dot' command: {}", e))?;

        if !status.success() {
            return Err(format!(
                "Graphviz 'dot' command failed with status: {}",
                status
            ));
        }
    }

    Ok(())
}

/// DOT representation with element colors and per-order edge styling.
pub fn generate_dot(mol: &Molecule) -> String {
    let mut out = String::new();
    writeln!(out, "graph Molecule {{").unwrap();
    writeln!(out, "    layout=neato; overlap=false;").unwrap();

    for node in mol.graph().node_indices() {
        let atom = &mol.graph()[node];
        let color = match atom.symbol.as_str() {
            "C" => "black",
            "O" => "red",
            "N" => "blue",
            "S" => "gold",
            "F" | "Cl" => "green",
            "Br" => "brown",
            "I" => "purple",
            _ => "gray",
        };
        let label = if atom.charge != 0 {
            format!("{}{:+}", atom.symbol, atom.charge)
        } else {
            atom.symbol.clone()
        };
        writeln!(
            out,
            "    {} [label=\"{}\", fontcolor={}];",
            node.index(),
            label,
            color
        )
        .unwrap();
    }

    for edge in mol.graph().edge_references() {
        let style = match edge.weight() {
            BondOrder::Single => "",
            BondOrder::Double => " [penwidth=2, label=\"=\"]",
            BondOrder::Triple => " [penwidth=3, label=\"#\"]",
            BondOrder::Aromatic => " [style=dashed]",
        };
        writeln!(
            out,
            "    {} -- {}{};",
            edge.source().index(),
            edge.target().index(),
            style
        )
        .unwrap();
    }

    writeln!(out, "}}").unwrap();
    out
}
