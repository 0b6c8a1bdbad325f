use std::io::Read;

use anyhow::{bail, Context, Result};
use sketchmol::*;

const USAGE: &str = "usage: sketchmol [--validate] [--dot <file>] [input.json]

Reads {\"nodes\": [...], \"bonds\": [...]} JSON from the given file (or stdin)
and prints the analysis as JSON. --validate prints the raw validation report
instead; --dot additionally writes a Graphviz rendering of the structure.";

fn main() -> Result<()> {
    let level = std::env::var("SKETCHMOL_LOG").unwrap_or_else(|_| "info".to_string());
    init_logging(&level);

    let mut validate_only = false;
    let mut dot_path: Option<String> = None;
    let mut input_path: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--validate" => validate_only = true,
            "--dot" => {
                dot_path = Some(args.next().context("--dot requires a file argument")?);
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ if arg.starts_with('-') => bail!("unknown flag '{}'\n{}", arg, USAGE),
            _ => input_path = Some(arg),
        }
    }

    let raw = match &input_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let request: StructureRequest =
        serde_json::from_str(&raw).context("failed to parse input JSON")?;

    if let Some(dot) = &dot_path {
        match build_molecule(&request.nodes, &request.bonds) {
            Ok(mol) => {
                visualize_molecule(&mol, dot, None)
                    .map_err(|e| anyhow::anyhow!(e))
                    .context("failed to write DOT output")?;
            }
            Err(e) => eprintln!("skipping DOT output, structure did not build: {}", e),
        }
    }

    if validate_only {
        let report = validate_structure(&request.nodes, &request.bonds);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let response = analyze(&request.nodes, &request.bonds);
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
