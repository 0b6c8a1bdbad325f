use serde::{Deserialize, Serialize};
use tracing::*;

use crate::{
    build_molecule, detect_functional_groups, molecular_formula, synthesize_name,
    validate_molecule, BondInput, NodeRecord, ValidationReport, ValidationStatus,
};

/// The JSON payload the drawing layer submits.
#[derive(Debug, Clone, Deserialize)]
pub struct StructureRequest {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub bonds: Vec<BondInput>,
}

/// The full response contract of [`analyze`]. This and the raw
/// [`ValidationReport`] are the entire boundary the surrounding application
/// depends on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub success: bool,
    pub iupac_name: String,
    pub common_name: String,
    pub molecular_formula: String,
    pub functional_groups: Vec<String>,
    pub confidence: f64,
    pub structure_type: String,
    pub atom_count: usize,
    pub bond_count: usize,
    pub total_charge: i32,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub ambiguities: Vec<String>,
    pub suggestions: Vec<String>,
    pub validation_status: ValidationStatus,
}

/// Analyzes a drawn structure end to end: build, validate, detect groups,
/// synthesize a name, and merge everything into one response.
///
/// Never panics and never returns an error: construction failures come back
/// as a response with `validation_status == ERROR` and the message in
/// `errors`.
pub fn analyze(nodes: &[NodeRecord], bonds: &[BondInput]) -> AnalysisResponse {
    let mol = match build_molecule(nodes, bonds) {
        Ok(mol) => mol,
        Err(e) => {
            warn!("structure construction failed: {}", e);
            return construction_error_response(e.to_string(), nodes.len(), bonds.len());
        }
    };

    let groups = detect_functional_groups(&mol);
    let report = validate_molecule(&mol);
    let named = synthesize_name(&mol, &groups);

    // The namer's certainty is authoritative only for clean structures.
    let confidence = match report.status {
        ValidationStatus::Invalid => 0.0,
        ValidationStatus::Ambiguous => named.confidence.min(0.7),
        _ => named.confidence,
    };

    let mut group_matches = groups;
    group_matches.sort_by_key(|m| {
        (
            m.priority,
            m.atoms.iter().min().copied().unwrap_or(usize::MAX),
        )
    });
    let mut functional_groups: Vec<String> = Vec::new();
    for m in &group_matches {
        let label = m.kind.label().to_string();
        if !functional_groups.contains(&label) {
            functional_groups.push(label);
        }
    }

    let mut warnings = mol.build_warnings().to_vec();
    warnings.extend(report.warnings.iter().cloned());

    info!(
        "analyzed structure: {} ({}) status={:?} confidence={:.2}",
        named.name,
        molecular_formula(&mol),
        report.status,
        confidence
    );

    AnalysisResponse {
        success: matches!(
            report.status,
            ValidationStatus::Valid | ValidationStatus::Ambiguous
        ),
        iupac_name: named.name,
        common_name: named.common_name,
        molecular_formula: molecular_formula(&mol),
        functional_groups,
        confidence,
        structure_type: named.structure_type,
        atom_count: mol.atom_count(),
        bond_count: mol.bond_count(),
        total_charge: mol.total_charge(),
        warnings,
        errors: report.errors,
        ambiguities: report.ambiguities,
        suggestions: report.suggestions,
        validation_status: report.status,
    }
}

/// Secondary entry point: the raw validation report, for the diagnostic and
/// educational display.
pub fn validate_structure(nodes: &[NodeRecord], bonds: &[BondInput]) -> ValidationReport {
    match build_molecule(nodes, bonds) {
        Ok(mol) => validate_molecule(&mol),
        Err(e) => ValidationReport::construction_failure(e.to_string()),
    }
}

fn construction_error_response(
    message: String,
    atom_count: usize,
    bond_count: usize,
) -> AnalysisResponse {
    AnalysisResponse {
        success: false,
        iupac_name: String::new(),
        common_name: String::new(),
        molecular_formula: String::new(),
        functional_groups: Vec::new(),
        confidence: 0.0,
        structure_type: "unknown".to_string(),
        atom_count,
        bond_count,
        total_charge: 0,
        warnings: Vec::new(),
        errors: vec![message],
        ambiguities: Vec::new(),
        suggestions: Vec::new(),
        validation_status: ValidationStatus::Error,
    }
}
