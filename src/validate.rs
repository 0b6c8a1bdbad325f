use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::*;

use crate::{check_valence, BondOrder, Molecule, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationStatus {
    #[serde(rename = "VALID")]
    Valid,
    #[serde(rename = "AMBIGUOUS")]
    Ambiguous,
    #[serde(rename = "INVALID")]
    Invalid,
    #[serde(rename = "ERROR")]
    Error,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Valid => "VALID",
            ValidationStatus::Ambiguous => "AMBIGUOUS",
            ValidationStatus::Invalid => "INVALID",
            ValidationStatus::Error => "ERROR",
        }
    }
}

/// Combined outcome of the four validation passes plus ambiguity detection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub status: ValidationStatus,
    pub confidence: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub ambiguities: Vec<String>,
    pub suggestions: Vec<String>,
    pub structural_ok: bool,
    pub semantic_ok: bool,
    pub geometric_ok: bool,
    pub connectivity_ok: bool,
}

impl ValidationReport {
    /// Report used when the molecule never came into existence.
    pub fn construction_failure(message: String) -> Self {
        ValidationReport {
            status: ValidationStatus::Error,
            confidence: 0.0,
            errors: vec![message],
            warnings: Vec::new(),
            ambiguities: Vec::new(),
            suggestions: Vec::new(),
            structural_ok: false,
            semantic_ok: false,
            geometric_ok: false,
            connectivity_ok: false,
        }
    }
}

/// Runs the structural, semantic, geometric, and connectivity passes plus
/// ambiguity detection, and folds the results into one report.
///
/// Confidence contract: start at 1.0; subtract 0.2 per error, 0.05 per
/// warning, 0.1 per ambiguity, and 0.15 per failed category; clamp to [0,1].
/// A category fails when its pass produced at least one error.
pub fn validate_molecule(mol: &Molecule) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut ambiguities = Vec::new();
    let mut suggestions = Vec::new();

    let labels = component_labels(mol);

    let structural_ok = structural_pass(mol, &mut errors, &mut warnings);
    let semantic_ok = semantic_pass(mol, &mut errors, &mut warnings);
    let geometric_ok = geometric_pass(mol, &labels, &mut warnings);
    let connectivity_ok = connectivity_pass(mol, &labels, &mut errors);
    ambiguity_pass(mol, &mut ambiguities, &mut suggestions);

    let failed_categories = [structural_ok, semantic_ok, geometric_ok, connectivity_ok]
        .iter()
        .filter(|ok| !**ok)
        .count();

    let confidence = (1.0
        - 0.2 * errors.len() as f64
        - 0.05 * warnings.len() as f64
        - 0.1 * ambiguities.len() as f64
        - 0.15 * failed_categories as f64)
        .clamp(0.0, 1.0);

    let status = if !errors.is_empty() {
        ValidationStatus::Invalid
    } else if !ambiguities.is_empty() {
        ValidationStatus::Ambiguous
    } else {
        ValidationStatus::Valid
    };

    debug!(
        "validation: status={:?} errors={} warnings={} ambiguities={}",
        status,
        errors.len(),
        warnings.len(),
        ambiguities.len()
    );

    ValidationReport {
        status,
        confidence,
        errors,
        warnings,
        ambiguities,
        suggestions,
        structural_ok,
        semantic_ok,
        geometric_ok,
        connectivity_ok,
    }
}

fn structural_pass(mol: &Molecule, errors: &mut Vec<String>, warnings: &mut Vec<String>) -> bool {
    let before = errors.len();
    let n = mol.atom_count();

    if n == 0 {
        errors.push("structure contains no atoms".to_string());
    }

    let mut seen_ids: HashMap<&str, usize> = HashMap::new();
    for (i, atom) in mol.atoms().enumerate() {
        if let Some(&first) = seen_ids.get(atom.id.as_str()) {
            errors.push(format!(
                "duplicate atom id '{}' (atoms {} and {})",
                atom.id, first, i
            ));
        } else {
            seen_ids.insert(&atom.id, i);
        }
    }

    let mut seen_bonds: HashSet<(usize, usize)> = HashSet::new();
    for record in mol.bonds() {
        if record.source >= n || record.target >= n {
            errors.push(format!(
                "bond endpoint out of range: {} - {}",
                record.source, record.target
            ));
            continue;
        }
        if record.source == record.target {
            warnings.push(format!("atom {} is bonded to itself", record.source));
            continue;
        }
        let key = (
            record.source.min(record.target),
            record.source.max(record.target),
        );
        if !seen_bonds.insert(key) {
            warnings.push(format!(
                "duplicate bond between atoms {} and {}",
                key.0, key.1
            ));
        }
    }

    errors.len() == before
}

fn semantic_pass(mol: &Molecule, errors: &mut Vec<String>, warnings: &mut Vec<String>) -> bool {
    let before = errors.len();

    for (i, atom) in mol.atoms().enumerate() {
        if let Some(violation) = check_valence(i, atom, mol.order_sum(i)) {
            match violation.severity {
                Severity::Error => errors.push(violation.message),
                Severity::Warning => warnings.push(violation.message),
            }
        }
        if atom.charge.abs() > 3 {
            warnings.push(format!(
                "atom {} has an unusually large charge of {:+}",
                i, atom.charge
            ));
        }
    }

    let total = mol.total_charge();
    if !(-2..=2).contains(&total) {
        warnings.push(format!(
            "total charge {:+} is outside the expected range -2..=+2",
            total
        ));
    }

    errors.len() == before
}

/// One cycle per connected component, found via the first back-edge of a
/// DFS. Fused or bridged ring systems therefore surface only one of their
/// rings; a minimum cycle basis is out of scope for classroom inputs.
fn geometric_pass(mol: &Molecule, labels: &[usize], warnings: &mut Vec<String>) -> bool {
    let component_count = labels.iter().copied().max().map_or(0, |m| m + 1);
    for component in 0..component_count {
        let root = match labels.iter().position(|&l| l == component) {
            Some(root) => root,
            None => continue,
        };
        let mut stack = Vec::new();
        let mut visited = HashSet::new();
        if let Some(cycle) = dfs_find_cycle(mol, root, None, &mut stack, &mut visited) {
            trace!("found ring of size {} in component {}", cycle.len(), component);
            match cycle.len() {
                3 => warnings.push(
                    "3-membered ring detected: high ring strain, check the drawing".to_string(),
                ),
                4 => warnings.push(
                    "4-membered ring detected: significant ring strain".to_string(),
                ),
                _ => {}
            }
        }
    }
    true
}

fn dfs_find_cycle(
    mol: &Molecule,
    current: usize,
    parent: Option<usize>,
    stack: &mut Vec<usize>,
    visited: &mut HashSet<usize>,
) -> Option<Vec<usize>> {
    visited.insert(current);
    stack.push(current);
    for (neighbor, _) in mol.neighbors(current) {
        if Some(neighbor) == parent {
            continue;
        }
        if let Some(pos) = stack.iter().position(|&x| x == neighbor) {
            return Some(stack[pos..].to_vec());
        }
        if !visited.contains(&neighbor) {
            if let Some(cycle) = dfs_find_cycle(mol, neighbor, Some(current), stack, visited) {
                return Some(cycle);
            }
        }
    }
    stack.pop();
    None
}

fn connectivity_pass(mol: &Molecule, labels: &[usize], errors: &mut Vec<String>) -> bool {
    let component_count = labels.iter().copied().max().map_or(0, |m| m + 1);
    if component_count <= 1 {
        return true;
    }

    let mut sizes = vec![0usize; component_count];
    for &label in labels {
        sizes[label] += 1;
    }
    let largest = sizes.iter().copied().max().unwrap_or(0);
    let disconnected = mol.atom_count() - largest;
    errors.push(format!(
        "structure is disconnected: {} atom(s) are not connected to the main fragment",
        disconnected
    ));
    false
}

fn component_labels(mol: &Molecule) -> Vec<usize> {
    let n = mol.atom_count();
    let mut labels = vec![usize::MAX; n];
    let mut next = 0;
    for start in 0..n {
        if labels[start] != usize::MAX {
            continue;
        }
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            if labels[i] != usize::MAX {
                continue;
            }
            labels[i] = next;
            for (j, _) in mol.neighbors(i) {
                if labels[j] == usize::MAX {
                    stack.push(j);
                }
            }
        }
        next += 1;
    }
    labels
}

/// Isomerism and chain-selection notices. These never become errors; they
/// downgrade the status to AMBIGUOUS and cap the final confidence.
fn ambiguity_pass(mol: &Molecule, ambiguities: &mut Vec<String>, suggestions: &mut Vec<String>) {
    let mut ez_found = false;
    for (i, j, order) in mol.bond_pairs() {
        if order == BondOrder::Double && mol.atom(i).is_carbon() && mol.atom(j).is_carbon() {
            ambiguities.push(format!(
                "double bond between atoms {} and {} may have E/Z (cis/trans) isomers",
                i, j
            ));
            ez_found = true;
        }
    }
    if ez_found {
        suggestions
            .push("indicate the configuration around each C=C double bond".to_string());
    }

    // Stereocenter sniffing compares immediate neighbor elements only; real
    // chirality would require comparing whole substituent subgraphs.
    let mut stereo_found = false;
    for i in 0..mol.atom_count() {
        let atom = mol.atom(i);
        if !atom.is_carbon() {
            continue;
        }
        let mut kinds: HashSet<&str> = mol
            .neighbors(i)
            .iter()
            .map(|&(j, _)| mol.atom(j).symbol.as_str())
            .collect();
        if atom.implicit_hydrogens > 0 {
            kinds.insert("H");
        }
        match kinds.len() {
            4 => {
                ambiguities.push(format!(
                    "atom {} may be a stereocenter (four distinct substituent types)",
                    i
                ));
                stereo_found = true;
            }
            3 => {
                ambiguities.push(format!(
                    "atom {} is a possible stereocenter (three distinct substituent types)",
                    i
                ));
                stereo_found = true;
            }
            _ => {}
        }
    }
    if stereo_found {
        suggestions.push(
            "check the 3D arrangement at possible stereocenters".to_string(),
        );
    }

    let branched = (0..mol.atom_count())
        .filter(|&i| mol.atom(i).is_carbon() && mol.degree(i) >= 3)
        .count();
    if branched >= 3 {
        ambiguities.push(format!(
            "complex branching: {} carbons have three or more connections",
            branched
        ));
        suggestions.push("verify the main chain selection for branched structures".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_molecule;
    use crate::graph::testutil::*;

    #[test]
    fn clean_alkane_is_valid() {
        let (nodes, bonds) = alkane(3);
        let mol = build_molecule(&nodes, &bonds).unwrap();
        let report = validate_molecule(&mol);
        assert_eq!(report.status, ValidationStatus::Valid);
        assert_eq!(report.confidence, 1.0);
        assert!(report.structural_ok && report.semantic_ok);
        assert!(report.geometric_ok && report.connectivity_ok);
    }

    #[test]
    fn disconnected_structure_is_invalid() {
        let mol = build_molecule(&[node(1, "C"), node(2, "C")], &[]).unwrap();
        let report = validate_molecule(&mol);
        assert_eq!(report.status, ValidationStatus::Invalid);
        assert!(!report.connectivity_ok);
        assert!(report.errors[0].contains("disconnected"));
    }

    #[test]
    fn duplicate_ids_are_fatal() {
        let mol = build_molecule(
            &[node(7, "C"), node(7, "O")],
            &[],
        )
        .unwrap();
        let report = validate_molecule(&mol);
        assert_eq!(report.status, ValidationStatus::Invalid);
        assert!(report.errors.iter().any(|e| e.contains("duplicate atom id")));
    }

    #[test]
    fn self_bond_is_only_a_warning() {
        let mol = build_molecule(
            &[node(1, "C"), node(2, "C")],
            &[bond(1, 2, "single"), bond(1, 1, "single")],
        )
        .unwrap();
        let report = validate_molecule(&mol);
        assert_eq!(report.status, ValidationStatus::Valid);
        assert!(report.warnings.iter().any(|w| w.contains("itself")));
    }

    #[test]
    fn net_charge_warning_costs_a_twentieth() {
        let mol = build_molecule(&[charged(1, "C", 3)], &[]).unwrap();
        let report = validate_molecule(&mol);
        assert_eq!(report.status, ValidationStatus::Valid);
        assert_eq!(report.warnings.len(), 1);
        assert!((report.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn large_atom_charge_warns() {
        let mol = build_molecule(&[charged(1, "N", 4)], &[]).unwrap();
        let report = validate_molecule(&mol);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("unusually large charge")));
    }

    #[test]
    fn under_bonded_oxygen_is_a_semantic_error() {
        let mol = build_molecule(&[charged(1, "O", -2)], &[]).unwrap();
        let report = validate_molecule(&mol);
        assert_eq!(report.status, ValidationStatus::Invalid);
        assert!(!report.semantic_ok);
    }

    #[test]
    fn cyclopropane_strain_warning() {
        let mol = build_molecule(
            &[node(1, "C"), node(2, "C"), node(3, "C")],
            &[
                bond(1, 2, "single"),
                bond(2, 3, "single"),
                bond(3, 1, "single"),
            ],
        )
        .unwrap();
        let report = validate_molecule(&mol);
        assert!(report.warnings.iter().any(|w| w.contains("3-membered ring")));
    }

    #[test]
    fn benzene_ring_has_no_strain_warning() {
        let mut bonds = Vec::new();
        for i in 0..6 {
            let kind = if i % 2 == 0 { "double" } else { "single" };
            bonds.push(bond(i, (i + 1) % 6, kind));
        }
        let nodes: Vec<_> = (0..6).map(|i| node(i, "C")).collect();
        let mol = build_molecule(&nodes, &bonds).unwrap();
        let report = validate_molecule(&mol);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn double_bond_raises_ez_ambiguity() {
        let mol = build_molecule(
            &[node(1, "C"), node(2, "C")],
            &[bond(1, 2, "double")],
        )
        .unwrap();
        let report = validate_molecule(&mol);
        assert_eq!(report.status, ValidationStatus::Ambiguous);
        assert!(report.ambiguities[0].contains("E/Z"));
        assert!(!report.suggestions.is_empty());
    }

    #[test]
    fn four_distinct_neighbors_flag_a_stereocenter() {
        // C bonded to F, Cl, Br; the fourth distinct type is the implicit H.
        let mol = build_molecule(
            &[node(1, "C"), node(2, "F"), node(3, "Cl"), node(4, "Br")],
            &[
                bond(1, 2, "single"),
                bond(1, 3, "single"),
                bond(1, 4, "single"),
            ],
        )
        .unwrap();
        let report = validate_molecule(&mol);
        assert!(report
            .ambiguities
            .iter()
            .any(|a| a.contains("four distinct substituent types")));
    }

    #[test]
    fn heavy_branching_raises_a_notice() {
        // Three quaternary-ish centers in a row.
        let mut nodes = vec![node(0, "C"), node(1, "C"), node(2, "C")];
        let mut bonds = vec![bond(0, 1, "single"), bond(1, 2, "single")];
        let mut next = 3;
        for center in 0..3 {
            for _ in 0..2 {
                nodes.push(node(next, "C"));
                bonds.push(bond(center, next, "single"));
                next += 1;
            }
        }
        let mol = build_molecule(&nodes, &bonds).unwrap();
        let report = validate_molecule(&mol);
        assert!(report
            .ambiguities
            .iter()
            .any(|a| a.contains("complex branching")));
    }

    #[test]
    fn confidence_is_clamped_to_zero() {
        // Several disconnected undersized fragments drive the raw score
        // negative; the report must clamp.
        let nodes: Vec<_> = (0..6).map(|i| charged(i, "O", -2)).collect();
        let mol = build_molecule(&nodes, &[]).unwrap();
        let report = validate_molecule(&mol);
        assert_eq!(report.status, ValidationStatus::Invalid);
        assert_eq!(report.confidence, 0.0);
    }
}
