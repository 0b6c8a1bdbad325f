use std::collections::{HashMap, HashSet};
use std::fmt;

use lazy_static::lazy_static;
use petgraph::graph::NodeIndex;
use serde::Deserialize;
use thiserror::Error;
use tracing::*;

use crate::{implicit_hydrogens, Atom, BondOrder, MoleculeGraph};

/// Hard ceiling on the number of drawn nodes. The longest-chain search is
/// exponential in the worst case, so oversized inputs are rejected before
/// any traversal runs.
pub const MAX_ATOMS: usize = 64;

#[derive(Error, Debug)]
pub enum StructuralError {
    #[error("structure contains no atoms")]
    Empty,
    #[error("structure has {count} atoms; the analyzer accepts at most {max}")]
    TooLarge { count: usize, max: usize },
    #[error("bond references unknown atom id '{0}'")]
    UnknownAtomId(String),
    #[error("unrecognized atom label '{0}'")]
    UnknownLabel(String),
    #[error("unknown bond type '{0}'")]
    UnknownBondType(String),
}

/// A node id as drawn: the canvas sends numbers, saved structures send
/// strings. Both normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
    Num(i64),
    Str(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Num(n) => write!(f, "{}", n),
            NodeId::Str(s) => write!(f, "{}", s),
        }
    }
}

/// One drawn atom, as received from the drawing layer.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default)]
    pub charge: i32,
}

/// One drawn bond. `from`/`to` are accepted as aliases because the original
/// canvas payload used those keys.
#[derive(Debug, Clone, Deserialize)]
pub struct BondInput {
    #[serde(alias = "from")]
    pub source: NodeId,
    #[serde(alias = "to")]
    pub target: NodeId,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A bond as recorded at build time. Self-bonds and duplicate bonds are kept
/// here for the validator, but excluded from the adjacency matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondRecord {
    pub source: usize,
    pub target: usize,
    pub order: BondOrder,
}

lazy_static! {
    /// Closed table of grouped shorthand labels. Each expands to exactly one
    /// heavy atom plus a pinned hydrogen count; labels outside this table
    /// that are not plain element symbols are rejected.
    static ref GROUP_SHORTHANDS: HashMap<&'static str, (&'static str, u8)> = {
        let mut m = HashMap::new();
        m.insert("CH4", ("C", 4));
        m.insert("CH3", ("C", 3));
        m.insert("CH2", ("C", 2));
        m.insert("CH", ("C", 1));
        m.insert("NH3", ("N", 3));
        m.insert("NH2", ("N", 2));
        m.insert("NH", ("N", 1));
        m.insert("OH", ("O", 1));
        m.insert("SH", ("S", 1));
        // Single-heavy-atom model: only the central carbon and its hydrogen
        // survive; pendant oxygens are not synthesized.
        m.insert("COOH", ("C", 1));
        m.insert("CHO", ("C", 1));
        m
    };
}

/// The validated, indexed molecular graph. Immutable once built.
#[derive(Debug, Clone)]
pub struct Molecule {
    graph: MoleculeGraph,
    bonds: Vec<BondRecord>,
    matrix: Vec<Vec<f64>>,
    warnings: Vec<String>,
}

/// "cl" -> "Cl", "BR" -> "Br".
fn normalize_symbol(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => {
            first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
        }
        None => String::new(),
    }
}

/// Resolves a drawn label to an element symbol and an optional hydrogen
/// override. Labels of one or two letters are element symbols (unknown ones
/// are tolerated; the valence layer warns about them); anything longer must
/// be a known shorthand.
fn parse_label(label: &str) -> Result<(String, Option<u8>), StructuralError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(StructuralError::UnknownLabel(label.to_string()));
    }

    let upper = trimmed.to_ascii_uppercase();
    if let Some(&(element, hydrogens)) = GROUP_SHORTHANDS.get(upper.as_str()) {
        return Ok((element.to_string(), Some(hydrogens)));
    }

    if trimmed.len() <= 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Ok((normalize_symbol(trimmed), None));
    }

    Err(StructuralError::UnknownLabel(label.to_string()))
}

/// Builds a [`Molecule`] from raw drawn nodes and bonds.
///
/// Fails on: an empty node list, more than [`MAX_ATOMS`] nodes, a bond
/// referencing an unknown id, an unrecognized label, or an unknown bond
/// type. Duplicate node ids are NOT fatal here; the validator reports them.
pub fn build_molecule(
    nodes: &[NodeRecord],
    bonds: &[BondInput],
) -> Result<Molecule, StructuralError> {
    if nodes.is_empty() {
        return Err(StructuralError::Empty);
    }
    if nodes.len() > MAX_ATOMS {
        return Err(StructuralError::TooLarge {
            count: nodes.len(),
            max: MAX_ATOMS,
        });
    }

    let n = nodes.len();
    let mut graph = MoleculeGraph::default();
    let mut id_to_index: HashMap<String, usize> = HashMap::new();
    let mut h_overrides: Vec<Option<u8>> = Vec::with_capacity(n);

    for (i, node) in nodes.iter().enumerate() {
        let (symbol, h_override) = parse_label(&node.label)?;
        let id = node.id.to_string();
        // First occurrence wins; the duplicate is still materialized so the
        // validator can flag it.
        id_to_index.entry(id.clone()).or_insert(i);
        h_overrides.push(h_override);
        graph.add_node(Atom {
            id,
            symbol,
            charge: node.charge,
            implicit_hydrogens: 0,
            aromatic: false,
        });
    }

    let mut records: Vec<BondRecord> = Vec::with_capacity(bonds.len());
    let mut matrix = vec![vec![0.0; n]; n];
    let mut seen_pairs: HashSet<(usize, usize)> = HashSet::new();

    for bond in bonds {
        let order = BondOrder::from_label(&bond.kind)
            .ok_or_else(|| StructuralError::UnknownBondType(bond.kind.clone()))?;
        let source = *id_to_index
            .get(&bond.source.to_string())
            .ok_or_else(|| StructuralError::UnknownAtomId(bond.source.to_string()))?;
        let target = *id_to_index
            .get(&bond.target.to_string())
            .ok_or_else(|| StructuralError::UnknownAtomId(bond.target.to_string()))?;

        records.push(BondRecord {
            source,
            target,
            order,
        });

        if source == target {
            debug!("skipping self-bond on atom {}", source);
            continue;
        }
        let key = (source.min(target), source.max(target));
        if !seen_pairs.insert(key) {
            debug!("skipping duplicate bond {:?}", key);
            continue;
        }

        matrix[source][target] = order.as_f64();
        matrix[target][source] = order.as_f64();
        graph.add_edge(NodeIndex::new(source), NodeIndex::new(target), order);
    }

    let mut warnings = Vec::new();
    for i in 0..n {
        let order_sum: f64 = matrix[i].iter().sum();
        let aromatic = matrix[i].iter().any(|&o| o == 1.5);
        let atom = &graph[NodeIndex::new(i)];
        let hydrogens = match h_overrides[i] {
            Some(h) => h,
            None => implicit_hydrogens(atom, order_sum),
        };
        let atom = &mut graph[NodeIndex::new(i)];
        atom.implicit_hydrogens = hydrogens;
        atom.aromatic = aromatic;

        if n > 1 && order_sum == 0.0 {
            warnings.push(format!(
                "atom {} ({}) is not bonded to anything",
                i, atom.symbol
            ));
        }
    }

    trace!("built molecule with {} atoms, {} bonds", n, records.len());
    Ok(Molecule {
        graph,
        bonds: records,
        matrix,
        warnings,
    })
}

impl Molecule {
    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Count of bonds as drawn, including self-bonds and duplicates.
    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn atom(&self, index: usize) -> &Atom {
        &self.graph[NodeIndex::new(index)]
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.graph.node_indices().map(move |i| &self.graph[i])
    }

    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }

    pub fn bonds(&self) -> &[BondRecord] {
        &self.bonds
    }

    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    pub fn build_warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn total_charge(&self) -> i32 {
        self.atoms().map(|a| a.charge).sum()
    }

    /// Neighbors of `index` in ascending index order, read off the matrix so
    /// traversal order never depends on edge insertion order.
    pub fn neighbors(&self, index: usize) -> Vec<(usize, BondOrder)> {
        self.matrix[index]
            .iter()
            .enumerate()
            .filter(|(_, &o)| o != 0.0)
            .filter_map(|(j, &o)| BondOrder::from_f64(o).map(|order| (j, order)))
            .collect()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<BondOrder> {
        BondOrder::from_f64(self.matrix[a][b])
    }

    pub fn degree(&self, index: usize) -> usize {
        self.matrix[index].iter().filter(|&&o| o != 0.0).count()
    }

    pub fn order_sum(&self, index: usize) -> f64 {
        self.matrix[index].iter().sum()
    }

    /// Every bonded unordered pair (i < j) with its order, in matrix order.
    pub fn bond_pairs(&self) -> Vec<(usize, usize, BondOrder)> {
        let n = self.atom_count();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(order) = BondOrder::from_f64(self.matrix[i][j]) {
                    pairs.push((i, j, order));
                }
            }
        }
        pairs
    }

    /// Does this atom carry any hydrogen, drawn or inferred?
    pub fn has_hydrogen(&self, index: usize) -> bool {
        if self.atom(index).implicit_hydrogens > 0 {
            return true;
        }
        self.neighbors(index)
            .iter()
            .any(|&(j, _)| self.atom(j).is_hydrogen())
    }

    /// Longest simple path through the carbon-only subgraph, found by
    /// exhaustive DFS from every carbon.
    ///
    /// Ties in length are broken deterministically: each chain is
    /// canonicalized to the lexicographically smaller of its forward and
    /// reversed index sequence, and the smallest canonical sequence wins.
    pub fn longest_carbon_chain(&self) -> Vec<usize> {
        let mut best: Vec<usize> = Vec::new();
        for i in 0..self.atom_count() {
            if !self.atom(i).is_carbon() {
                continue;
            }
            let mut visited = HashSet::new();
            let chain = self.dfs_longest_path(i, &mut visited);
            if chain_beats(&chain, &best) {
                best = chain;
            }
        }
        best
    }

    fn dfs_longest_path(&self, current: usize, visited: &mut HashSet<usize>) -> Vec<usize> {
        visited.insert(current);
        let mut longest = vec![current];
        for (neighbor, _) in self.neighbors(current) {
            if self.atom(neighbor).is_carbon() && !visited.contains(&neighbor) {
                let mut branch_visited = visited.clone();
                let path = self.dfs_longest_path(neighbor, &mut branch_visited);
                let mut candidate = vec![current];
                candidate.extend(path);
                if chain_beats(&candidate, &longest) {
                    longest = candidate;
                }
            }
        }
        longest
    }
}

fn chain_key(chain: &[usize]) -> Vec<usize> {
    let forward = chain.to_vec();
    let mut reversed = forward.clone();
    reversed.reverse();
    forward.min(reversed)
}

fn chain_beats(candidate: &[usize], best: &[usize]) -> bool {
    if candidate.len() != best.len() {
        return candidate.len() > best.len();
    }
    !best.is_empty() && chain_key(candidate) < chain_key(best)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    pub fn node(id: i64, label: &str) -> NodeRecord {
        NodeRecord {
            id: NodeId::Num(id),
            label: label.to_string(),
            charge: 0,
        }
    }

    pub fn charged(id: i64, label: &str, charge: i32) -> NodeRecord {
        NodeRecord {
            id: NodeId::Num(id),
            label: label.to_string(),
            charge,
        }
    }

    pub fn bond(source: i64, target: i64, kind: &str) -> BondInput {
        BondInput {
            source: NodeId::Num(source),
            target: NodeId::Num(target),
            kind: kind.to_string(),
        }
    }

    /// Chain of n carbons joined by single bonds.
    pub fn alkane(n: i64) -> (Vec<NodeRecord>, Vec<BondInput>) {
        let nodes = (0..n).map(|i| node(i, "C")).collect();
        let bonds = (0..n - 1).map(|i| bond(i, i + 1, "single")).collect();
        (nodes, bonds)
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;

    #[test]
    fn methane_from_a_single_node() {
        let mol = build_molecule(&[node(1, "C")], &[]).unwrap();
        assert_eq!(mol.atom_count(), 1);
        assert_eq!(mol.atom(0).implicit_hydrogens, 4);
        assert!(mol.build_warnings().is_empty());
    }

    #[test]
    fn symbols_are_normalized() {
        let mol = build_molecule(&[node(1, "cl"), node(2, "BR")], &[bond(1, 2, "single")]).unwrap();
        assert_eq!(mol.atom(0).symbol, "Cl");
        assert_eq!(mol.atom(1).symbol, "Br");
    }

    #[test]
    fn shorthand_labels_expand() {
        let mol = build_molecule(
            &[node(1, "CH3"), node(2, "OH")],
            &[bond(1, 2, "single")],
        )
        .unwrap();
        assert_eq!(mol.atom(0).symbol, "C");
        assert_eq!(mol.atom(0).implicit_hydrogens, 3);
        assert_eq!(mol.atom(1).symbol, "O");
        assert_eq!(mol.atom(1).implicit_hydrogens, 1);
    }

    #[test]
    fn unknown_shorthand_is_rejected() {
        let err = build_molecule(&[node(1, "XYZ9")], &[]).unwrap_err();
        assert!(matches!(err, StructuralError::UnknownLabel(_)));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            build_molecule(&[], &[]),
            Err(StructuralError::Empty)
        ));
    }

    #[test]
    fn oversized_input_is_rejected() {
        let nodes: Vec<_> = (0..(MAX_ATOMS as i64 + 1)).map(|i| node(i, "C")).collect();
        assert!(matches!(
            build_molecule(&nodes, &[]),
            Err(StructuralError::TooLarge { .. })
        ));
    }

    #[test]
    fn dangling_bond_is_rejected() {
        let err =
            build_molecule(&[node(1, "C")], &[bond(1, 99, "single")]).unwrap_err();
        assert!(matches!(err, StructuralError::UnknownAtomId(_)));
    }

    #[test]
    fn unknown_bond_type_is_rejected() {
        let err = build_molecule(
            &[node(1, "C"), node(2, "C")],
            &[bond(1, 2, "quadruple")],
        )
        .unwrap_err();
        assert!(matches!(err, StructuralError::UnknownBondType(_)));
    }

    #[test]
    fn matrix_is_symmetric() {
        let (nodes, bonds) = alkane(3);
        let mol = build_molecule(&nodes, &bonds).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(mol.matrix()[i][j], mol.matrix()[j][i]);
            }
        }
        assert_eq!(mol.bond_between(0, 1), Some(BondOrder::Single));
        assert_eq!(mol.bond_between(0, 2), None);
    }

    #[test]
    fn duplicate_bonds_kept_out_of_matrix() {
        let mol = build_molecule(
            &[node(1, "C"), node(2, "C")],
            &[bond(1, 2, "single"), bond(2, 1, "single")],
        )
        .unwrap();
        // Both records survive for the validator, only one edge in the matrix.
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(mol.degree(0), 1);
        assert_eq!(mol.atom(0).implicit_hydrogens, 3);
    }

    #[test]
    fn isolated_atom_warning() {
        let mol = build_molecule(&[node(1, "C"), node(2, "O")], &[]).unwrap();
        assert_eq!(mol.build_warnings().len(), 2);
        assert!(mol.build_warnings()[0].contains("not bonded"));
    }

    #[test]
    fn ethene_hydrogens() {
        let mol = build_molecule(
            &[node(1, "C"), node(2, "C")],
            &[bond(1, 2, "double")],
        )
        .unwrap();
        assert_eq!(mol.atom(0).implicit_hydrogens, 2);
        assert_eq!(mol.atom(1).implicit_hydrogens, 2);
    }

    #[test]
    fn aromatic_bonds_mark_atoms() {
        let mol = build_molecule(
            &[node(1, "C"), node(2, "C")],
            &[bond(1, 2, "aromatic")],
        )
        .unwrap();
        assert!(mol.atom(0).aromatic);
        // 4 - 1.5 = 2.5 floors to 2.
        assert_eq!(mol.atom(0).implicit_hydrogens, 2);
    }

    #[test]
    fn longest_chain_straight() {
        let (nodes, bonds) = alkane(5);
        let mol = build_molecule(&nodes, &bonds).unwrap();
        assert_eq!(mol.longest_carbon_chain(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn longest_chain_skips_heteroatoms() {
        // C-C-O-C: the oxygen breaks the chain.
        let mol = build_molecule(
            &[node(1, "C"), node(2, "C"), node(3, "O"), node(4, "C")],
            &[
                bond(1, 2, "single"),
                bond(2, 3, "single"),
                bond(3, 4, "single"),
            ],
        )
        .unwrap();
        assert_eq!(mol.longest_carbon_chain().len(), 2);
    }

    #[test]
    fn longest_chain_tie_break_is_deterministic() {
        // Central carbon 0 with three single-carbon arms: all maximal chains
        // have length 3; the canonical-smallest one must win.
        let mol = build_molecule(
            &[node(0, "C"), node(1, "C"), node(2, "C"), node(3, "C")],
            &[
                bond(0, 1, "single"),
                bond(0, 2, "single"),
                bond(0, 3, "single"),
            ],
        )
        .unwrap();
        assert_eq!(mol.longest_carbon_chain(), vec![1, 0, 2]);
    }

    #[test]
    fn string_and_numeric_ids_mix() {
        let nodes = vec![
            NodeRecord {
                id: NodeId::Str("a".to_string()),
                label: "C".to_string(),
                charge: 0,
            },
            NodeRecord {
                id: NodeId::Num(2),
                label: "C".to_string(),
                charge: 0,
            },
        ];
        let bonds = vec![BondInput {
            source: NodeId::Str("a".to_string()),
            target: NodeId::Num(2),
            kind: "single".to_string(),
        }];
        let mol = build_molecule(&nodes, &bonds).unwrap();
        assert_eq!(mol.degree(0), 1);
    }
}
