use std::collections::{BTreeMap, HashMap, HashSet};

use lazy_static::lazy_static;
use tracing::*;

use crate::{
    element_name, primary_functional_group, BondOrder, FunctionalGroup, FunctionalGroupMatch,
    Molecule,
};

/// Chain-length stems, 1-indexed by carbon count. Longer chains fall back to
/// the generic "poly" stem.
pub const CHAIN_STEMS: [&str; 12] = [
    "meth", "eth", "prop", "but", "pent", "hex", "hept", "oct", "non", "dec", "undec", "dodec",
];

/// Substituent-count prefixes; counts beyond nine stay at "nona".
pub const MULTIPLIER_PREFIXES: [&str; 9] =
    ["", "di", "tri", "tetra", "penta", "hexa", "hepta", "octa", "nona"];

lazy_static! {
    static ref COMMON_NAMES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("ethene", "ethylene");
        m.insert("ethyne", "acetylene");
        m.insert("1-propene", "propylene");
        m.insert("propanone", "acetone");
        m.insert("ethanal", "acetaldehyde");
        m.insert("methanal", "formaldehyde");
        m.insert("ethanoic acid", "acetic acid");
        m.insert("methanoic acid", "formic acid");
        m.insert("propanoic acid", "propionic acid");
        m.insert("methanol", "methyl alcohol");
        m.insert("ethanol", "ethyl alcohol");
        m.insert("methanamine", "methylamine");
        m.insert("ethanamine", "ethylamine");
        m.insert("trichloromethane", "chloroform");
        m.insert("tetrachloromethane", "carbon tetrachloride");
        m
    };

    /// -ide forms used by the generic binary-compound namer.
    static ref IDE_FORMS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("H", "hydride");
        m.insert("N", "nitride");
        m.insert("O", "oxide");
        m.insert("F", "fluoride");
        m.insert("P", "phosphide");
        m.insert("S", "sulfide");
        m.insert("Cl", "chloride");
        m.insert("Br", "bromide");
        m.insert("I", "iodide");
        m
    };
}

#[derive(Debug, Clone)]
pub struct NameResult {
    pub name: String,
    pub common_name: String,
    pub confidence: f64,
    pub structure_type: String,
}

impl NameResult {
    fn new(name: &str, common: &str, confidence: f64, structure_type: &str) -> Self {
        NameResult {
            name: name.to_string(),
            common_name: common.to_string(),
            confidence,
            structure_type: structure_type.to_string(),
        }
    }
}

pub fn stem_for(chain_length: usize) -> &'static str {
    if chain_length == 0 {
        return "poly";
    }
    CHAIN_STEMS.get(chain_length - 1).copied().unwrap_or("poly")
}

pub fn multiplier_prefix(count: usize) -> &'static str {
    MULTIPLIER_PREFIXES[count.clamp(1, 9) - 1]
}

fn alkyl_name(carbon_count: usize) -> String {
    match CHAIN_STEMS.get(carbon_count.saturating_sub(1)) {
        Some(stem) if carbon_count >= 1 => format!("{}yl", stem),
        _ => "alkyl".to_string(),
    }
}

fn alkoxy_name(carbon_count: usize) -> String {
    if (1..=5).contains(&carbon_count) {
        format!("{}oxy", CHAIN_STEMS[carbon_count - 1])
    } else {
        "alkoxy".to_string()
    }
}

/// Renders the molecular formula: carbon first, hydrogen second (explicit
/// plus implicit), remaining elements alphabetically, counts of one omitted.
pub fn molecular_formula(mol: &Molecule) -> String {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for atom in mol.atoms() {
        *counts.entry(atom.symbol.clone()).or_default() += 1;
        if atom.implicit_hydrogens > 0 {
            *counts.entry("H".to_string()).or_default() += atom.implicit_hydrogens as u32;
        }
    }

    let mut out = String::new();
    if counts.contains_key("C") {
        append_element(&mut out, "C", counts.remove("C").unwrap());
        if let Some(h) = counts.remove("H") {
            append_element(&mut out, "H", h);
        }
    }
    for (symbol, count) in &counts {
        append_element(&mut out, symbol, *count);
    }
    out
}

fn append_element(out: &mut String, symbol: &str, count: u32) {
    out.push_str(symbol);
    if count > 1 {
        out.push_str(&count.to_string());
    }
}

/// Produces the best-effort systematic name for a built molecule.
///
/// Special cases run in a fixed order before the generic chain algorithm:
/// inorganic (zero carbons), one-carbon oxides/acids, the benzene heuristic,
/// then the dedicated functional-group namers.
pub fn synthesize_name(mol: &Molecule, groups: &[FunctionalGroupMatch]) -> NameResult {
    let carbons: Vec<usize> = (0..mol.atom_count())
        .filter(|&i| mol.atom(i).is_carbon())
        .collect();

    if carbons.is_empty() {
        return inorganic_name(mol);
    }
    if carbons.len() == 1 {
        if let Some(result) = one_carbon_name(mol, carbons[0], groups) {
            return result;
        }
    }
    if let Some(result) = benzene_name(mol, &carbons) {
        return result;
    }
    if let Some(result) = group_special_name(mol, groups) {
        return result;
    }
    generic_chain_name(mol, groups)
}

fn inorganic_name(mol: &Molecule) -> NameResult {
    let n = mol.atom_count();

    if n == 1 {
        let symbol = &mol.atom(0).symbol;
        return match element_name(symbol) {
            Some(name) => NameResult::new(name, name, 0.95, "inorganic"),
            None => NameResult::new(symbol, "", 0.6, "inorganic"),
        };
    }

    if n == 2 {
        return diatomic_name(mol);
    }

    // Explicit-hydrogen counting for the classroom classics.
    let mut symbols: Vec<&str> = mol.atoms().map(|a| a.symbol.as_str()).collect();
    symbols.sort();
    if symbols == ["H", "H", "O"] {
        return NameResult::new("water", "water", 0.99, "inorganic");
    }
    if symbols == ["H", "H", "H", "N"] {
        return NameResult::new("ammonia", "ammonia", 0.99, "inorganic");
    }

    let formula = molecular_formula(mol);
    NameResult::new(&formula, "", 0.6, "inorganic")
}

fn diatomic_name(mol: &Molecule) -> NameResult {
    let a = mol.atom(0).symbol.as_str();
    let b = mol.atom(1).symbol.as_str();
    let order = mol.bond_between(0, 1);

    let mut pair = [a, b];
    pair.sort();

    // The O-O pair is the one case where bond order changes the answer.
    if pair == ["O", "O"] {
        return match order {
            Some(BondOrder::Single) => {
                NameResult::new("hydrogen peroxide", "hydrogen peroxide", 0.97, "inorganic")
            }
            Some(BondOrder::Double) => NameResult::new("oxygen", "oxygen gas", 0.97, "inorganic"),
            _ => NameResult::new(&molecular_formula(mol), "", 0.6, "inorganic"),
        };
    }

    if order.is_none() {
        // Disconnected pair; the validator already rejected it, name by formula.
        return NameResult::new(&molecular_formula(mol), "", 0.6, "inorganic");
    }

    let result = match pair {
        ["H", "H"] => Some(("hydrogen", "hydrogen gas")),
        ["N", "N"] => Some(("nitrogen", "nitrogen gas")),
        ["F", "F"] => Some(("fluorine", "fluorine gas")),
        ["Cl", "Cl"] => Some(("chlorine", "chlorine gas")),
        ["Br", "Br"] => Some(("bromine", "bromine")),
        ["I", "I"] => Some(("iodine", "iodine")),
        ["Cl", "H"] => Some(("hydrogen chloride", "hydrochloric acid")),
        ["F", "H"] => Some(("hydrogen fluoride", "hydrofluoric acid")),
        ["Br", "H"] => Some(("hydrogen bromide", "hydrobromic acid")),
        ["H", "I"] => Some(("hydrogen iodide", "hydroiodic acid")),
        ["Cl", "Na"] => Some(("sodium chloride", "table salt")),
        _ => None,
    };
    if let Some((name, common)) = result {
        return NameResult::new(name, common, 0.95, "inorganic");
    }

    // Generic binary compound: first drawn element named, second as -ide.
    let first = element_name(a).unwrap_or(a);
    let second = IDE_FORMS
        .get(b)
        .copied()
        .map(String::from)
        .unwrap_or_else(|| format!("{}ide", element_name(b).unwrap_or(b)));
    NameResult::new(&format!("{} {}", first, second), "", 0.85, "inorganic")
}

fn one_carbon_name(
    mol: &Molecule,
    carbon: usize,
    groups: &[FunctionalGroupMatch],
) -> Option<NameResult> {
    let neighbors = mol.neighbors(carbon);
    let oxygen_count = neighbors
        .iter()
        .filter(|&&(j, _)| mol.atom(j).is("O"))
        .count();
    let double_oxygens = neighbors
        .iter()
        .filter(|&&(j, order)| mol.atom(j).is("O") && order == BondOrder::Double)
        .count();
    let triple_oxygens = neighbors
        .iter()
        .filter(|&&(j, order)| mol.atom(j).is("O") && order == BondOrder::Triple)
        .count();
    let explicit_hydrogens = neighbors
        .iter()
        .filter(|&&(j, _)| mol.atom(j).is_hydrogen())
        .count();
    let other_heavy = neighbors
        .iter()
        .filter(|&&(j, _)| !mol.atom(j).is("O") && !mol.atom(j).is_hydrogen())
        .count();

    // C#O with nothing else drawn on the carbon.
    if triple_oxygens == 1 && neighbors.len() == 1 && explicit_hydrogens == 0 {
        return Some(NameResult::new(
            "carbon monoxide",
            "carbon monoxide",
            0.98,
            "inorganic",
        ));
    }
    if double_oxygens == 2 && other_heavy == 0 && explicit_hydrogens == 0 {
        return Some(NameResult::new(
            "carbon dioxide",
            "carbon dioxide",
            0.98,
            "inorganic",
        ));
    }
    if groups
        .iter()
        .any(|m| m.kind == FunctionalGroup::CarboxylicAcid && m.atoms.contains(&carbon))
    {
        return Some(NameResult::new(
            "methanoic acid",
            "formic acid",
            0.95,
            "carboxylic acid",
        ));
    }
    if oxygen_count == 1 && double_oxygens == 1 && other_heavy == 0 && mol.has_hydrogen(carbon) {
        return Some(NameResult::new("methanal", "formaldehyde", 0.95, "aldehyde"));
    }

    None
}

/// Heuristic aromatic recognition: at least six carbons whose carbon-carbon
/// bonds split into exactly three doubles and at least three singles (or a
/// ring drawn with aromatic bonds). Not a real aromaticity perception pass.
fn benzene_name(mol: &Molecule, carbons: &[usize]) -> Option<NameResult> {
    if carbons.len() < 6 {
        return None;
    }

    let mut cc_single = 0;
    let mut cc_double = 0;
    let mut cc_aromatic = 0;
    for (i, j, order) in mol.bond_pairs() {
        if !(mol.atom(i).is_carbon() && mol.atom(j).is_carbon()) {
            continue;
        }
        match order {
            BondOrder::Single => cc_single += 1,
            BondOrder::Double => cc_double += 1,
            BondOrder::Aromatic => cc_aromatic += 1,
            BondOrder::Triple => {}
        }
    }

    let kekule = cc_double == 3 && cc_single >= 3;
    let aromatic = cc_aromatic >= 6;
    if !kekule && !aromatic {
        return None;
    }

    if mol.atom_count() == 6 && carbons.len() == 6 {
        return Some(NameResult::new("benzene", "benzene", 0.95, "aromatic"));
    }

    let ring: HashSet<usize> = match carbon_ring(mol) {
        Some(cycle) if cycle.len() >= 6 => cycle.into_iter().collect(),
        // Drawn open or without a closing bond: fall back to well-connected
        // carbons.
        _ => carbons
            .iter()
            .copied()
            .filter(|&c| {
                mol.neighbors(c)
                    .iter()
                    .filter(|&&(j, _)| mol.atom(j).is_carbon())
                    .count()
                    >= 2
            })
            .collect(),
    };

    let extra_carbons: Vec<usize> = carbons.iter().copied().filter(|c| !ring.contains(c)).collect();

    // Single-neighbor heteroatoms hanging off the ring.
    let lone_sub = |symbol: &str| -> Vec<usize> {
        (0..mol.atom_count())
            .filter(|&i| {
                mol.atom(i).is(symbol) && {
                    let nbrs = mol.neighbors(i);
                    nbrs.len() == 1
                        && nbrs[0].1 == BondOrder::Single
                        && ring.contains(&nbrs[0].0)
                }
            })
            .collect()
    };
    let lone_oxygens = lone_sub("O");
    let lone_nitrogens = lone_sub("N");

    if extra_carbons.len() == 1
        && mol.atom_count() == carbons.len()
        && mol
            .neighbors(extra_carbons[0])
            .iter()
            .any(|&(j, _)| ring.contains(&j))
    {
        return Some(NameResult::new("methylbenzene", "toluene", 0.9, "aromatic"));
    }
    if extra_carbons.is_empty() && lone_oxygens.len() == 1 && mol.atom_count() == carbons.len() + 1 {
        return Some(NameResult::new("phenol", "phenol", 0.9, "aromatic"));
    }
    if extra_carbons.is_empty() && lone_nitrogens.len() == 1 && mol.atom_count() == carbons.len() + 1
    {
        return Some(NameResult::new("aniline", "aminobenzene", 0.9, "aromatic"));
    }

    // Generic substituted benzene.
    let mut prefix_counts: BTreeMap<String, usize> = BTreeMap::new();
    let nitro_members = HashSet::new();
    for &rc in &ring {
        for (nbr, _) in mol.neighbors(rc) {
            if ring.contains(&nbr) || mol.atom(nbr).is_hydrogen() {
                continue;
            }
            if let Some(name) = substituent_name(mol, nbr, rc, &nitro_members) {
                *prefix_counts.entry(name).or_insert(0) += 1;
            }
        }
    }
    if prefix_counts.is_empty() {
        return Some(NameResult::new("benzene", "benzene", 0.95, "aromatic"));
    }
    let prefix: String = prefix_counts
        .iter()
        .map(|(name, &count)| format!("{}{}", multiplier_prefix(count), name))
        .collect::<Vec<_>>()
        .join("");
    Some(NameResult::new(
        &format!("{}benzene", prefix),
        "",
        0.85,
        "aromatic",
    ))
}

/// First cycle found in the carbon-only subgraph.
fn carbon_ring(mol: &Molecule) -> Option<Vec<usize>> {
    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    for i in 0..mol.atom_count() {
        if mol.atom(i).is_carbon() && !visited.contains(&i) {
            if let Some(cycle) = dfs_carbon_cycle(mol, i, None, &mut stack, &mut visited) {
                return Some(cycle);
            }
        }
    }
    None
}

fn dfs_carbon_cycle(
    mol: &Molecule,
    current: usize,
    parent: Option<usize>,
    stack: &mut Vec<usize>,
    visited: &mut HashSet<usize>,
) -> Option<Vec<usize>> {
    visited.insert(current);
    stack.push(current);
    for (neighbor, _) in mol.neighbors(current) {
        if !mol.atom(neighbor).is_carbon() || Some(neighbor) == parent {
            continue;
        }
        if let Some(pos) = stack.iter().position(|&x| x == neighbor) {
            return Some(stack[pos..].to_vec());
        }
        if !visited.contains(&neighbor) {
            if let Some(cycle) = dfs_carbon_cycle(mol, neighbor, Some(current), stack, visited) {
                return Some(cycle);
            }
        }
    }
    stack.pop();
    None
}

fn group_special_name(mol: &Molecule, groups: &[FunctionalGroupMatch]) -> Option<NameResult> {
    let primary = primary_functional_group(groups)?;
    match primary.kind {
        FunctionalGroup::Urea => Some(NameResult::new("urea", "carbamide", 0.97, "urea")),
        FunctionalGroup::Amide => Some(amide_name(mol)),
        FunctionalGroup::Ester => Some(ester_name(mol, primary)),
        FunctionalGroup::Nitrile => Some(nitrile_name(mol)),
        FunctionalGroup::Peroxide => Some(peroxide_name(mol, primary)),
        FunctionalGroup::Hypochlorite => Some(hypochlorite_name(mol, primary)),
        _ => None,
    }
}

fn amide_name(mol: &Molecule) -> NameResult {
    let chain_len = mol.longest_carbon_chain().len();
    match chain_len {
        1 => NameResult::new("methanamide", "formamide", 0.88, "amide"),
        2 => NameResult::new("ethanamide", "acetamide", 0.88, "amide"),
        n => NameResult::new(&format!("{}anamide", stem_for(n)), "", 0.88, "amide"),
    }
}

fn ester_name(mol: &Molecule, primary: &FunctionalGroupMatch) -> NameResult {
    let acyl_carbon = primary.atoms[0];
    let ester_oxygen = primary.atoms[2];

    let acyl_len = count_branch_carbons(mol, acyl_carbon, ester_oxygen);
    let alkyl = mol
        .neighbors(ester_oxygen)
        .iter()
        .find(|&&(j, _)| j != acyl_carbon && mol.atom(j).is_carbon())
        .map(|&(j, _)| alkyl_name(count_branch_carbons(mol, j, ester_oxygen)))
        .unwrap_or_else(|| "alkyl".to_string());

    match acyl_len {
        1 => NameResult::new(
            &format!("{} methanoate", alkyl),
            &format!("{} formate", alkyl),
            0.88,
            "ester",
        ),
        2 => NameResult::new(
            &format!("{} ethanoate", alkyl),
            &format!("{} acetate", alkyl),
            0.88,
            "ester",
        ),
        n => NameResult::new(&format!("{} {}anoate", alkyl, stem_for(n)), "", 0.88, "ester"),
    }
}

fn nitrile_name(mol: &Molecule) -> NameResult {
    let chain_len = mol.longest_carbon_chain().len();
    match chain_len {
        1 => NameResult::new("formonitrile", "hydrogen cyanide", 0.88, "nitrile"),
        2 => NameResult::new("ethanenitrile", "acetonitrile", 0.88, "nitrile"),
        n => NameResult::new(&format!("{}anenitrile", stem_for(n)), "", 0.88, "nitrile"),
    }
}

fn peroxide_name(mol: &Molecule, primary: &FunctionalGroupMatch) -> NameResult {
    let o1 = primary.atoms[0];
    let o2 = primary.atoms[1];
    let side = |oxygen: usize, other: usize| -> Option<usize> {
        mol.neighbors(oxygen)
            .iter()
            .find(|&&(j, _)| j != other && mol.atom(j).is_carbon())
            .map(|&(j, _)| j)
    };

    match (side(o1, o2), side(o2, o1)) {
        (Some(a), Some(b)) => {
            let left = alkyl_name(count_branch_carbons(mol, a, o1));
            let right = alkyl_name(count_branch_carbons(mol, b, o2));
            let name = if left == right {
                format!("di{} peroxide", left)
            } else {
                let mut pair = [left, right];
                pair.sort();
                format!("{} {} peroxide", pair[0], pair[1])
            };
            NameResult::new(&name, "", 0.87, "peroxide")
        }
        (Some(a), None) => {
            let name = format!("{} hydroperoxide", alkyl_name(count_branch_carbons(mol, a, o1)));
            NameResult::new(&name, "", 0.87, "peroxide")
        }
        (None, Some(b)) => {
            let name = format!("{} hydroperoxide", alkyl_name(count_branch_carbons(mol, b, o2)));
            NameResult::new(&name, "", 0.87, "peroxide")
        }
        (None, None) => NameResult::new("hydrogen peroxide", "hydrogen peroxide", 0.95, "peroxide"),
    }
}

fn hypochlorite_name(mol: &Molecule, primary: &FunctionalGroupMatch) -> NameResult {
    let oxygen = primary.atoms[0];
    let halogen = primary.atoms[1];
    let carbon = primary.atoms[2];
    let alkyl = alkyl_name(count_branch_carbons(mol, carbon, oxygen));
    let kind = match mol.atom(halogen).symbol.as_str() {
        "F" => "hypofluorite",
        "Br" => "hypobromite",
        "I" => "hypoiodite",
        _ => "hypochlorite",
    };
    NameResult::new(&format!("{} {}", alkyl, kind), "", 0.87, "hypochlorite")
}

/// Generic hydrocarbon / functionalized-chain naming: longest chain stem,
/// one suffix from the highest-priority suffix-bearing group, substituents
/// as counted prefixes, and a locant for the first unsaturation met while
/// walking the chain in its canonical direction.
fn generic_chain_name(mol: &Molecule, groups: &[FunctionalGroupMatch]) -> NameResult {
    let chain = mol.longest_carbon_chain();
    if chain.is_empty() {
        let formula = molecular_formula(mol);
        return NameResult::new(&formula, "", 0.5, "unknown");
    }
    let chain_set: HashSet<usize> = chain.iter().copied().collect();
    let stem = stem_for(chain.len());

    let suffix_match = groups
        .iter()
        .filter(|m| {
            matches!(
                m.kind,
                FunctionalGroup::CarboxylicAcid
                    | FunctionalGroup::Amine
                    | FunctionalGroup::Aldehyde
                    | FunctionalGroup::Ketone
                    | FunctionalGroup::Alcohol
            )
        })
        .min_by_key(|m| (m.priority, m.atoms.iter().min().copied().unwrap_or(usize::MAX)));

    let suffix_atoms: HashSet<usize> = suffix_match
        .map(|m| m.atoms.iter().copied().collect())
        .unwrap_or_default();
    let nitro_members: HashSet<usize> = groups
        .iter()
        .filter(|m| m.kind == FunctionalGroup::Nitro)
        .flat_map(|m| m.atoms.iter().copied())
        .collect();

    let mut prefix_counts: BTreeMap<String, usize> = BTreeMap::new();
    for &ci in &chain {
        for (nbr, _) in mol.neighbors(ci) {
            if chain_set.contains(&nbr)
                || suffix_atoms.contains(&nbr)
                || mol.atom(nbr).is_hydrogen()
            {
                continue;
            }
            if let Some(name) = substituent_name(mol, nbr, ci, &nitro_members) {
                *prefix_counts.entry(name).or_insert(0) += 1;
            }
        }
    }

    let prefix: String = prefix_counts
        .iter()
        .map(|(name, &count)| format!("{}{}", multiplier_prefix(count), name))
        .collect::<Vec<_>>()
        .join("");

    // First double or triple bond along the chain, 1-based. The walk runs in
    // the chain's canonical direction only; no reverse pass for the lowest
    // locant.
    let mut unsaturation: Option<(usize, &str, FunctionalGroup)> = None;
    for i in 0..chain.len().saturating_sub(1) {
        match mol.bond_between(chain[i], chain[i + 1]) {
            Some(BondOrder::Double) => {
                unsaturation = Some((i + 1, "ene", FunctionalGroup::Alkene));
                break;
            }
            Some(BondOrder::Triple) => {
                unsaturation = Some((i + 1, "yne", FunctionalGroup::Alkyne));
                break;
            }
            _ => {}
        }
    }

    let (core, structure_type) = if let Some(m) = suffix_match {
        (format!("{}{}", stem, m.suffix), m.kind.label().to_string())
    } else if let Some((locant, suffix, kind)) = unsaturation {
        let core = if chain.len() >= 3 {
            format!("{}-{}{}", locant, stem, suffix)
        } else {
            format!("{}{}", stem, suffix)
        };
        (core, kind.label().to_string())
    } else {
        (format!("{}ane", stem), "alkane".to_string())
    };

    let name = if prefix.is_empty() {
        core
    } else if core.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{}-{}", prefix, core)
    } else {
        format!("{}{}", prefix, core)
    };

    let common = COMMON_NAMES.get(name.as_str()).copied().unwrap_or("");
    // A lone completed atom is about as certain as naming gets.
    let confidence = if mol.atom_count() == 1 { 0.95 } else { 0.85 };

    trace!("generic chain name: {} (chain length {})", name, chain.len());
    NameResult {
        name,
        common_name: common.to_string(),
        confidence,
        structure_type,
    }
}

/// Names one substituent hanging off a parent atom: alkyl branches by size,
/// oxygen as oxo/alkoxy/hydroxy depending on bonding, cyano/amino/nitro for
/// nitrogen, and the halogen prefixes.
fn substituent_name(
    mol: &Molecule,
    neighbor: usize,
    parent: usize,
    nitro_members: &HashSet<usize>,
) -> Option<String> {
    if nitro_members.contains(&neighbor) {
        return mol.atom(neighbor).is("N").then(|| "nitro".to_string());
    }

    let order = mol.bond_between(parent, neighbor);
    match mol.atom(neighbor).symbol.as_str() {
        "C" => Some(alkyl_name(count_branch_carbons(mol, neighbor, parent))),
        "O" => {
            if order == Some(BondOrder::Double) {
                return Some("oxo".to_string());
            }
            let onward_carbon = mol
                .neighbors(neighbor)
                .iter()
                .find(|&&(j, _)| j != parent && mol.atom(j).is_carbon())
                .map(|&(j, _)| j);
            match onward_carbon {
                Some(c) => Some(alkoxy_name(count_branch_carbons(mol, c, neighbor))),
                None => Some("hydroxy".to_string()),
            }
        }
        "N" => {
            if order == Some(BondOrder::Triple) {
                Some("cyano".to_string())
            } else {
                Some("amino".to_string())
            }
        }
        "F" => Some("fluoro".to_string()),
        "Cl" => Some("chloro".to_string()),
        "Br" => Some("bromo".to_string()),
        "I" => Some("iodo".to_string()),
        "S" => Some("mercapto".to_string()),
        _ => Some("substituent".to_string()),
    }
}

/// Size of the carbon branch rooted at `start`, never crossing `exclude`.
fn count_branch_carbons(mol: &Molecule, start: usize, exclude: usize) -> usize {
    let mut visited = HashSet::new();
    visited.insert(exclude);
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if visited.insert(node) {
            for (neighbor, _) in mol.neighbors(node) {
                if !visited.contains(&neighbor) && mol.atom(neighbor).is_carbon() {
                    stack.push(neighbor);
                }
            }
        }
    }
    visited.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::testutil::*;
    use crate::{build_molecule, detect_functional_groups};

    fn name_of(nodes: &[crate::NodeRecord], bonds: &[crate::BondInput]) -> NameResult {
        let mol = build_molecule(nodes, bonds).unwrap();
        let groups = detect_functional_groups(&mol);
        synthesize_name(&mol, &groups)
    }

    #[test]
    fn methane_from_one_carbon() {
        let result = name_of(&[node(1, "C")], &[]);
        assert_eq!(result.name, "methane");
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn single_oxygen_is_just_oxygen() {
        let result = name_of(&[node(1, "O")], &[]);
        assert_eq!(result.name, "oxygen");
        assert!(result.confidence >= 0.9);
    }

    #[test]
    fn ethane_and_formula() {
        let (nodes, bonds) = alkane(2);
        let result = name_of(&nodes, &bonds);
        assert_eq!(result.name, "ethane");
        let mol = build_molecule(&nodes, &bonds).unwrap();
        assert_eq!(molecular_formula(&mol), "C2H6");
    }

    #[test]
    fn ethene_has_its_common_name() {
        let result = name_of(
            &[node(1, "C"), node(2, "C")],
            &[bond(1, 2, "double")],
        );
        assert_eq!(result.name, "ethene");
        assert_eq!(result.common_name, "ethylene");
        assert_eq!(result.structure_type, "alkene");
    }

    #[test]
    fn ethyne_is_acetylene() {
        let result = name_of(
            &[node(1, "C"), node(2, "C")],
            &[bond(1, 2, "triple")],
        );
        assert_eq!(result.name, "ethyne");
        assert_eq!(result.common_name, "acetylene");
    }

    #[test]
    fn unsaturation_locant_on_longer_chains() {
        let (nodes, mut bonds) = alkane(4);
        bonds[0] = bond(0, 1, "double");
        let result = name_of(&nodes, &bonds);
        assert_eq!(result.name, "1-butene");
    }

    #[test]
    fn carbon_dioxide() {
        let result = name_of(
            &[node(1, "C"), node(2, "O"), node(3, "O")],
            &[bond(1, 2, "double"), bond(1, 3, "double")],
        );
        assert_eq!(result.name, "carbon dioxide");
        assert!(result.confidence >= 0.95);
    }

    #[test]
    fn carbon_monoxide_by_triple_bond() {
        let result = name_of(
            &[node(1, "C"), node(2, "O")],
            &[bond(1, 2, "triple")],
        );
        assert_eq!(result.name, "carbon monoxide");
    }

    #[test]
    fn formaldehyde_and_formic_acid() {
        let result = name_of(
            &[node(1, "C"), node(2, "O")],
            &[bond(1, 2, "double")],
        );
        assert_eq!(result.name, "methanal");
        assert_eq!(result.common_name, "formaldehyde");

        let result = name_of(
            &[node(1, "C"), node(2, "O"), node(3, "O")],
            &[bond(1, 2, "double"), bond(1, 3, "single")],
        );
        assert_eq!(result.name, "methanoic acid");
        assert_eq!(result.common_name, "formic acid");
    }

    #[test]
    fn peroxide_versus_molecular_oxygen() {
        let single = name_of(
            &[node(1, "O"), node(2, "O")],
            &[bond(1, 2, "single")],
        );
        assert_eq!(single.name, "hydrogen peroxide");

        let double = name_of(
            &[node(1, "O"), node(2, "O")],
            &[bond(1, 2, "double")],
        );
        assert_eq!(double.name, "oxygen");
    }

    #[test]
    fn water_and_ammonia_by_hydrogen_count() {
        let water = name_of(
            &[node(1, "O"), node(2, "H"), node(3, "H")],
            &[bond(1, 2, "single"), bond(1, 3, "single")],
        );
        assert_eq!(water.name, "water");
        assert!(water.confidence >= 0.99);

        let ammonia = name_of(
            &[node(1, "N"), node(2, "H"), node(3, "H"), node(4, "H")],
            &[
                bond(1, 2, "single"),
                bond(1, 3, "single"),
                bond(1, 4, "single"),
            ],
        );
        assert_eq!(ammonia.name, "ammonia");
    }

    #[test]
    fn sodium_chloride_is_table_salt() {
        let result = name_of(
            &[node(1, "Na"), node(2, "Cl")],
            &[bond(1, 2, "single")],
        );
        assert_eq!(result.name, "sodium chloride");
        assert_eq!(result.common_name, "table salt");
    }

    fn benzene_input() -> (Vec<crate::NodeRecord>, Vec<crate::BondInput>) {
        let nodes: Vec<_> = (0..6).map(|i| node(i, "C")).collect();
        let bonds: Vec<_> = (0..6)
            .map(|i| {
                let kind = if i % 2 == 0 { "double" } else { "single" };
                bond(i, (i + 1) % 6, kind)
            })
            .collect();
        (nodes, bonds)
    }

    #[test]
    fn benzene_ring() {
        let (nodes, bonds) = benzene_input();
        let result = name_of(&nodes, &bonds);
        assert_eq!(result.name, "benzene");
        assert_eq!(result.structure_type, "aromatic");
        let mol = build_molecule(&nodes, &bonds).unwrap();
        assert_eq!(molecular_formula(&mol), "C6H6");
    }

    #[test]
    fn toluene_from_one_extra_carbon() {
        let (mut nodes, mut bonds) = benzene_input();
        nodes.push(node(6, "C"));
        bonds.push(bond(0, 6, "single"));
        let result = name_of(&nodes, &bonds);
        assert_eq!(result.name, "methylbenzene");
        assert_eq!(result.common_name, "toluene");
    }

    #[test]
    fn phenol_and_aniline() {
        let (mut nodes, mut bonds) = benzene_input();
        nodes.push(node(6, "O"));
        bonds.push(bond(0, 6, "single"));
        assert_eq!(name_of(&nodes, &bonds).name, "phenol");

        let (mut nodes, mut bonds) = benzene_input();
        nodes.push(node(6, "N"));
        bonds.push(bond(0, 6, "single"));
        assert_eq!(name_of(&nodes, &bonds).name, "aniline");
    }

    #[test]
    fn ethylbenzene_via_generic_substituents() {
        let (mut nodes, mut bonds) = benzene_input();
        nodes.push(node(6, "C"));
        nodes.push(node(7, "C"));
        bonds.push(bond(0, 6, "single"));
        bonds.push(bond(6, 7, "single"));
        let result = name_of(&nodes, &bonds);
        assert_eq!(result.name, "ethylbenzene");
    }

    #[test]
    fn alcohols_take_the_anol_suffix() {
        let result = name_of(
            &[node(1, "C"), node(2, "C"), node(3, "O")],
            &[bond(1, 2, "single"), bond(2, 3, "single")],
        );
        assert_eq!(result.name, "ethanol");
        assert_eq!(result.common_name, "ethyl alcohol");
        assert_eq!(result.structure_type, "alcohol");
    }

    #[test]
    fn acetone_is_propanone() {
        let result = name_of(
            &[node(1, "C"), node(2, "C"), node(3, "C"), node(4, "O")],
            &[
                bond(1, 2, "single"),
                bond(2, 3, "single"),
                bond(2, 4, "double"),
            ],
        );
        assert_eq!(result.name, "propanone");
        assert_eq!(result.common_name, "acetone");
    }

    #[test]
    fn acetic_acid_suffix() {
        let result = name_of(
            &[node(1, "C"), node(2, "C"), node(3, "O"), node(4, "O")],
            &[
                bond(1, 2, "single"),
                bond(2, 3, "double"),
                bond(2, 4, "single"),
            ],
        );
        assert_eq!(result.name, "ethanoic acid");
        assert_eq!(result.common_name, "acetic acid");
    }

    #[test]
    fn halogens_become_prefixes() {
        let result = name_of(
            &[node(1, "C"), node(2, "Cl")],
            &[bond(1, 2, "single")],
        );
        assert_eq!(result.name, "chloromethane");

        let result = name_of(
            &[node(1, "C"), node(2, "Cl"), node(3, "Cl"), node(4, "Cl")],
            &[
                bond(1, 2, "single"),
                bond(1, 3, "single"),
                bond(1, 4, "single"),
            ],
        );
        assert_eq!(result.name, "trichloromethane");
        assert_eq!(result.common_name, "chloroform");
    }

    #[test]
    fn branched_alkane_gets_a_methyl_prefix() {
        // Isobutane: chain of three with a methyl on the middle carbon.
        let mol_nodes = vec![node(0, "C"), node(1, "C"), node(2, "C"), node(3, "C")];
        let mol_bonds = vec![
            bond(0, 1, "single"),
            bond(1, 2, "single"),
            bond(1, 3, "single"),
        ];
        let result = name_of(&mol_nodes, &mol_bonds);
        assert_eq!(result.name, "methylpropane");
    }

    #[test]
    fn amide_ester_nitrile_namers() {
        // Acetamide.
        let result = name_of(
            &[node(1, "C"), node(2, "C"), node(3, "O"), node(4, "N")],
            &[
                bond(1, 2, "single"),
                bond(2, 3, "double"),
                bond(2, 4, "single"),
            ],
        );
        assert_eq!(result.name, "ethanamide");
        assert_eq!(result.common_name, "acetamide");

        // Methyl acetate.
        let result = name_of(
            &[
                node(1, "C"),
                node(2, "C"),
                node(3, "O"),
                node(4, "O"),
                node(5, "C"),
            ],
            &[
                bond(1, 2, "single"),
                bond(2, 3, "double"),
                bond(2, 4, "single"),
                bond(4, 5, "single"),
            ],
        );
        assert_eq!(result.name, "methyl ethanoate");
        assert_eq!(result.common_name, "methyl acetate");

        // Acetonitrile.
        let result = name_of(
            &[node(1, "C"), node(2, "C"), node(3, "N")],
            &[bond(1, 2, "single"), bond(2, 3, "triple")],
        );
        assert_eq!(result.name, "ethanenitrile");
        assert_eq!(result.common_name, "acetonitrile");
    }

    #[test]
    fn urea_special_case() {
        let result = name_of(
            &[node(1, "N"), node(2, "C"), node(3, "O"), node(4, "N")],
            &[
                bond(1, 2, "single"),
                bond(2, 3, "double"),
                bond(2, 4, "single"),
            ],
        );
        assert_eq!(result.name, "urea");
        assert_eq!(result.common_name, "carbamide");
    }

    #[test]
    fn dimethyl_peroxide() {
        let result = name_of(
            &[node(1, "C"), node(2, "O"), node(3, "O"), node(4, "C")],
            &[
                bond(1, 2, "single"),
                bond(2, 3, "single"),
                bond(3, 4, "single"),
            ],
        );
        assert_eq!(result.name, "dimethyl peroxide");
    }

    #[test]
    fn methyl_hypochlorite_name() {
        let result = name_of(
            &[node(1, "C"), node(2, "O"), node(3, "Cl")],
            &[bond(1, 2, "single"), bond(2, 3, "single")],
        );
        assert_eq!(result.name, "methyl hypochlorite");
    }

    #[test]
    fn long_chains_fall_back_to_poly() {
        let (nodes, bonds) = alkane(13);
        let result = name_of(&nodes, &bonds);
        assert_eq!(result.name, "polyane");
    }

    #[test]
    fn formula_ordering_follows_hill() {
        let mol = build_molecule(
            &[node(1, "C"), node(2, "Cl"), node(3, "Br")],
            &[bond(1, 2, "single"), bond(1, 3, "single")],
        )
        .unwrap();
        // C first, H second, then Br before Cl alphabetically.
        assert_eq!(molecular_formula(&mol), "CH2BrCl");
    }

    #[test]
    fn formula_without_carbon_is_alphabetical() {
        let mol = build_molecule(
            &[node(1, "N"), node(2, "H"), node(3, "H"), node(4, "H")],
            &[
                bond(1, 2, "single"),
                bond(1, 3, "single"),
                bond(1, 4, "single"),
            ],
        )
        .unwrap();
        assert_eq!(molecular_formula(&mol), "H3N");
    }
}
