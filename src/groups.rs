use std::collections::HashSet;

use tracing::*;

use crate::{BondOrder, Molecule};

/// Every pattern the detector knows. Priorities are unique; lower wins when
/// choosing the group that drives the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionalGroup {
    CarboxylicAcid,
    Nitrile,
    Ester,
    Urea,
    Amide,
    Nitro,
    Peroxide,
    Hypochlorite,
    Amine,
    Aldehyde,
    Ketone,
    Alcohol,
    Ether,
    Thiol,
    Sulfide,
    Halide,
    Alkene,
    Alkyne,
}

impl FunctionalGroup {
    pub fn priority(self) -> u8 {
        match self {
            FunctionalGroup::CarboxylicAcid => 1,
            FunctionalGroup::Nitrile => 2,
            FunctionalGroup::Ester => 3,
            FunctionalGroup::Urea => 4,
            FunctionalGroup::Amide => 5,
            FunctionalGroup::Nitro => 6,
            FunctionalGroup::Peroxide => 7,
            FunctionalGroup::Hypochlorite => 8,
            FunctionalGroup::Amine => 9,
            FunctionalGroup::Aldehyde => 10,
            FunctionalGroup::Ketone => 11,
            FunctionalGroup::Alcohol => 12,
            FunctionalGroup::Ether => 13,
            FunctionalGroup::Thiol => 14,
            FunctionalGroup::Sulfide => 15,
            FunctionalGroup::Halide => 16,
            FunctionalGroup::Alkene => 17,
            FunctionalGroup::Alkyne => 18,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FunctionalGroup::CarboxylicAcid => "carboxylic acid",
            FunctionalGroup::Nitrile => "nitrile",
            FunctionalGroup::Ester => "ester",
            FunctionalGroup::Urea => "urea",
            FunctionalGroup::Amide => "amide",
            FunctionalGroup::Nitro => "nitro",
            FunctionalGroup::Peroxide => "peroxide",
            FunctionalGroup::Hypochlorite => "hypochlorite",
            FunctionalGroup::Amine => "amine",
            FunctionalGroup::Aldehyde => "aldehyde",
            FunctionalGroup::Ketone => "ketone",
            FunctionalGroup::Alcohol => "alcohol",
            FunctionalGroup::Ether => "ether",
            FunctionalGroup::Thiol => "thiol",
            FunctionalGroup::Sulfide => "sulfide",
            FunctionalGroup::Halide => "halide",
            FunctionalGroup::Alkene => "alkene",
            FunctionalGroup::Alkyne => "alkyne",
        }
    }

    /// Suffix template applied by the generic chain namer; empty when the
    /// group is named some other way (prefix, dedicated namer, or not at
    /// all).
    pub fn suffix(self) -> &'static str {
        match self {
            FunctionalGroup::CarboxylicAcid => "anoic acid",
            FunctionalGroup::Nitrile => "anenitrile",
            FunctionalGroup::Amide => "anamide",
            FunctionalGroup::Amine => "anamine",
            FunctionalGroup::Aldehyde => "anal",
            FunctionalGroup::Ketone => "anone",
            FunctionalGroup::Alcohol => "anol",
            _ => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionalGroupMatch {
    pub kind: FunctionalGroup,
    pub priority: u8,
    /// Atom indices involved, detection-significant atom first.
    pub atoms: Vec<usize>,
    pub suffix: &'static str,
}

fn make_match(kind: FunctionalGroup, atoms: Vec<usize>) -> FunctionalGroupMatch {
    FunctionalGroupMatch {
        kind,
        priority: kind.priority(),
        atoms,
        suffix: kind.suffix(),
    }
}

/// Scans every atom's neighborhood for the fixed pattern catalogue.
///
/// Exclusivity is enforced with claimed-atom sets: an oxygen consumed by a
/// carboxylic acid or ester is never reported again as an alcohol or ether,
/// a nitrogen consumed by an amide, urea, nitrile, or nitro group is never
/// reported as an amine, and each carbonyl carbon matches at most one
/// carbonyl pattern.
pub fn detect_functional_groups(mol: &Molecule) -> Vec<FunctionalGroupMatch> {
    let mut matches: Vec<FunctionalGroupMatch> = Vec::new();
    let mut claimed_oxygens: HashSet<usize> = HashSet::new();
    let mut claimed_nitrogens: HashSet<usize> = HashSet::new();

    let n = mol.atom_count();

    // Carbonyl and nitrile chemistry, one verdict per carbon.
    for c in 0..n {
        if !mol.atom(c).is_carbon() {
            continue;
        }
        let neighbors = mol.neighbors(c);

        if let Some(&(nitrogen, _)) = neighbors
            .iter()
            .find(|&&(j, order)| mol.atom(j).is("N") && order == BondOrder::Triple)
        {
            claimed_nitrogens.insert(nitrogen);
            matches.push(make_match(FunctionalGroup::Nitrile, vec![c, nitrogen]));
            continue;
        }

        let carbonyl_oxygen = neighbors
            .iter()
            .find(|&&(j, order)| mol.atom(j).is("O") && order == BondOrder::Double)
            .map(|&(j, _)| j);
        let Some(carbonyl_oxygen) = carbonyl_oxygen else {
            continue;
        };

        let single_oxygens: Vec<usize> = neighbors
            .iter()
            .filter(|&&(j, order)| mol.atom(j).is("O") && order == BondOrder::Single)
            .map(|&(j, _)| j)
            .collect();
        let nitrogens: Vec<usize> = neighbors
            .iter()
            .filter(|&&(j, _)| mol.atom(j).is("N"))
            .map(|&(j, _)| j)
            .collect();
        let carbon_neighbors: Vec<usize> = neighbors
            .iter()
            .filter(|&&(j, _)| mol.atom(j).is_carbon())
            .map(|&(j, _)| j)
            .collect();

        // Acid: the single-bonded oxygen itself carries a hydrogen.
        if let Some(&hydroxyl) = single_oxygens.iter().find(|&&o| mol.has_hydrogen(o)) {
            claimed_oxygens.insert(carbonyl_oxygen);
            claimed_oxygens.insert(hydroxyl);
            matches.push(make_match(
                FunctionalGroup::CarboxylicAcid,
                vec![c, carbonyl_oxygen, hydroxyl],
            ));
            continue;
        }

        // Ester: the single-bonded oxygen connects onward to a carbon.
        let ester_oxygen = single_oxygens.iter().copied().find(|&o| {
            mol.neighbors(o)
                .iter()
                .any(|&(k, _)| k != c && mol.atom(k).is_carbon())
        });
        if let Some(ester_oxygen) = ester_oxygen {
            claimed_oxygens.insert(carbonyl_oxygen);
            claimed_oxygens.insert(ester_oxygen);
            matches.push(make_match(
                FunctionalGroup::Ester,
                vec![c, carbonyl_oxygen, ester_oxygen],
            ));
            continue;
        }

        // Urea: two nitrogens on a carbonyl carbon with no carbon neighbor.
        if nitrogens.len() >= 2 && carbon_neighbors.is_empty() {
            let mut atoms = vec![c, carbonyl_oxygen];
            atoms.extend(&nitrogens);
            claimed_nitrogens.extend(&nitrogens);
            matches.push(make_match(FunctionalGroup::Urea, atoms));
            continue;
        }

        if let Some(&nitrogen) = nitrogens.first() {
            claimed_nitrogens.insert(nitrogen);
            matches.push(make_match(
                FunctionalGroup::Amide,
                vec![c, carbonyl_oxygen, nitrogen],
            ));
            continue;
        }

        if carbon_neighbors.len() >= 2 {
            matches.push(make_match(FunctionalGroup::Ketone, vec![c, carbonyl_oxygen]));
            continue;
        }

        if mol.has_hydrogen(c) {
            matches.push(make_match(
                FunctionalGroup::Aldehyde,
                vec![c, carbonyl_oxygen],
            ));
        }
    }

    // Nitrogen patterns. Runs before the oxygen pass so nitro can claim its
    // oxygens.
    for i in 0..n {
        if !mol.atom(i).is("N") || claimed_nitrogens.contains(&i) {
            continue;
        }
        let neighbors = mol.neighbors(i);
        let oxygens: Vec<usize> = neighbors
            .iter()
            .filter(|&&(j, _)| mol.atom(j).is("O"))
            .map(|&(j, _)| j)
            .collect();
        let has_carbon = neighbors.iter().any(|&(j, _)| mol.atom(j).is_carbon());

        if oxygens.len() >= 2 && has_carbon {
            let mut atoms = vec![i];
            atoms.extend(&oxygens);
            claimed_oxygens.extend(&oxygens);
            claimed_nitrogens.insert(i);
            matches.push(make_match(FunctionalGroup::Nitro, atoms));
            continue;
        }

        let all_single = neighbors
            .iter()
            .all(|&(_, order)| order == BondOrder::Single);
        if has_carbon && all_single {
            matches.push(make_match(FunctionalGroup::Amine, vec![i]));
        }
    }

    // Oxygen patterns.
    let mut peroxide_pairs: HashSet<(usize, usize)> = HashSet::new();
    for i in 0..n {
        if !mol.atom(i).is("O") || claimed_oxygens.contains(&i) {
            continue;
        }
        let neighbors = mol.neighbors(i);

        let peroxide_partner = neighbors
            .iter()
            .find(|&&(j, order)| {
                mol.atom(j).is("O") && order == BondOrder::Single && !claimed_oxygens.contains(&j)
            })
            .map(|&(j, _)| j);
        if let Some(j) = peroxide_partner {
            let key = (i.min(j), i.max(j));
            if peroxide_pairs.insert(key) {
                matches.push(make_match(FunctionalGroup::Peroxide, vec![key.0, key.1]));
            }
            continue;
        }

        let carbons: Vec<usize> = neighbors
            .iter()
            .filter(|&&(j, _)| mol.atom(j).is_carbon())
            .map(|&(j, _)| j)
            .collect();
        let halogen = neighbors
            .iter()
            .find(|&&(j, _)| mol.atom(j).is_halogen())
            .map(|&(j, _)| j);

        if let (1, Some(halogen)) = (carbons.len(), halogen) {
            matches.push(make_match(
                FunctionalGroup::Hypochlorite,
                vec![i, halogen, carbons[0]],
            ));
            continue;
        }

        if carbons.len() == 1 && mol.has_hydrogen(i) {
            matches.push(make_match(FunctionalGroup::Alcohol, vec![i, carbons[0]]));
            continue;
        }

        if carbons.len() == 2 && !mol.has_hydrogen(i) {
            matches.push(make_match(
                FunctionalGroup::Ether,
                vec![i, carbons[0], carbons[1]],
            ));
        }
    }

    // Sulfur mirrors the alcohol/ether split.
    for i in 0..n {
        if !mol.atom(i).is("S") {
            continue;
        }
        let carbons: Vec<usize> = mol
            .neighbors(i)
            .iter()
            .filter(|&&(j, _)| mol.atom(j).is_carbon())
            .map(|&(j, _)| j)
            .collect();
        if carbons.len() == 1 && mol.has_hydrogen(i) {
            matches.push(make_match(FunctionalGroup::Thiol, vec![i, carbons[0]]));
        } else if carbons.len() == 2 {
            matches.push(make_match(
                FunctionalGroup::Sulfide,
                vec![i, carbons[0], carbons[1]],
            ));
        }
    }

    // Halogens on carbon.
    for i in 0..n {
        if !mol.atom(i).is_halogen() {
            continue;
        }
        if let Some(&(c, _)) = mol
            .neighbors(i)
            .iter()
            .find(|&&(j, _)| mol.atom(j).is_carbon())
        {
            matches.push(make_match(FunctionalGroup::Halide, vec![i, c]));
        }
    }

    // Carbon-carbon unsaturation, each unordered pair once.
    for (i, j, order) in mol.bond_pairs() {
        if !(mol.atom(i).is_carbon() && mol.atom(j).is_carbon()) {
            continue;
        }
        match order {
            BondOrder::Double => {
                matches.push(make_match(FunctionalGroup::Alkene, vec![i, j]));
            }
            BondOrder::Triple => {
                matches.push(make_match(FunctionalGroup::Alkyne, vec![i, j]));
            }
            _ => {}
        }
    }

    debug!("detected {} functional group matches", matches.len());
    matches
}

/// The match that drives the name: lowest priority value wins; equal
/// priorities (not currently possible, the table is duplicate-free) fall
/// back to the smallest involved atom index.
pub fn primary_functional_group(
    matches: &[FunctionalGroupMatch],
) -> Option<&FunctionalGroupMatch> {
    matches
        .iter()
        .min_by_key(|m| (m.priority, m.atoms.iter().min().copied().unwrap_or(usize::MAX)))
}
