use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::Atom;

/// Valence bounds for one element. `default` drives implicit-hydrogen
/// completion; `min`/`max` drive the semantic checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValenceRule {
    pub min: u8,
    pub default: u8,
    pub max: u8,
}

const fn rule(min: u8, default: u8, max: u8) -> ValenceRule {
    ValenceRule { min, default, max }
}

/// Valence assumed for elements missing from the table.
pub const FALLBACK_VALENCE: ValenceRule = rule(4, 4, 4);

lazy_static! {
    static ref VALENCE_TABLE: HashMap<&'static str, ValenceRule> = {
        let mut m = HashMap::new();
        m.insert("H", rule(1, 1, 1));
        m.insert("B", rule(3, 3, 3));
        m.insert("C", rule(4, 4, 4));
        m.insert("N", rule(3, 3, 5));
        m.insert("O", rule(2, 2, 2));
        m.insert("F", rule(1, 1, 1));
        m.insert("Na", rule(1, 1, 1));
        m.insert("Mg", rule(2, 2, 2));
        m.insert("P", rule(3, 3, 5));
        m.insert("S", rule(2, 2, 6));
        m.insert("Cl", rule(1, 1, 7));
        m.insert("K", rule(1, 1, 1));
        m.insert("Ca", rule(2, 2, 2));
        m.insert("Br", rule(1, 1, 7));
        m.insert("I", rule(1, 1, 7));
        m
    };

    static ref ELEMENT_NAMES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("H", "hydrogen");
        m.insert("B", "boron");
        m.insert("C", "carbon");
        m.insert("N", "nitrogen");
        m.insert("O", "oxygen");
        m.insert("F", "fluorine");
        m.insert("Na", "sodium");
        m.insert("Mg", "magnesium");
        m.insert("P", "phosphorus");
        m.insert("S", "sulfur");
        m.insert("Cl", "chlorine");
        m.insert("K", "potassium");
        m.insert("Ca", "calcium");
        m.insert("Br", "bromine");
        m.insert("I", "iodine");
        m
    };
}

pub fn valence_rule(symbol: &str) -> Option<ValenceRule> {
    VALENCE_TABLE.get(symbol).copied()
}

pub fn element_name(symbol: &str) -> Option<&'static str> {
    ELEMENT_NAMES.get(symbol).copied()
}

/// Hydrogens to infer on an atom given the sum of its explicit bond orders.
/// Aromatic bonds contribute 1.5 each; the fractional remainder is floored.
pub fn implicit_hydrogens(atom: &Atom, bonded_order_sum: f64) -> u8 {
    let rule = valence_rule(&atom.symbol).unwrap_or(FALLBACK_VALENCE);
    let free = rule.default as f64 + atom.charge as f64 - bonded_order_sum;
    if free <= 0.0 {
        0
    } else {
        free.floor() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ValenceViolation {
    pub severity: Severity,
    pub message: String,
}

/// Checks one atom's total valence (explicit bond orders + inferred
/// hydrogens) against the element's bounds.
///
/// Carbon is never flagged for exceeding its maximum: hand-drawn structures
/// routinely over-bond a carbon while sketching and students should not be
/// stopped by that. Unknown elements get a warning and skip the range check.
pub fn check_valence(index: usize, atom: &Atom, bonded_order_sum: f64) -> Option<ValenceViolation> {
    let rule = match valence_rule(&atom.symbol) {
        Some(rule) => rule,
        None => {
            return Some(ValenceViolation {
                severity: Severity::Warning,
                message: format!(
                    "atom {} has unknown element '{}'; assuming valence 4",
                    index, atom.symbol
                ),
            });
        }
    };

    let total = bonded_order_sum + implicit_hydrogens(atom, bonded_order_sum) as f64;
    if total < rule.min as f64 {
        return Some(ValenceViolation {
            severity: Severity::Error,
            message: format!(
                "atom {} ({}) is under-bonded: total valence {} is below the minimum {}",
                index, atom.symbol, total, rule.min
            ),
        });
    }
    if total > rule.max as f64 && !atom.is_carbon() {
        return Some(ValenceViolation {
            severity: Severity::Warning,
            message: format!(
                "atom {} ({}) exceeds the usual maximum valence {} (has {})",
                index, atom.symbol, rule.max, total
            ),
        });
    }
    None
}
