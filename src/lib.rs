use petgraph::graph::UnGraph;

mod element;
pub use element::*;

mod graph;
pub use graph::*;

mod groups;
pub use groups::*;

mod validate;
pub use validate::*;

mod naming;
pub use naming::*;

mod analyze;
pub use analyze::*;

mod visualize;
pub use visualize::*;

/// A heavy atom in a drawn structure. Hydrogens may appear explicitly as
/// their own atoms, or implicitly via `implicit_hydrogens`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Caller-supplied node id, kept verbatim so duplicates can be reported.
    pub id: String,
    /// Normalized element symbol, e.g. "C", "Cl".
    pub symbol: String,
    pub charge: i32,
    pub implicit_hydrogens: u8,
    pub aromatic: bool,
}

impl Atom {
    pub fn is_carbon(&self) -> bool {
        self.symbol == "C"
    }

    pub fn is_hydrogen(&self) -> bool {
        self.symbol == "H"
    }

    pub fn is(&self, symbol: &str) -> bool {
        self.symbol == symbol
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self.symbol.as_str(), "F" | "Cl" | "Br" | "I")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Numeric bond order used for valence sums and the adjacency matrix.
    pub fn as_f64(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    pub fn from_f64(order: f64) -> Option<Self> {
        if order == 1.0 {
            Some(BondOrder::Single)
        } else if order == 2.0 {
            Some(BondOrder::Double)
        } else if order == 3.0 {
            Some(BondOrder::Triple)
        } else if order == 1.5 {
            Some(BondOrder::Aromatic)
        } else {
            None
        }
    }

    /// Maps the wire-format bond type ("single", "double", ...) to an order.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "single" => Some(BondOrder::Single),
            "double" => Some(BondOrder::Double),
            "triple" => Some(BondOrder::Triple),
            "aromatic" => Some(BondOrder::Aromatic),
            _ => None,
        }
    }
}

pub type MoleculeGraph = UnGraph<Atom, BondOrder>;

/// Install a global fmt subscriber at the given level. Intended for binaries
/// and test debugging; calling it twice is harmless.
pub fn init_logging(level: &str) {
    use tracing_subscriber::filter::LevelFilter;

    let filter = match level.to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(filter)
        .try_init();
}
