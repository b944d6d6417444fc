//! Mud slippage factors
//!
//! Discounts raw pump output for fluid/solids slip in the annulus. Two
//! registered tables; which one applies is a configuration choice.

use serde::{Deserialize, Serialize};

use super::LagError;

/// One registered mud category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlippageEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub factor: f64,
}

const COARSE: &[SlippageEntry] = &[
    SlippageEntry { key: "water_based", label: "Water-Based Mud", factor: 1.00 },
    SlippageEntry { key: "oil_based", label: "Oil-Based Mud", factor: 0.90 },
    SlippageEntry { key: "heavy", label: "Heavy Mud", factor: 0.75 },
];

// Midpoints of the field ranges shown in the labels.
const FINE: &[SlippageEntry] = &[
    SlippageEntry { key: "air_drilling", label: "Air Drilling (0.3 - 0.5)", factor: 0.40 },
    SlippageEntry { key: "aerated_mud", label: "Aerated Mud (0.5 - 0.7)", factor: 0.60 },
    SlippageEntry {
        key: "low_density_wbm",
        label: "Low-Density Water-Based Mud (<9.5 ppg, 0.6 - 0.75)",
        factor: 0.675,
    },
    SlippageEntry {
        key: "high_density_wbm",
        label: "High-Density Water-Based Mud (>12 ppg, 0.75 - 0.9)",
        factor: 0.825,
    },
    SlippageEntry {
        key: "low_density_obm",
        label: "Low-Density Oil-Based Mud (<12 ppg, 0.8 - 0.9)",
        factor: 0.85,
    },
    SlippageEntry {
        key: "high_density_obm",
        label: "High-Density Oil-Based Mud (>14 ppg, 0.9 - 0.98)",
        factor: 0.94,
    },
    SlippageEntry { key: "synthetic_based", label: "Synthetic-Based Mud (0.85 - 0.98)", factor: 0.915 },
    SlippageEntry { key: "weighted_mud", label: "Weighted OBM/WBM (>16 ppg, 0.95 - 1.0)", factor: 0.975 },
];

/// Registered slippage tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlippageTable {
    /// Water-based / oil-based / heavy
    #[default]
    Coarse,
    /// Eight tiers by fluid type and density band
    Fine,
}

impl SlippageTable {
    pub const ALL: [SlippageTable; 2] = [SlippageTable::Coarse, SlippageTable::Fine];

    pub fn name(&self) -> &'static str {
        match self {
            SlippageTable::Coarse => "coarse",
            SlippageTable::Fine => "fine",
        }
    }

    pub fn entries(&self) -> &'static [SlippageEntry] {
        match self {
            SlippageTable::Coarse => COARSE,
            SlippageTable::Fine => FINE,
        }
    }

    /// Category used when a request does not name one.
    pub fn default_category(&self) -> &'static str {
        match self {
            SlippageTable::Coarse => "water_based",
            SlippageTable::Fine => "high_density_wbm",
        }
    }

    /// Look up a category by key or by its display label.
    pub fn entry(&self, key: &str) -> Option<&'static SlippageEntry> {
        self.entries().iter().find(|e| e.key == key || e.label == key)
    }

    pub fn resolve(&self, key: &str) -> Result<f64, LagError> {
        self.entry(key)
            .map(|e| e.factor)
            .ok_or_else(|| LagError::UnknownCategory {
                table: self.name().to_string(),
                key: key.to_string(),
            })
    }
}

impl std::fmt::Display for SlippageTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for SlippageTable {
    type Err = LagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlippageTable::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| LagError::UnknownTable(s.to_string()))
    }
}

/// Resolve a factor by table name and category key.
pub fn resolve_slippage(table_name: &str, category_key: &str) -> Result<f64, LagError> {
    table_name.parse::<SlippageTable>()?.resolve(category_key)
}
