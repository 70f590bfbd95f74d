//! Column roles and the classified schema.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use super::{Column, ColumnKind, RawTable};

/// Semantic role of a column, independent of its storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Cost,
    DateTime,
    CategoricalKey,
    NumericFeature,
    Unclassified,
}

impl ColumnRole {
    /// Roles a table must carry before it can be analyzed, in reporting order.
    pub const REQUIRED: [Self; 3] = [Self::Cost, Self::DateTime, Self::CategoricalKey];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cost => "Cost",
            Self::DateTime => "DateTime",
            Self::CategoricalKey => "CategoricalKey",
            Self::NumericFeature => "NumericFeature",
            Self::Unclassified => "Unclassified",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnRole {
    type Err = String;

    /// Accepts the variant names plus short aliases (`cost`, `date`, `category`, `numeric`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "cost" => Ok(Self::Cost),
            "datetime" | "date" | "time" => Ok(Self::DateTime),
            "categoricalkey" | "categorical" | "category" | "key" => Ok(Self::CategoricalKey),
            "numericfeature" | "numeric" | "feature" => Ok(Self::NumericFeature),
            "unclassified" | "ignore" => Ok(Self::Unclassified),
            other => Err(format!(
                "unknown column role '{other}' (expected cost, datetime, categorical, numeric or unclassified)"
            )),
        }
    }
}

/// Caller-supplied role assignments that bypass heuristic classification.
pub type RoleOverrides = BTreeMap<String, ColumnRole>;

/// One column's classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub roles: BTreeSet<ColumnRole>,
    /// True when the roles came from a caller override instead of heuristics
    #[serde(default)]
    pub overridden: bool,
}

impl ClassifiedColumn {
    pub fn has(&self, role: ColumnRole) -> bool {
        self.roles.contains(&role)
    }
}

/// A RawTable annotated with per-column roles.
///
/// Columns appear in the same order as in the underlying table.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedSchema<'t> {
    table: &'t RawTable,
    columns: Vec<ClassifiedColumn>,
}

impl<'t> ClassifiedSchema<'t> {
    pub fn new(table: &'t RawTable, columns: Vec<ClassifiedColumn>) -> Self {
        Self { table, columns }
    }

    pub fn table(&self) -> &'t RawTable {
        self.table
    }

    pub fn columns(&self) -> &[ClassifiedColumn] {
        &self.columns
    }

    pub fn roles_of(&self, name: &str) -> Option<&BTreeSet<ColumnRole>> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.roles)
    }

    /// Columns carrying `role`, in column order.
    pub fn columns_with(&self, role: ColumnRole) -> impl Iterator<Item = &ClassifiedColumn> {
        self.columns.iter().filter(move |c| c.has(role))
    }

    pub fn first_with(&self, role: ColumnRole) -> Option<&ClassifiedColumn> {
        self.columns_with(role).next()
    }

    /// Raw data for the first column carrying `role`.
    pub fn first_data_with(&self, role: ColumnRole) -> Option<&'t Column> {
        let table = self.table;
        self.first_with(role).and_then(|c| table.column(&c.name))
    }

    /// Required roles no column carries, in `ColumnRole::REQUIRED` order.
    pub fn missing_required_roles(&self) -> Vec<ColumnRole> {
        ColumnRole::REQUIRED
            .into_iter()
            .filter(|role| self.first_with(*role).is_none())
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }
}
