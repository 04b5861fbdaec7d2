//! Column roles and per-dataset column mappings.
//!
//! Every source file names its columns differently (`Localauthority_Code`, `Area_Code`,
//! `AuthorityCode`, ...). A [`ColumnMapping`] tells the parsers which literal header plays which
//! [`SourceColumn`] role in one particular file.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};

/// Abstract role a column plays in a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceColumn {
    AuthCode,
    AuthNameEng,
    AuthNameCym,
    MeasureCode,
    MeasureName,
    /// Fixed measure code for files holding exactly one measure (the value is the code itself).
    SingleMeasureCode,
    /// Fixed measure label for files holding exactly one measure (the value is the label itself).
    SingleMeasureName,
    Year,
    Value,
}

impl SourceColumn {
    /// Position used by the authority-code table when the header does not name the column.
    pub(crate) fn default_position(self) -> Option<usize> {
        match self {
            Self::AuthCode => Some(0),
            Self::AuthNameEng => Some(1),
            Self::AuthNameCym => Some(2),
            _ => None,
        }
    }
}

impl fmt::Display for SourceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AuthCode => "auth_code",
            Self::AuthNameEng => "auth_name_eng",
            Self::AuthNameCym => "auth_name_cym",
            Self::MeasureCode => "measure_code",
            Self::MeasureName => "measure_name",
            Self::SingleMeasureCode => "single_measure_code",
            Self::SingleMeasureName => "single_measure_name",
            Self::Year => "year",
            Self::Value => "value",
        };
        f.write_str(name)
    }
}

/// Role → literal header (or fixed value, for the single-measure roles) for one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    columns: BTreeMap<SourceColumn, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, role: SourceColumn, header: impl Into<String>) -> Self {
        self.columns.insert(role, header.into());
        self
    }

    pub fn insert(&mut self, role: SourceColumn, header: impl Into<String>) {
        self.columns.insert(role, header.into());
    }

    pub fn get(&self, role: SourceColumn) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn contains(&self, role: SourceColumn) -> bool {
        self.columns.contains_key(&role)
    }

    /// Like [`Self::get`], but a missing role is an error.
    pub fn require(&self, role: SourceColumn) -> StatsResult<&str> {
        self.get(role)
            .ok_or_else(|| StatsError::not_found("column mapping role", role.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceColumn, &str)> + '_ {
        self.columns.iter().map(|(role, header)| (*role, header.as_str()))
    }

    /// Index of the column playing `role` in `headers`.
    ///
    /// Headers are matched exactly after trimming. When the mapping has no entry for `role`, or
    /// the header row does not contain it, the role's conventional position is used instead
    /// (authority code, English name and Welsh name are columns 0, 1 and 2).
    pub fn resolve_index<'h>(
        &self,
        role: SourceColumn,
        headers: impl IntoIterator<Item = &'h str>,
    ) -> StatsResult<usize> {
        if let Some(name) = self.get(role) {
            if let Some(idx) = headers.into_iter().position(|h| h.trim() == name) {
                return Ok(idx);
            }
        }
        role.default_position()
            .ok_or_else(|| StatsError::not_found("column for role", role.to_string()))
    }
}

impl FromIterator<(SourceColumn, String)> for ColumnMapping {
    fn from_iter<T: IntoIterator<Item = (SourceColumn, String)>>(iter: T) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
