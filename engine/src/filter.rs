//! FILENAME: engine/src/filter.rs
//! Exact-match filter criteria over the four dimensions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// An immutable exact-match constraint per dimension. `None` means the
/// dimension is unconstrained. Equality over all four components is what
/// identifies a cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_sub_type: Option<String>,
    #[serde(default)]
    pub entity_name: Option<String>,
}

impl FilterCriteria {
    /// Criteria matching every record.
    pub fn unfiltered() -> Self {
        FilterCriteria::default()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.date.is_none()
            && self.entity_type.is_none()
            && self.entity_sub_type.is_none()
            && self.entity_name.is_none()
    }

    /// Whether a record satisfies every constrained component.
    pub fn matches(&self, record: &Record) -> bool {
        self.date.map_or(true, |d| d == record.date)
            && self
                .entity_type
                .as_deref()
                .map_or(true, |v| v == record.entity_type)
            && self
                .entity_sub_type
                .as_deref()
                .map_or(true, |v| v == record.entity_sub_type)
            && self
                .entity_name
                .as_deref()
                .map_or(true, |v| v == record.entity_name)
    }
}
