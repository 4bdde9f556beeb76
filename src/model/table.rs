//! Annotation tables.
//!
//! A table annotates element instances. Each row names the element it
//! belongs to through the region column and the instance it describes
//! through the instance-key column (cell id, label value, ...).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::model::ElementKey;

/// Column name used for regions when a table does not declare one.
pub const DEFAULT_REGION_KEY: &str = "region";

/// Column name used for instance ids when a table does not declare one.
pub const DEFAULT_INSTANCE_KEY: &str = "instance_id";

/// One annotation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Name of the annotated element
    pub region: String,

    /// Instance id within that element
    pub instance: i64,
}

/// Annotation table attached to a SpatialData object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationTable {
    #[serde(default = "default_region_key")]
    pub region_key: String,

    #[serde(default = "default_instance_key")]
    pub instance_key: String,

    #[serde(default)]
    pub rows: Vec<TableRow>,
}

fn default_region_key() -> String {
    DEFAULT_REGION_KEY.to_string()
}

fn default_instance_key() -> String {
    DEFAULT_INSTANCE_KEY.to_string()
}

/// The slice of a table annotating one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementAnnotation {
    /// Instance-key column the rows are matched on
    pub instance_key: String,

    /// Indices of the table rows belonging to the element
    pub rows: Vec<usize>,
}

impl ElementAnnotation {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl AnnotationTable {
    pub fn new(region_key: impl Into<String>, instance_key: impl Into<String>) -> Self {
        Self {
            region_key: region_key.into(),
            instance_key: instance_key.into(),
            rows: Vec::new(),
        }
    }

    /// Appends one row per instance id for the given region.
    pub fn with_rows(
        mut self,
        region: impl Into<String>,
        instances: impl IntoIterator<Item = i64>,
    ) -> Self {
        let region = region.into();
        self.rows.extend(instances.into_iter().map(|instance| TableRow {
            region: region.clone(),
            instance,
        }));
        self
    }

    /// Names of the regions annotated by this table, in first-row order.
    pub fn regions(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if !seen.contains(&row.region.as_str()) {
                seen.push(row.region.as_str());
            }
        }
        seen
    }

    /// Resolve the rows annotating `element`.
    ///
    /// Returns `Ok(None)` when the table has no rows for the element and
    /// `AnnotationMismatch` when an instance id occurs more than once among
    /// the element's rows.
    pub fn annotation_for(
        &self,
        element: &ElementKey,
    ) -> Result<Option<ElementAnnotation>, RegistryError> {
        let rows: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.region == *element.name)
            .map(|(i, _)| i)
            .collect();

        if rows.is_empty() {
            return Ok(None);
        }

        let mut counts: HashMap<i64, usize> = HashMap::with_capacity(rows.len());
        for &i in &rows {
            *counts.entry(self.rows[i].instance).or_default() += 1;
        }

        // Report the first duplicated id in row order so the message is stable
        if let Some(&i) = rows.iter().find(|&&i| counts[&self.rows[i].instance] > 1) {
            let instance = self.rows[i].instance;
            return Err(RegistryError::AnnotationMismatch {
                element: element.clone(),
                instance_key: self.instance_key.clone(),
                instance,
                occurrences: counts[&instance],
            });
        }

        Ok(Some(ElementAnnotation {
            instance_key: self.instance_key.clone(),
            rows,
        }))
    }
}
