//! CF attribute resolution: merges descriptor text with the optional lookup table.

use crate::domain::model::{AttributeValue, Attributes};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VariableLookup {
    pub standard_name: Option<String>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// External metadata keyed by lowercase variable name, plus dataset-wide
/// attributes merged into the global set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LookupTable {
    #[serde(default)]
    pub dataset: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub variables: HashMap<String, VariableLookup>,
}

impl LookupTable {
    pub fn variable(&self, name: &str) -> Option<&VariableLookup> {
        self.variables.get(&name.to_lowercase())
    }

    pub fn standard_name(&self, name: &str) -> Option<&str> {
        self.variable(name)?.standard_name.as_deref()
    }

    pub fn units(&self, name: &str) -> Option<&str> {
        self.variable(name)?.units.as_deref()
    }

    pub fn long_name(&self, name: &str) -> Option<&str> {
        self.variable(name)?.long_name.as_deref()
    }
}

/// Attributes of a declared data variable. Without a lookup entry the
/// free-text description stands in for `standard_name`.
pub fn variable_attributes(name: &str, description: &str, lookup: &LookupTable) -> Attributes {
    let mut attributes = Attributes::new();

    let standard_name = lookup.standard_name(name).unwrap_or(description);
    attributes.insert("standard_name".into(), standard_name.into());

    if let Some(units) = lookup.units(name) {
        attributes.insert("units".into(), units.into());
    }
    if let Some(long_name) = lookup.long_name(name) {
        attributes.insert("long_name".into(), long_name.into());
    }

    attributes
}

pub fn merge_dataset_attributes(attributes: &mut Attributes, lookup: &LookupTable) {
    for (key, value) in &lookup.dataset {
        attributes.insert(key.clone(), AttributeValue::from(value));
    }
}

pub fn time_attributes(units: &str, calendar: &str) -> Attributes {
    Attributes::from([
        ("long_name".to_string(), "time".into()),
        ("units".to_string(), units.into()),
        ("calendar".to_string(), calendar.into()),
    ])
}

pub fn latitude_attributes() -> Attributes {
    Attributes::from([
        ("long_name".to_string(), "latitude".into()),
        ("standard_name".to_string(), "latitude".into()),
        ("units".to_string(), "degrees_north".into()),
    ])
}

pub fn longitude_attributes() -> Attributes {
    Attributes::from([
        ("long_name".to_string(), "longitude".into()),
        ("standard_name".to_string(), "longitude".into()),
        ("units".to_string(), "degrees_east".into()),
    ])
}

pub fn level_attributes() -> Attributes {
    Attributes::from([
        ("units".to_string(), "meters".into()),
        ("positive".to_string(), "up".into()),
    ])
}
