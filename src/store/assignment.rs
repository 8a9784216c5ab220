//! Concrete values for free variables, as handed to `NodeBuilder::bind`.

use super::types::Ident;
use crate::error::{CircuitError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment(BTreeMap<Ident, f64>);

impl Assignment {
    pub fn new() -> Self { Self::default() }

    /// Chainable insert, for building assignments inline.
    pub fn with(mut self, ident: Ident, value: f64) -> Self {
        self.0.insert(ident, value);
        self
    }

    pub fn insert(&mut self, ident: Ident, value: f64) -> Option<f64> {
        self.0.insert(ident, value)
    }

    pub fn get(&self, ident: Ident) -> Option<f64> { self.0.get(&ident).copied() }
    pub fn contains(&self, ident: Ident) -> bool { self.0.contains_key(&ident) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (Ident, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| CircuitError::InvalidAssignment(e.to_string()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| CircuitError::InvalidAssignment(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<BTreeMap<Ident, f64>> for Assignment {
    fn from(map: BTreeMap<Ident, f64>) -> Self { Self(map) }
}

impl From<HashMap<Ident, f64>> for Assignment {
    fn from(map: HashMap<Ident, f64>) -> Self { Self(map.into_iter().collect()) }
}

impl FromIterator<(Ident, f64)> for Assignment {
    fn from_iter<I: IntoIterator<Item = (Ident, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_uses_identifier_keys() {
        let a = Assignment::new().with(Ident(1), 2.0).with(Ident(12), -0.5);
        let json = a.to_json().unwrap();
        assert_eq!(json, r#"{"1":2.0,"12":-0.5}"#);
        assert_eq!(Assignment::from_json(&json).unwrap(), a);
    }

    #[test]
    fn test_reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"3": 9.0, "4": 1.5}}"#).unwrap();

        let a = Assignment::from_reader(std::fs::File::open(file.path()).unwrap()).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a.get(Ident(3)), Some(9.0));
        assert_eq!(a.get(Ident(4)), Some(1.5));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = Assignment::from_json(r#"{"x": 1.0}"#).unwrap_err();
        assert!(matches!(err, CircuitError::InvalidAssignment(_)));
    }
}
