//! The vocabulary of operators and terminals that expression trees are built from.
//!
//! A [`PrimitiveSet`] groups operators into *arity buckets*. Buckets are kept sorted by arity,
//! so bucket `b` always refers to the `b`-th smallest registered arity. Operators inside a
//! bucket, and terminals, keep their registration order.
//!
//! Once handed to an [`Enumerator`][crate::enumerator::Enumerator] the set is frozen behind an
//! [`Arc`][std::sync::Arc] and never mutated again. Shipping it to another process goes through
//! [`PrimitiveSetSnapshot`], a versioned plain-data form.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{EnumerationError, Result};

/// Current format version of [`PrimitiveSetSnapshot`] and
/// [`EnumeratorSnapshot`][crate::enumerator::EnumeratorSnapshot].
pub const SNAPSHOT_VERSION: u32 = 1;

/// Operators sharing one arity, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorBucket {
    pub arity: usize,
    pub names: Vec<String>,
}

/// What a terminal stands for. Both kinds are leaves and count toward the terminal vocabulary.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalKind {
    Variable,
    FittingParameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terminal {
    pub name: String,
    pub kind: TerminalKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimitiveSet {
    buckets: Vec<OperatorBucket>,
    terminals: Vec<Terminal>,
}

impl PrimitiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operator of the given arity.
    ///
    /// Fails with [`EnumerationError::InvalidArity`] when `arity == 0` and with
    /// [`EnumerationError::DuplicatePrimitive`] when the bucket already holds `name`.
    pub fn add_operator(&mut self, name: impl Into<String>, arity: usize) -> Result<()> {
        let name = name.into();
        debug!("add_operator(name = {}, arity = {})", name, arity);

        if arity < 1 {
            return Err(EnumerationError::InvalidArity { name, arity });
        }

        match self.buckets.binary_search_by_key(&arity, |bucket| bucket.arity) {
            Ok(b) => {
                let bucket = &mut self.buckets[b];
                if bucket.names.contains(&name) {
                    return Err(EnumerationError::DuplicatePrimitive {
                        name,
                        kind: format!("an operator of arity {}", arity),
                    });
                }
                bucket.names.push(name);
            }
            Err(b) => {
                self.buckets.insert(b, OperatorBucket { arity, names: vec![name] });
            }
        }
        Ok(())
    }

    /// Appends a variable to the terminal list.
    pub fn add_variable(&mut self, name: impl Into<String>) -> Result<()> {
        self.add_terminal(name.into(), TerminalKind::Variable)
    }

    /// Appends a fitting-parameter placeholder to the terminal list.
    pub fn add_fitting_parameter(&mut self, name: impl Into<String>) -> Result<()> {
        self.add_terminal(name.into(), TerminalKind::FittingParameter)
    }

    fn add_terminal(&mut self, name: String, kind: TerminalKind) -> Result<()> {
        debug!("add_terminal(name = {}, kind = {:?})", name, kind);
        if self.terminals.iter().any(|t| t.name == name) {
            return Err(EnumerationError::DuplicatePrimitive {
                name,
                kind: "a terminal".to_string(),
            });
        }
        self.terminals.push(Terminal { name, kind });
        Ok(())
    }
}

impl PrimitiveSet {
    /// Registered arities, ascending.
    pub fn get_arities(&self) -> Vec<usize> {
        self.buckets.iter().map(|bucket| bucket.arity).collect()
    }

    /// Operator names of every bucket, in ascending-arity order.
    pub fn get_operators(&self) -> Vec<&[String]> {
        self.buckets.iter().map(|bucket| bucket.names.as_slice()).collect()
    }

    /// Operator names of a single arity, or `None` if no operator has that arity.
    pub fn get_operators_of_arity(&self, arity: usize) -> Option<&[String]> {
        self.bucket_of_arity(arity).map(|b| self.buckets[b].names.as_slice())
    }

    /// All terminal names, in registration order.
    pub fn get_terminals(&self) -> Vec<&str> {
        self.terminals.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.terminals_of_kind(TerminalKind::Variable)
    }

    pub fn fitting_parameters(&self) -> impl Iterator<Item = &str> {
        self.terminals_of_kind(TerminalKind::FittingParameter)
    }

    fn terminals_of_kind(&self, kind: TerminalKind) -> impl Iterator<Item = &str> {
        self.terminals
            .iter()
            .filter(move |t| t.kind == kind)
            .map(|t| t.name.as_str())
    }

    pub fn buckets(&self) -> &[OperatorBucket] {
        &self.buckets
    }

    pub fn terminal(&self, index: usize) -> Option<&Terminal> {
        self.terminals.get(index)
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    pub fn num_terminals(&self) -> usize {
        self.terminals.len()
    }

    /// Index of the bucket holding operators of `arity`.
    pub fn bucket_of_arity(&self, arity: usize) -> Option<usize> {
        self.buckets.binary_search_by_key(&arity, |bucket| bucket.arity).ok()
    }

    pub(crate) fn terminal_position(&self, name: &str) -> Option<usize> {
        self.terminals.iter().position(|t| t.name == name)
    }
}

/// Plain-data form of a [`PrimitiveSet`], used for transport across process boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveSetSnapshot {
    pub version: u32,
    pub operators: Vec<OperatorBucket>,
    pub terminals: Vec<Terminal>,
}

impl PrimitiveSetSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl PrimitiveSet {
    pub fn snapshot(&self) -> PrimitiveSetSnapshot {
        PrimitiveSetSnapshot {
            version: SNAPSHOT_VERSION,
            operators: self.buckets.clone(),
            terminals: self.terminals.clone(),
        }
    }

    /// Rebuilds a set from a snapshot, re-running every registration check.
    pub fn restore(snapshot: &PrimitiveSetSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(EnumerationError::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut pset = PrimitiveSet::new();
        for bucket in &snapshot.operators {
            for name in &bucket.names {
                pset.add_operator(name.clone(), bucket.arity)?;
            }
        }
        for terminal in &snapshot.terminals {
            pset.add_terminal(terminal.name.clone(), terminal.kind)?;
        }
        Ok(pset)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.snapshot().to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::restore(&PrimitiveSetSnapshot::from_bytes(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ant_set() -> PrimitiveSet {
        let mut pset = PrimitiveSet::new();
        pset.add_operator("ant.if_food_ahead", 2).unwrap();
        pset.add_operator("prog2", 2).unwrap();
        pset.add_operator("prog3", 3).unwrap();
        pset.add_variable("ant.move_forward()").unwrap();
        pset.add_variable("ant.turn_left()").unwrap();
        pset.add_variable("ant.turn_right()").unwrap();
        pset
    }

    #[test]
    fn test_arities_ascending() {
        let mut pset = PrimitiveSet::new();
        pset.add_operator("add", 2).unwrap();
        pset.add_operator("sub", 1).unwrap();
        pset.add_operator("truediv", 3).unwrap();
        pset.add_operator("mul", 1).unwrap();

        assert_eq!(pset.get_arities(), vec![1, 2, 3]);
        assert_eq!(pset.get_operators_of_arity(1).unwrap(), ["sub", "mul"]);
        assert_eq!(pset.get_operators_of_arity(2).unwrap(), ["add"]);
        assert_eq!(pset.get_operators_of_arity(4), None);
        assert_eq!(pset.bucket_of_arity(3), Some(2));
    }

    #[test]
    fn test_invalid_arity() {
        let mut pset = PrimitiveSet::new();
        let err = pset.add_operator("nullary", 0).unwrap_err();
        assert!(matches!(err, EnumerationError::InvalidArity { arity: 0, .. }));
        assert!(pset.get_arities().is_empty());
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut pset = PrimitiveSet::new();
        pset.add_operator("f", 2).unwrap();
        assert!(matches!(
            pset.add_operator("f", 2),
            Err(EnumerationError::DuplicatePrimitive { .. })
        ));
        // Same name under another arity is a distinct operator.
        pset.add_operator("f", 1).unwrap();

        pset.add_variable("x").unwrap();
        assert!(pset.add_fitting_parameter("x").is_err());
    }

    #[test]
    fn test_terminal_kinds() {
        let mut pset = PrimitiveSet::new();
        pset.add_variable("x").unwrap();
        pset.add_fitting_parameter("p0").unwrap();
        pset.add_variable("y").unwrap();

        assert_eq!(pset.get_terminals(), vec!["x", "p0", "y"]);
        assert_eq!(pset.variables().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(pset.fitting_parameters().collect::<Vec<_>>(), vec!["p0"]);
        assert_eq!(pset.num_terminals(), 3);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let pset = ant_set();
        let bytes = pset.to_bytes().unwrap();
        drop(pset);

        let restored = PrimitiveSet::from_bytes(&bytes).unwrap();
        assert_eq!(restored.get_arities(), vec![2, 3]);
        assert_eq!(restored.get_operators_of_arity(2).unwrap(), ["ant.if_food_ahead", "prog2"]);
        let operators = restored.get_operators();
        assert_eq!(operators.len(), 2);
        assert_eq!(operators[0], ["ant.if_food_ahead", "prog2"]);
        assert_eq!(operators[1], ["prog3"]);
        assert_eq!(restored, ant_set());
    }

    #[test]
    fn test_snapshot_version_checked() {
        let mut snapshot = ant_set().snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        assert!(matches!(
            PrimitiveSet::restore(&snapshot),
            Err(EnumerationError::SnapshotVersion { .. })
        ));
    }

    #[test]
    fn test_snapshot_revalidates() {
        let mut snapshot = ant_set().snapshot();
        snapshot.operators[0].arity = 0;
        assert!(matches!(
            PrimitiveSet::restore(&snapshot),
            Err(EnumerationError::InvalidArity { .. })
        ));
    }
}
