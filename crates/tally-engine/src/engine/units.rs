//! Interned unit descriptors.
//!
//! A [`Units`] value is a pair of name sets (numerator, denominator). Two
//! descriptors with the same sets, given in any order, intern to the same
//! [`UnitsId`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Handle to an interned [`Units`] inside one graph's registry.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct UnitsId(u32);

/// Numerator and denominator unit names, kept sorted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Units {
    num: BTreeSet<String>,
    den: BTreeSet<String>,
}

impl Units {
    pub fn numerator(&self) -> impl Iterator<Item = &str> {
        self.num.iter().map(String::as_str)
    }

    pub fn denominator(&self) -> impl Iterator<Item = &str> {
        self.den.iter().map(String::as_str)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.num.is_empty() && self.den.is_empty()
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num: Vec<&str> = self.numerator().collect();
        let den: Vec<&str> = self.denominator().collect();
        if num.is_empty() {
            write!(f, "1")?;
        } else {
            write!(f, "{}", num.join("*"))?;
        }
        if !den.is_empty() {
            write!(f, "/{}", den.join("*"))?;
        }
        Ok(())
    }
}

/// Owns every [`Units`] created for a graph.
#[derive(Debug, Default)]
pub struct UnitsRegistry {
    units: Vec<Units>,
    by_sets: HashMap<(BTreeSet<String>, BTreeSet<String>), UnitsId>,
}

impl UnitsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical id for the given name sets, creating it on first use.
    pub fn intern<N, D>(&mut self, num: N, den: D) -> UnitsId
    where
        N: IntoIterator,
        N::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        let num: BTreeSet<String> = num.into_iter().map(Into::into).collect();
        let den: BTreeSet<String> = den.into_iter().map(Into::into).collect();
        let key = (num, den);
        if let Some(id) = self.by_sets.get(&key) {
            return *id;
        }
        let id = UnitsId(self.units.len() as u32);
        self.units.push(Units {
            num: key.0.clone(),
            den: key.1.clone(),
        });
        self.by_sets.insert(key, id);
        id
    }

    pub fn get(&self, id: UnitsId) -> &Units {
        &self.units[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
