//! Immutable catalog of identities and their binary attribute profiles.

use crate::error::GameError;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One guessable identity with a fixed yes/no attribute profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    attributes: BTreeMap<String, bool>,
}

impl Identity {
    pub fn new<N, I, K>(name: N, attributes: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        Self {
            name: name.into(),
            attributes: attributes
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the identity has `attribute`. Missing attributes read as `false`.
    pub fn has(&self, attribute: &str) -> bool {
        self.attributes.get(attribute).copied().unwrap_or(false)
    }

    /// Attribute value in its 0/1 form.
    pub fn value(&self, attribute: &str) -> u8 {
        u8::from(self.has(attribute))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, bool)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), *value))
    }
}

/// The process-wide set of identities, shared read-only by every game.
#[derive(Debug, Clone)]
pub struct Catalog {
    identities: Vec<Identity>,
    index: HashMap<String, usize>,
    attributes: Vec<String>,
}

impl Catalog {
    /// Builds a catalog, deriving the sorted union of attribute names.
    pub fn new(identities: Vec<Identity>) -> Result<Self, GameError> {
        if identities.is_empty() {
            return Err(GameError::EmptyCatalog);
        }

        let mut index = HashMap::with_capacity(identities.len());
        let mut names = BTreeSet::new();
        for (position, identity) in identities.iter().enumerate() {
            if index.insert(identity.name.clone(), position).is_some() {
                return Err(GameError::DuplicateIdentity(identity.name.clone()));
            }
            names.extend(identity.attributes.keys().cloned());
        }

        Ok(Self {
            identities,
            index,
            attributes: names.into_iter().collect(),
        })
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn identity(&self, name: &str) -> Option<&Identity> {
        self.index.get(name).map(|&position| &self.identities[position])
    }

    /// All attribute names observed across identities, in sorted order.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn contains_attribute(&self, attribute: &str) -> bool {
        self.attributes
            .binary_search_by(|probe| probe.as_str().cmp(attribute))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}
