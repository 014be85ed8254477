//! Listings and the reconciliation planner.
//!
//! Both sides of a sync pass are summarized as a [`Listing`]: an optional
//! version tag plus one [`Entry`] per key. [`plan`] compares two listings and
//! produces the [`ChangeSet`] that brings the local side up to date.

use crate::error::{FetchError, FetchResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// One keyed entry of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Change detector. Entries with equal fingerprints are identical.
    pub fingerprint: String,
    /// The entry's content.
    pub payload: Json,
}

impl Entry {
    /// Creates an entry whose fingerprint is the compact JSON of `payload`.
    pub fn from_payload(payload: Json) -> Self {
        Self {
            fingerprint: payload.to_string(),
            payload,
        }
    }
}

/// A versioned set of keyed entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// Version tag of the whole set, if known.
    pub version: Option<String>,
    /// Entries by key.
    pub entries: BTreeMap<String, Entry>,
}

impl Listing {
    /// Creates an empty listing.
    pub fn new(version: Option<String>) -> Self {
        Self {
            version,
            entries: BTreeMap::new(),
        }
    }

    /// Adds an entry.
    pub fn insert(&mut self, key: impl Into<String>, entry: Entry) {
        self.entries.insert(key.into(), entry);
    }

    /// Decodes a remote listing document.
    ///
    /// The document is `{"version": "...", "data": {"<key>": {...}, ...}}`.
    /// `version` is optional; a string or number is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Decode`] if `data` is missing or not an object.
    pub fn from_remote(document: &Json) -> FetchResult<Self> {
        let data = document
            .get("data")
            .and_then(Json::as_object)
            .ok_or_else(|| FetchError::Decode("listing has no data object".into()))?;

        let version = match document.get("version") {
            Some(Json::String(v)) => Some(v.clone()),
            Some(Json::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let entries = data
            .iter()
            .map(|(key, payload)| (key.clone(), Entry::from_payload(payload.clone())))
            .collect();

        Ok(Self { version, entries })
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Changes needed to bring a local listing up to date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Version to record after applying.
    pub version: Option<String>,
    /// Remote entries missing locally.
    pub inserts: BTreeMap<String, Entry>,
    /// Remote entries that replace local ones.
    pub updates: BTreeMap<String, Entry>,
    /// Local keys absent remotely.
    pub deletes: Vec<String>,
}

impl ChangeSet {
    /// Returns true if nothing needs to change.
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }
}

/// Computes the changes that turn `local` into `remote`.
///
/// Unless `force` is set, equal version tags on both sides mean nothing has
/// changed. Forcing rewrites every shared entry.
pub fn plan(local: &Listing, remote: &Listing, force: bool) -> ChangeSet {
    let mut changes = ChangeSet {
        version: remote.version.clone(),
        ..ChangeSet::default()
    };

    if !force && local.version.is_some() && local.version == remote.version {
        return changes;
    }

    for (key, entry) in &remote.entries {
        match local.entries.get(key) {
            None => {
                changes.inserts.insert(key.clone(), entry.clone());
            }
            Some(existing) if force || existing.fingerprint != entry.fingerprint => {
                changes.updates.insert(key.clone(), entry.clone());
            }
            Some(_) => {}
        }
    }

    changes.deletes = local
        .entries
        .keys()
        .filter(|key| !remote.entries.contains_key(*key))
        .cloned()
        .collect();

    changes
}
