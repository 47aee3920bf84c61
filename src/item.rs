//! Item identifiers.
//!
//! An item is one knowledge unit being tested for mastery. The engine never
//! interprets the id; it only compares, orders and hashes it.

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque unique identifier of a knowledge item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A set of items, ordered by id so that iteration and printing are stable.
pub type ItemSet = BTreeSet<ItemId>;

/// Build an [`ItemSet`] from anything that yields item-like values.
pub fn item_set<I, T>(items: I) -> ItemSet
where
    I: IntoIterator<Item = T>,
    T: Into<ItemId>,
{
    items.into_iter().map(Into::into).collect()
}

/// Render a set as `{a, b, c}`.
pub fn format_set(set: &ItemSet) -> String {
    let parts: Vec<&str> = set.iter().map(ItemId::as_str).collect();
    format!("{{{}}}", parts.join(", "))
}
