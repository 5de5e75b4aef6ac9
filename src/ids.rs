//! Identifier Sets
//!
//! The canonical representation for every set of external identifiers the
//! engine touches: an ordered, deduplicated set of strings.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// An ordered, deduplicated set of string identifiers.
///
/// Scope dimensions, catalog answers and custom-field values all use this
/// type. An empty set is meaningful: wherever a [`Scope`](crate::rules::scope::Scope)
/// dimension holds an empty set, that dimension is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IdSet {
    ids: SmallVec<[String; 4]>,
}

impl IdSet {
    /// Create an empty identifier set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ids: SmallVec::new(),
        }
    }

    /// Create an identifier set from any iterable of strings.
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        let mut set = Self {
            ids: ids.into_iter().collect(),
        };

        set.ids.sort();
        set.ids.dedup();

        set
    }

    /// Create an identifier set from string slices.
    pub fn from_strs(ids: &[&str]) -> Self {
        Self::new(ids.iter().map(ToString::to_string))
    }

    /// Insert an identifier, keeping the set sorted and deduplicated.
    pub fn insert(&mut self, id: &str) {
        let id = id.to_string();

        if let Err(pos) = self.ids.binary_search(&id) {
            self.ids.insert(pos, id);
        }
    }

    /// Return whether the set contains the given identifier.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.binary_search_by(|probe| probe.as_str().cmp(id)).is_ok()
    }

    /// Return whether this set shares at least one identifier with `other`.
    ///
    /// Two-pointer walk over the sorted sets, O(n + m).
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let mut left = self.ids.iter();
        let mut right = other.ids.iter();
        let mut left_id = left.next();
        let mut right_id = right.next();

        while let (Some(left_ref), Some(right_ref)) = (left_id, right_id) {
            match left_ref.cmp(right_ref) {
                Ordering::Equal => return true,
                Ordering::Less => left_id = left.next(),
                Ordering::Greater => right_id = right.next(),
            }
        }

        false
    }

    /// Iterate over the identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Return the number of identifiers in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Return whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl From<Vec<String>> for IdSet {
    fn from(ids: Vec<String>) -> Self {
        Self::new(ids)
    }
}

impl From<IdSet> for Vec<String> {
    fn from(set: IdSet) -> Self {
        set.ids.into_vec()
    }
}
