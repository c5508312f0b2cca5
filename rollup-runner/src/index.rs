// Copyright (c) The scenario-rollup Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stable 1-based ordinals for scenarios, used to correlate console lines.

use crate::scenario::ScenarioId;
use std::collections::HashMap;

/// Maps scenario IDs to ordinals `1..=N`.
///
/// Built from an already sorted list of IDs: the ordinal of an ID is its 1-based position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScenarioIndex {
    ordinals: HashMap<ScenarioId, usize>,
}

impl ScenarioIndex {
    /// Builds an index from sorted IDs.
    ///
    /// If an ID appears more than once, its first position wins and later positions are left
    /// unassigned.
    pub fn build<'a>(sorted_ids: impl IntoIterator<Item = &'a ScenarioId>) -> Self {
        let mut ordinals = HashMap::new();
        for (position, id) in sorted_ids.into_iter().enumerate() {
            ordinals.entry(id.clone()).or_insert(position + 1);
        }
        Self { ordinals }
    }

    /// Returns the ordinal for `id`, or 0 if it isn't in the index.
    pub fn ordinal(&self, id: &ScenarioId) -> usize {
        self.ordinals.get(id).copied().unwrap_or(0)
    }

    /// The number of scenarios in the index.
    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    /// Returns true if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use test_strategy::proptest;

    #[test]
    fn positions_are_ordinals() {
        let ids: Vec<_> = ["a", "b", "c"].into_iter().map(ScenarioId::new).collect();
        let index = ScenarioIndex::build(&ids);
        assert_eq!(index.ordinal(&ids[0]), 1);
        assert_eq!(index.ordinal(&ids[2]), 3);
        assert_eq!(index.ordinal(&ScenarioId::new("missing")), 0);
        assert_eq!(index.len(), 3);
    }

    #[proptest(cases = 64)]
    fn ordinals_are_a_permutation(
        #[strategy(proptest::collection::btree_set("[a-z]{1,6}", 0..40))] ids: BTreeSet<String>,
    ) {
        let ids: Vec<_> = ids.iter().map(ScenarioId::new).collect();
        let index = ScenarioIndex::build(&ids);
        let mut ordinals: Vec<_> = ids.iter().map(|id| index.ordinal(id)).collect();
        ordinals.sort_unstable();
        let expected: Vec<_> = (1..=ids.len()).collect();
        assert_eq!(ordinals, expected);
    }
}
