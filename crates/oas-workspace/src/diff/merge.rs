//! Merging two diffs computed against a common base.
//!
//! Used by the rebase coordinator: one diff describes the remote side, the
//! other the local side. Changes that touch overlapping paths on opposite
//! sides become conflicts for the caller to resolve; everything else is
//! collected for automatic application.

use oas_json::pointer::{is_prefix_of, paths_overlap};

use super::{Change, ChangeKind};

/// One conflict: the first diff's changes and the second diff's changes
/// over one overlapping path group.
pub type Conflict = (Vec<Change>, Vec<Change>);

/// Outcome of [`merge`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeResult {
    /// Non-conflicting changes, first diff's changes first.
    pub changes: Vec<Change>,
    /// Overlapping change groups, one entry per connected group.
    pub conflicts: Vec<Conflict>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Pending,
    Keep,
    Drop,
    Conflicted,
}

/// Merge two diffs over the same base document.
///
/// Rules, in order:
///
/// 1. A delete whose path is a strict descendant of a delete on the other
///    side is absorbed by it; only the ancestor delete survives.
/// 2. Identical changes present on both sides count once.
/// 3. Remaining changes on opposite sides conflict when their paths
///    overlap (equal, or one an ancestor of the other). Transitively
///    connected changes form a single conflict entry, so one wide change
///    (say, a subtree delete) groups against every opposing change inside
///    that subtree.
/// 4. Everything untouched is auto-applied: surviving first-side changes
///    in order, then surviving second-side changes.
pub fn merge(first: Vec<Change>, second: Vec<Change>) -> MergeResult {
    let mut first_slots = vec![Slot::Pending; first.len()];
    let mut second_slots = vec![Slot::Pending; second.len()];

    // Rule 1: ancestor deletes absorb opposing descendant deletes.
    for (i, a) in first.iter().enumerate() {
        for (j, b) in second.iter().enumerate() {
            if a.kind != ChangeKind::Delete || b.kind != ChangeKind::Delete {
                continue;
            }
            if is_prefix_of(&a.path, &b.path) {
                second_slots[j] = Slot::Drop;
            } else if is_prefix_of(&b.path, &a.path) {
                first_slots[i] = Slot::Drop;
            }
        }
    }

    // Rule 2: identical changes on both sides collapse into one.
    for (i, a) in first.iter().enumerate() {
        if first_slots[i] != Slot::Pending {
            continue;
        }
        for (j, b) in second.iter().enumerate() {
            if second_slots[j] == Slot::Pending && a == b {
                second_slots[j] = Slot::Drop;
                break;
            }
        }
    }

    // Rule 3: connected components over the path-overlap relation.
    let mut conflicts = Vec::new();
    for i in 0..first.len() {
        if first_slots[i] != Slot::Pending {
            continue;
        }
        // Grow the component from this seed, alternating sides until fixed.
        let mut component_first = vec![i];
        let mut component_second: Vec<usize> = Vec::new();
        loop {
            let mut grew = false;
            for (j, b) in second.iter().enumerate() {
                if second_slots[j] != Slot::Pending || component_second.contains(&j) {
                    continue;
                }
                if component_first
                    .iter()
                    .any(|&fi| paths_overlap(&first[fi].path, &b.path))
                {
                    component_second.push(j);
                    grew = true;
                }
            }
            for (fi, a) in first.iter().enumerate() {
                if first_slots[fi] != Slot::Pending || component_first.contains(&fi) {
                    continue;
                }
                if component_second
                    .iter()
                    .any(|&sj| paths_overlap(&second[sj].path, &a.path))
                {
                    component_first.push(fi);
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }
        if component_second.is_empty() {
            continue;
        }
        component_first.sort_unstable();
        component_second.sort_unstable();
        for &fi in &component_first {
            first_slots[fi] = Slot::Conflicted;
        }
        for &sj in &component_second {
            second_slots[sj] = Slot::Conflicted;
        }
        conflicts.push((
            component_first.iter().map(|&fi| first[fi].clone()).collect(),
            component_second
                .iter()
                .map(|&sj| second[sj].clone())
                .collect(),
        ));
    }

    // Rule 4: survivors are applied automatically.
    let mut changes = Vec::new();
    for (i, slot) in first_slots.iter_mut().enumerate() {
        if *slot == Slot::Pending {
            *slot = Slot::Keep;
            changes.push(first[i].clone());
        }
    }
    for (j, slot) in second_slots.iter_mut().enumerate() {
        if *slot == Slot::Pending {
            *slot = Slot::Keep;
            changes.push(second[j].clone());
        }
    }

    MergeResult { changes, conflicts }
}
