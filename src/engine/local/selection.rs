use crate::core::GroupId;
use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

/// Sparse selection over two independent address spaces: flat result
/// indices, and image indices within a group.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    results: BTreeSet<usize>,
    images: HashMap<GroupId, BTreeSet<usize>>,
}

fn clamp(start: usize, size: usize, len: usize) -> Range<usize> {
    let start = start.min(len);
    start..start.saturating_add(size).min(len)
}

impl Selection {
    pub fn set_results(&mut self, start: usize, size: usize, len: usize, value: bool) {
        for index in clamp(start, size, len) {
            if value {
                self.results.insert(index);
            } else {
                self.results.remove(&index);
            }
        }
    }

    pub fn results(&self, start: usize, size: usize, len: usize) -> Vec<bool> {
        clamp(start, size, len)
            .map(|index| self.results.contains(&index))
            .collect()
    }

    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.results.iter().copied()
    }

    pub fn has_selection(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn select_all(&mut self, len: usize) {
        self.results = (0..len).collect();
    }

    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Re-key the flat selection after the results were permuted;
    /// `order[new] == old`.
    pub fn permute(&mut self, order: &[usize]) {
        let previous = std::mem::take(&mut self.results);
        self.results = order
            .iter()
            .enumerate()
            .filter(|(_, old)| previous.contains(old))
            .map(|(new, _)| new)
            .collect();
    }

    pub fn set_images(
        &mut self,
        group: GroupId,
        start: usize,
        size: usize,
        len: usize,
        value: bool,
    ) {
        let set = self.images.entry(group).or_default();
        for index in clamp(start, size, len) {
            if value {
                set.insert(index);
            } else {
                set.remove(&index);
            }
        }
        if set.is_empty() {
            self.images.remove(&group);
        }
    }

    pub fn images(&self, group: GroupId, start: usize, size: usize, len: usize) -> Vec<bool> {
        let set = self.images.get(&group);
        clamp(start, size, len)
            .map(|index| set.is_some_and(|s| s.contains(&index)))
            .collect()
    }

    pub fn clear_images(&mut self) {
        self.images.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_range_is_clamped() {
        let mut selection = Selection::default();
        selection.set_results(2, 10, 5, true);
        assert_eq!(
            selection.results(0, 10, 5),
            vec![false, false, true, true, true]
        );
        selection.set_results(3, 1, 5, false);
        assert_eq!(selection.selected().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_domains_are_independent() {
        let mut selection = Selection::default();
        selection.set_results(0, 3, 3, true);
        assert!(selection.images(GroupId(1), 0, 3, 3).iter().all(|v| !v));

        selection.set_images(GroupId(1), 0, 2, 3, true);
        assert_eq!(selection.results(0, 3, 3), vec![true, true, true]);

        selection.clear_results();
        assert_eq!(selection.images(GroupId(1), 0, 3, 3), vec![true, true, false]);
        assert!(selection.images(GroupId(2), 0, 3, 3).iter().all(|v| !v));
    }

    #[test]
    fn test_permute_follows_records() {
        let mut selection = Selection::default();
        selection.set_results(0, 1, 3, true);
        // old record 0 moves to position 2
        selection.permute(&[1, 2, 0]);
        assert_eq!(selection.results(0, 3, 3), vec![false, false, true]);
    }
}
