//! Three-way comparison of a current and a desired list

use std::collections::HashSet;

/// Result of comparing a current list against a desired list
///
/// Duplicates are collapsed; each set keeps the order of the list its
/// entries come from.
///
/// - `to_add ∪ unchanged = desired`
/// - `to_remove ∪ unchanged = current`
/// - `to_add ∩ to_remove = ∅`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDiff {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
    pub unchanged: Vec<String>,
}

impl AttributeDiff {
    pub fn compute<S: AsRef<str>, T: AsRef<str>>(current: &[S], desired: &[T]) -> Self {
        let current_set: HashSet<&str> = current.iter().map(|s| s.as_ref()).collect();
        let desired_set: HashSet<&str> = desired.iter().map(|s| s.as_ref()).collect();

        let mut diff = Self::default();
        let mut seen = HashSet::new();
        for item in current.iter().map(|s| s.as_ref()) {
            if !seen.insert(item) {
                continue;
            }
            if desired_set.contains(item) {
                diff.unchanged.push(item.to_string());
            } else {
                diff.to_remove.push(item.to_string());
            }
        }

        let mut seen = HashSet::new();
        for item in desired.iter().map(|s| s.as_ref()) {
            if seen.insert(item) && !current_set.contains(item) {
                diff.to_add.push(item.to_string());
            }
        }

        diff
    }

    /// True if applying the diff would write nothing
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
