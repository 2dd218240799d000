//! Which key each recycled display target currently shows.

use std::collections::HashMap;
use std::fmt;

/// Identity of a recyclable display target (a list row, a cell, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub usize);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target {}", self.0)
    }
}

/// Authoritative target → key bindings.
///
/// Targets outlive the fetches started for them and get reassigned while
/// those fetches are in flight. A result is only applied if the target is
/// still bound to the key it was fetched for.
#[derive(Debug, Default)]
pub struct BindingGuard {
    bindings: HashMap<TargetId, String>,
}

impl BindingGuard {
    /// Create an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `target` now shows `key`. Returns the previous key.
    pub fn bind(&mut self, target: TargetId, key: impl Into<String>) -> Option<String> {
        self.bindings.insert(target, key.into())
    }

    /// Forget a detached target. Returns the key it was bound to.
    pub fn unbind(&mut self, target: TargetId) -> Option<String> {
        self.bindings.remove(&target)
    }

    /// Key currently bound to `target`.
    pub fn key_for(&self, target: TargetId) -> Option<&str> {
        self.bindings.get(&target).map(String::as_str)
    }

    /// Whether `target` is currently bound to `key`.
    pub fn is_bound(&self, target: TargetId, key: &str) -> bool {
        self.key_for(target) == Some(key)
    }

    /// Run `apply` only if `target` is still bound to `key`.
    ///
    /// Returns whether `apply` ran.
    pub fn try_apply<V>(
        &self,
        target: TargetId,
        key: &str,
        value: V,
        apply: impl FnOnce(TargetId, V),
    ) -> bool {
        if !self.is_bound(target, key) {
            tracing::debug!("Dropping stale result for {key}: {target} was rebound");
            return false;
        }
        apply(target, value);
        true
    }

    /// Number of bound targets.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no target is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Forget every binding.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_when_still_bound() {
        let mut guard = BindingGuard::new();
        guard.bind(TargetId(0), "a");

        let mut applied = Vec::new();
        assert!(guard.try_apply(TargetId(0), "a", 7, |t, v| applied.push((t, v))));
        assert_eq!(applied, vec![(TargetId(0), 7)]);
    }

    #[test]
    fn test_rebound_target_rejects_result() {
        let mut guard = BindingGuard::new();
        guard.bind(TargetId(3), "a");
        // Fetch for "a" starts here; the row is then recycled for "b".
        assert_eq!(guard.bind(TargetId(3), "b"), Some("a".to_string()));

        let mut called = false;
        assert!(!guard.try_apply(TargetId(3), "a", (), |_, ()| called = true));
        assert!(!called);
        assert!(guard.try_apply(TargetId(3), "b", (), |_, ()| called = true));
        assert!(called);
    }

    #[test]
    fn test_unbound_target_rejects_result() {
        let mut guard = BindingGuard::new();
        guard.bind(TargetId(1), "a");
        guard.unbind(TargetId(1));

        let mut called = false;
        assert!(!guard.try_apply(TargetId(1), "a", (), |_, ()| called = true));
        assert!(!called);
        assert!(guard.is_empty());
    }

    #[test]
    fn test_several_targets_share_a_key() {
        let mut guard = BindingGuard::new();
        guard.bind(TargetId(2), "a");
        guard.bind(TargetId(0), "a");
        guard.bind(TargetId(1), "b");

        assert!(guard.is_bound(TargetId(0), "a"));
        assert!(guard.is_bound(TargetId(2), "a"));
        assert!(!guard.is_bound(TargetId(1), "a"));
        assert_eq!(guard.key_for(TargetId(1)), Some("b"));
        assert_eq!(guard.len(), 3);
    }
}
