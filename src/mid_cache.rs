use std::collections::BTreeMap;

use tracing::trace;

use crate::entity::{Mid, MonsterId};

/// Maps permanent monster identities to their current slot.
#[derive(Debug, Default)]
pub struct MidCache {
    entries: BTreeMap<Mid, MonsterId>,
}

impl MidCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly created monster. Returns the entry it displaced, which
    /// is only ever `Some` when a caller registers the same mid twice.
    pub fn register(&mut self, mid: Mid, monster: MonsterId) -> Option<MonsterId> {
        trace!(%mid, slot = monster.index(), "mid registered");
        self.entries.insert(mid, monster)
    }

    pub fn resolve(&self, mid: Mid) -> Option<MonsterId> {
        self.entries.get(&mid).copied()
    }

    pub fn unregister(&mut self, mid: Mid) -> Option<MonsterId> {
        trace!(%mid, "mid unregistered");
        self.entries.remove(&mid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Mid, MonsterId)> + '_ {
        self.entries.iter().map(|(mid, monster)| (*mid, *monster))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Handle;

    #[test]
    fn test_register_resolve_unregister() {
        let mut cache = MidCache::new();
        let slot = Handle::from_raw(4, 1);
        assert_eq!(cache.register(Mid(10), slot), None);
        assert_eq!(cache.resolve(Mid(10)), Some(slot));
        assert_eq!(cache.resolve(Mid(11)), None);

        assert_eq!(cache.unregister(Mid(10)), Some(slot));
        assert_eq!(cache.resolve(Mid(10)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_double_register_reports_displaced_entry() {
        let mut cache = MidCache::new();
        cache.register(Mid(3), Handle::from_raw(0, 0));
        assert_eq!(
            cache.register(Mid(3), Handle::from_raw(1, 0)),
            Some(Handle::from_raw(0, 0))
        );
        assert_eq!(cache.len(), 1);
    }
}
