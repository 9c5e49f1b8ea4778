use std::sync::Arc;

use dashmap::DashMap;

/// Identifies one cooldown: a user of one command in one guild.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CooldownKey {
    pub guild_id: i64,
    pub subject_id: i64,
    pub command: &'static str,
}

/// Per-process command cooldowns, cheap to clone and shared between clones.
///
/// Entries map to the epoch millisecond at which they end. Lapsed entries are ignored by
/// lookups and removed by [`CooldownCache::purge_expired`], which the reconciler runs each tick.
#[derive(Debug, Clone, Default)]
pub struct CooldownCache {
    entries: Arc<DashMap<CooldownKey, i64>>,
}

impl CooldownCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Milliseconds left on the cooldown, `None` when it is not running
    pub fn remaining(&self, key: &CooldownKey, now_ms: i64) -> Option<i64> {
        self.entries
            .get(key)
            .map(|ends_at| *ends_at - now_ms)
            .filter(|remaining| *remaining > 0)
    }

    /// Starts (or restarts) a cooldown of `duration_ms`
    pub fn start(&self, key: CooldownKey, now_ms: i64, duration_ms: i64) {
        self.entries.insert(key, now_ms.saturating_add(duration_ms));
    }

    /// Removes every lapsed cooldown, returning how many were removed
    pub fn purge_expired(&self, now_ms: i64) -> usize {
        let mut removed = 0;

        self.entries.retain(|_, ends_at| {
            let keep = *ends_at > now_ms;
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
