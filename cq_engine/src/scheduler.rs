use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Groups timers so they can be dropped together. Each scene entry gets a
/// fresh scope; the engine scope lives for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScopeId(u64);

impl ScopeId {
    pub const ENGINE: ScopeId = ScopeId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TimerHandle(u64);

struct Entry<C> {
    handle: TimerHandle,
    scope: ScopeId,
    interval_ms: Option<u64>,
    callback: C,
}

#[derive(Debug, Clone, Copy)]
struct Firing {
    handle: TimerHandle,
    scope: ScopeId,
    due_ms: u64,
    interval_ms: u64,
    cancelled: bool,
}

/// Timer popped by [`Scheduler::pop_due`], ready to run.
pub struct DueTimer<C> {
    pub handle: TimerHandle,
    pub scope: ScopeId,
    pub due_ms: u64,
    pub callback: C,
}

/// Virtual-time timer queue. Timers fire in due-time order; timers due at the
/// same instant fire in the order they were scheduled. Nothing here reads a
/// real clock: the owner decides what "now" is.
pub struct Scheduler<C> {
    queue: BTreeMap<(u64, TimerHandle), Entry<C>>,
    due_by_handle: BTreeMap<TimerHandle, u64>,
    open_scopes: BTreeSet<ScopeId>,
    next_handle: u64,
    next_scope: u64,
    firing: Option<Firing>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        let mut open_scopes = BTreeSet::new();
        open_scopes.insert(ScopeId::ENGINE);
        Scheduler {
            queue: BTreeMap::new(),
            due_by_handle: BTreeMap::new(),
            open_scopes,
            next_handle: 1,
            next_scope: 1,
            firing: None,
        }
    }

    pub fn open_scope(&mut self) -> ScopeId {
        let scope = ScopeId(self.next_scope);
        self.next_scope += 1;
        self.open_scopes.insert(scope);
        scope
    }

    pub fn is_scope_open(&self, scope: ScopeId) -> bool {
        self.open_scopes.contains(&scope)
    }

    /// Drops every pending timer of `scope` and closes it so later requests
    /// against it are refused. Returns how many timers were dropped.
    pub fn cancel_scope(&mut self, scope: ScopeId) -> usize {
        if scope == ScopeId::ENGINE {
            log::warn!("refusing to cancel the engine timer scope");
            return 0;
        }
        self.open_scopes.remove(&scope);
        let doomed: Vec<(u64, TimerHandle)> = self
            .queue
            .iter()
            .filter(|(_, entry)| entry.scope == scope)
            .map(|(key, _)| *key)
            .collect();
        for key in &doomed {
            self.queue.remove(key);
            self.due_by_handle.remove(&key.1);
        }
        doomed.len()
    }

    pub fn schedule_once(
        &mut self,
        scope: ScopeId,
        now_ms: u64,
        delay_ms: u64,
        callback: C,
    ) -> Option<TimerHandle> {
        self.insert(scope, now_ms.saturating_add(delay_ms), None, callback)
    }

    /// Schedules a repeating timer. A zero interval is bumped to 1 ms so a
    /// single advance can never loop forever.
    pub fn schedule_repeat(
        &mut self,
        scope: ScopeId,
        now_ms: u64,
        interval_ms: u64,
        callback: C,
    ) -> Option<TimerHandle> {
        let interval_ms = interval_ms.max(1);
        self.insert(
            scope,
            now_ms.saturating_add(interval_ms),
            Some(interval_ms),
            callback,
        )
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if let Some(due) = self.due_by_handle.remove(&handle) {
            self.queue.remove(&(due, handle));
            return true;
        }
        match self.firing.as_mut() {
            Some(firing) if firing.handle == handle && !firing.cancelled => {
                firing.cancelled = true;
                true
            }
            _ => false,
        }
    }

    /// Removes the earliest timer due at or before `until_ms`.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<DueTimer<C>> {
        self.firing = None;
        let (&(due_ms, handle), _) = self.queue.iter().next()?;
        if due_ms > until_ms {
            return None;
        }
        let entry = self.queue.remove(&(due_ms, handle))?;
        self.due_by_handle.remove(&handle);
        if let Some(interval_ms) = entry.interval_ms {
            self.firing = Some(Firing {
                handle,
                scope: entry.scope,
                due_ms,
                interval_ms,
                cancelled: false,
            });
        }
        Some(DueTimer {
            handle: entry.handle,
            scope: entry.scope,
            due_ms,
            callback: entry.callback,
        })
    }

    /// Puts a repeating timer back after it ran, unless it was cancelled while
    /// running or its scope closed in the meantime.
    pub fn rearm(&mut self, handle: TimerHandle, callback: C) -> bool {
        let Some(firing) = self.firing.take() else {
            return false;
        };
        if firing.handle != handle || firing.cancelled || !self.is_scope_open(firing.scope) {
            return false;
        }
        let due = firing.due_ms.saturating_add(firing.interval_ms);
        self.due_by_handle.insert(handle, due);
        self.queue.insert(
            (due, handle),
            Entry {
                handle,
                scope: firing.scope,
                interval_ms: Some(firing.interval_ms),
                callback,
            },
        );
        true
    }

    pub fn pending_in(&self, scope: ScopeId) -> usize {
        self.queue
            .values()
            .filter(|entry| entry.scope == scope)
            .count()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn insert(
        &mut self,
        scope: ScopeId,
        due_ms: u64,
        interval_ms: Option<u64>,
        callback: C,
    ) -> Option<TimerHandle> {
        if !self.is_scope_open(scope) {
            log::debug!("timer refused: scope {scope:?} is closed");
            return None;
        }
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.due_by_handle.insert(handle, due_ms);
        self.queue.insert(
            (due_ms, handle),
            Entry {
                handle,
                scope,
                interval_ms,
                callback,
            },
        );
        Some(handle)
    }
}
