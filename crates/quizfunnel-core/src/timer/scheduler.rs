//! Deadline queue with cancellation handles.
//!
//! Stands in for `setTimeout`/`setInterval`: every scheduled task gets a
//! [`TaskHandle`], the owner cancels handles on teardown, and `take_due`
//! hands back whatever is ready when the owner ticks. Intervals are modelled
//! by rescheduling from inside the task handler.

/// Opaque handle for one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    handle: TaskHandle,
    due_ms: u64,
    task: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, task: T) -> TaskHandle {
        let handle = TaskHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            handle,
            due_ms,
            task,
        });
        handle
    }

    /// Returns `true` if the handle was still pending.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.handle != handle);
        self.pending.len() != before
    }

    /// Cancel every task matching the predicate. Returns how many were dropped.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|s| !predicate(&s.task));
        before - self.pending.len()
    }

    /// Cancel everything. Returns how many tasks were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|s| s.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest deadline among pending tasks.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|s| s.due_ms).min()
    }

    /// Remove and return every task due at or before `now_ms`,
    /// ordered by deadline, then by scheduling order.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<(TaskHandle, T)> {
        let (mut due, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|s| s.due_ms <= now_ms);
        self.pending = rest;
        due.sort_by_key(|s| (s.due_ms, s.handle.0));
        due.into_iter().map(|s| (s.handle, s.task)).collect()
    }
}
