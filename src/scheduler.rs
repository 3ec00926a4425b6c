use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Source of "now" for timers
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug)]
struct Scheduled<T> {
    due: Instant,
    seq: u64,
    task: T,
    token: CancellationToken,
}

/// Deferred tasks, each bound to the cancellation token that was live when
/// it was scheduled. Cancelled tasks are dropped instead of returned.
#[derive(Debug)]
pub struct Scheduler<T> {
    tasks: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, task: T, token: &CancellationToken) {
        self.tasks.push(Scheduled {
            due,
            seq: self.next_seq,
            task,
            token: token.clone(),
        });
        self.next_seq += 1;
    }

    /// Removes and returns the live tasks due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<T> {
        self.tasks.retain(|t| !t.token.is_cancelled());

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due <= now);
        self.tasks = pending;

        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.task).collect()
    }

    /// Live tasks still waiting
    pub fn len(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| !t.token.is_cancelled())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.tasks
            .iter()
            .filter(|t| !t.token.is_cancelled())
            .map(|t| t.due)
            .min()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
