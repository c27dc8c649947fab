use parking_lot::{Condvar, Mutex, MutexGuard};

/// Pre-admission marker handed over when a writer leaves the node.
///
/// Whichever class the leaving writer names gets to run before anything
/// that shows up at the node afterwards: `Readers(n)` admits the `n`
/// readers that were waiting at that moment, `Writer` admits exactly one
/// waiting writer. `Free` means nobody was pre-admitted and entry is
/// decided by the counters alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Baton {
    Free,
    /// Always carries a count of at least 1.
    Readers(u32),
    Writer,
}

/// Bookkeeping for one node, guarded by the node's mutex.
pub(crate) struct State {
    active_readers: u32,
    /// 0 or 1.
    active_writers: u32,
    waiting_readers: u32,
    waiting_writers: u32,
    baton: Baton,
    /// Whether a thread is parked in [`Monitor::drain`].
    drain_waiting: bool,
}

impl State {
    /// True when nobody holds or waits for permission on the node.
    fn idle(&self) -> bool {
        self.active_readers == 0
            && self.active_writers == 0
            && self.waiting_readers == 0
            && self.waiting_writers == 0
    }
}

/// The synchronization block of a single node: a readers/writers lock
/// with a third waiting class for draining the node, built from one
/// mutex and three condition variables.
pub(crate) struct Monitor {
    state: Mutex<State>,
    readers: Condvar,
    writers: Condvar,
    cleared: Condvar,
}

impl Monitor {
    pub(crate) fn new() -> Self {
        Monitor {
            state: Mutex::new(State {
                active_readers: 0,
                active_writers: 0,
                waiting_readers: 0,
                waiting_writers: 0,
                baton: Baton::Free,
                drain_waiting: false,
            }),
            readers: Condvar::new(),
            writers: Condvar::new(),
            cleared: Condvar::new(),
        }
    }

    /// Blocks until reader permission is granted.
    ///
    /// A reader yields to any active or waiting writer unless the baton
    /// admits readers. An admitted reader passes the baton on and wakes
    /// the next one, so a whole cohort enters before newly arriving
    /// writers get another turn.
    pub(crate) fn acquire_read(&self) {
        let mut state = self.state.lock();
        while (state.active_writers > 0 || state.waiting_writers > 0)
            && !matches!(state.baton, Baton::Readers(_))
        {
            state.waiting_readers += 1;
            self.readers.wait(&mut state);
            state.waiting_readers -= 1;
        }
        state.active_readers += 1;
        match state.baton {
            Baton::Readers(1) => state.baton = Baton::Free,
            Baton::Readers(admitted) => {
                state.baton = Baton::Readers(admitted - 1);
                self.readers.notify_one();
            }
            Baton::Free | Baton::Writer => {}
        }
    }

    /// Releases reader permission. The last reader out hands the baton
    /// to a waiting writer, or wakes a draining thread.
    pub(crate) fn release_read(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.active_readers > 0);
        state.active_readers -= 1;
        if state.active_readers == 0 && state.waiting_writers > 0 {
            state.baton = Baton::Writer;
            self.writers.notify_one();
        } else if state.drain_waiting {
            self.cleared.notify_one();
        }
    }

    /// Blocks until writer permission is granted.
    pub(crate) fn acquire_write(&self) {
        let mut state = self.state.lock();
        while state.active_readers > 0
            || state.active_writers > 0
            || matches!(state.baton, Baton::Readers(_))
        {
            state.waiting_writers += 1;
            self.writers.wait(&mut state);
            state.waiting_writers -= 1;
        }
        state.active_writers = 1;
        state.baton = Baton::Free;
    }

    /// Releases writer permission. A waiting reader cohort is preferred
    /// over the next writer; with neither around, a draining thread is
    /// woken.
    pub(crate) fn release_write(&self) {
        let mut state = self.state.lock();
        debug_assert_eq!(state.active_writers, 1);
        state.active_writers -= 1;
        if state.waiting_readers > 0 {
            state.baton = Baton::Readers(state.waiting_readers);
            self.readers.notify_one();
        } else if state.waiting_writers > 0 {
            state.baton = Baton::Writer;
            self.writers.notify_one();
        } else if state.drain_waiting {
            self.cleared.notify_one();
        }
    }

    /// Blocks until nobody holds or waits for permission on the node,
    /// then returns the still-held mutex guard.
    ///
    /// The caller keeps the node's mutex locked for the rest of its
    /// critical section, so nothing can slip in between the drain and
    /// whatever the drain was for. Only meaningful while the node is
    /// unreachable from above (its parent is writer-held by the caller);
    /// otherwise new threads could queue up again the moment the counters
    /// hit zero.
    pub(crate) fn drain(&self) -> MutexGuard<'_, State> {
        let mut state = self.state.lock();
        while !state.idle() {
            state.drain_waiting = true;
            self.cleared.wait(&mut state);
            state.drain_waiting = false;
        }
        state
    }
}
