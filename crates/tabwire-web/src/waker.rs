#![forbid(unsafe_code)]

//! Deferred, coalesced pumping of the message queue.
//!
//! In the browser nothing polls the queue: a `Dispatch::send` from a socket
//! frame or a DOM listener must arrange for the program to run. [`PumpWaker`]
//! turns any number of wakes within one task into a single zero-delay
//! timeout that calls the bound pump function.
//!
//! ```ignore
//! let waker = PumpWaker::new(scheduler.clone());
//! let queue = MessageQueue::new().with_waker({
//!     let waker = waker.clone();
//!     move || waker.wake()
//! });
//! let program = Rc::new(RefCell::new(Program::with_queue(model, queue, host)));
//! let weak = Rc::downgrade(&program);
//! waker.bind(move || {
//!     if let Some(program) = weak.upgrade() {
//!         program.borrow_mut().pump();
//!     }
//! });
//! ```

use core::fmt;
use core::time::Duration;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tabwire_backend::Scheduler;

type Pump = Rc<dyn Fn()>;

/// Schedules at most one pending pump at a time.
#[derive(Clone)]
pub struct PumpWaker {
    scheduler: Rc<dyn Scheduler>,
    pump: Rc<RefCell<Option<Pump>>>,
    scheduled: Rc<Cell<bool>>,
}

impl fmt::Debug for PumpWaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PumpWaker")
            .field("bound", &self.pump.borrow().is_some())
            .field("scheduled", &self.scheduled.get())
            .finish()
    }
}

impl PumpWaker {
    /// Create an unbound waker. Wakes do nothing until [`bind`](Self::bind).
    #[must_use]
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            pump: Rc::new(RefCell::new(None)),
            scheduled: Rc::new(Cell::new(false)),
        }
    }

    /// Install the function run on each scheduled pump, replacing any previous one.
    pub fn bind(&self, pump: impl Fn() + 'static) {
        *self.pump.borrow_mut() = Some(Rc::new(pump));
    }

    /// Request a pump on the next scheduler tick.
    pub fn wake(&self) {
        if self.pump.borrow().is_none() || self.scheduled.replace(true) {
            return;
        }
        let scheduled = Rc::clone(&self.scheduled);
        let pump = Rc::clone(&self.pump);
        self.scheduler.set_timeout(
            Duration::ZERO,
            Box::new(move || {
                // Cleared first so sends made while pumping schedule a follow-up.
                scheduled.set(false);
                let current = pump.borrow().clone();
                if let Some(current) = current {
                    tracing::trace!(target: "tabwire.dispatch", "pump");
                    current();
                }
            }),
        );
    }

    /// Whether a pump is waiting on the scheduler.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabwire_harness::ManualScheduler;
    use tabwire_runtime::MessageQueue;

    fn waker() -> (PumpWaker, ManualScheduler, Rc<Cell<u32>>) {
        let scheduler = ManualScheduler::new();
        let waker = PumpWaker::new(Rc::new(scheduler.clone()));
        let pumps = Rc::new(Cell::new(0));
        let p = Rc::clone(&pumps);
        waker.bind(move || p.set(p.get() + 1));
        (waker, scheduler, pumps)
    }

    #[test]
    fn wakes_coalesce_into_one_pump() {
        let (waker, scheduler, pumps) = waker();
        waker.wake();
        waker.wake();
        waker.wake();
        assert!(waker.is_scheduled());
        assert_eq!(scheduler.pending(), 1);

        scheduler.run_due();
        assert_eq!(pumps.get(), 1);
        assert!(!waker.is_scheduled());
    }

    #[test]
    fn pump_is_deferred() {
        let (waker, _scheduler, pumps) = waker();
        waker.wake();
        assert_eq!(pumps.get(), 0);
    }

    #[test]
    fn unbound_wake_is_noop() {
        let scheduler = ManualScheduler::new();
        let waker = PumpWaker::new(Rc::new(scheduler.clone()));
        waker.wake();
        assert_eq!(scheduler.pending(), 0);
        assert!(!waker.is_scheduled());
    }

    #[test]
    fn wake_during_pump_schedules_another() {
        let scheduler = ManualScheduler::new();
        let waker = PumpWaker::new(Rc::new(scheduler.clone()));
        let pumps = Rc::new(Cell::new(0));
        let (p, again) = (Rc::clone(&pumps), waker.clone());
        waker.bind(move || {
            p.set(p.get() + 1);
            if p.get() == 1 {
                again.wake();
            }
        });

        waker.wake();
        assert_eq!(scheduler.run_due(), 2);
        assert_eq!(pumps.get(), 2);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn queue_sends_trigger_one_drain() {
        let scheduler = ManualScheduler::new();
        let waker = PumpWaker::new(Rc::new(scheduler.clone()));
        let queue = Rc::new(MessageQueue::new().with_waker({
            let waker = waker.clone();
            move || waker.wake()
        }));
        let drained = Rc::new(RefCell::new(Vec::new()));
        let (q, d) = (Rc::downgrade(&queue), Rc::clone(&drained));
        waker.bind(move || {
            if let Some(q) = q.upgrade() {
                d.borrow_mut().push(q.drain());
            }
        });

        let dispatch = queue.dispatcher();
        dispatch.send(1);
        dispatch.send(2);
        dispatch.send(3);
        scheduler.run_due();
        assert_eq!(*drained.borrow(), vec![vec![1, 2, 3]]);
    }
}
