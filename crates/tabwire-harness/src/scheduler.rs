#![forbid(unsafe_code)]

//! Virtual-time scheduler.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use tabwire_backend::{BrowserClock, Scheduler, TimerId};

/// Browsers clamp interval periods; a zero period would spin forever here.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

enum Callback {
    Once(Box<dyn FnOnce()>),
    Every(Box<dyn FnMut()>),
}

struct Slot {
    period: Duration,
    callback: Option<Callback>,
}

#[derive(Default)]
struct State {
    now: Duration,
    next_id: TimerId,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), TimerId>,
    timers: HashMap<TimerId, Slot>,
}

impl State {
    fn enqueue(&mut self, deadline: Duration, id: TimerId) {
        self.next_seq += 1;
        self.queue.insert((deadline, self.next_seq), id);
    }

    fn insert(&mut self, delay: Duration, period: Duration, callback: Callback) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        self.timers.insert(
            id,
            Slot {
                period,
                callback: Some(callback),
            },
        );
        let deadline = self.now.saturating_add(delay);
        self.enqueue(deadline, id);
        id
    }
}

/// A [`Scheduler`] and [`BrowserClock`] over a virtual clock.
///
/// Timers fire in deadline order (ties in scheduling order) only while
/// [`advance`](Self::advance) runs. Callbacks may schedule or clear timers.
/// Clones share the same clock and queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<State>>,
}

impl ManualScheduler {
    /// Create a scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of timers still scheduled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Run every timer that is due right now.
    pub fn run_due(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    /// Move the clock forward by `dt`, firing every timer that comes due on
    /// the way. Returns how many callbacks ran.
    pub fn advance(&self, dt: Duration) -> usize {
        let target = self.now().saturating_add(dt);
        let mut fired = 0;

        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                let Some((&(deadline, seq), &id)) = state.queue.iter().next() else {
                    break;
                };
                if deadline > target {
                    break;
                }
                state.queue.remove(&(deadline, seq));
                state.now = deadline;
                let taken = state
                    .timers
                    .get_mut(&id)
                    .and_then(|slot| slot.callback.take());
                match taken {
                    Some(Callback::Once(f)) => {
                        state.timers.remove(&id);
                        Some((id, deadline, Callback::Once(f)))
                    }
                    Some(every) => Some((id, deadline, every)),
                    None => None,
                }
            };

            let Some((id, deadline, callback)) = due else {
                continue;
            };
            fired += 1;

            match callback {
                Callback::Once(f) => f(),
                Callback::Every(mut f) => {
                    f();
                    let mut state = self.state.borrow_mut();
                    // None when cleared from inside its own callback.
                    let period = state.timers.get_mut(&id).map(|slot| {
                        slot.callback = Some(Callback::Every(f));
                        slot.period
                    });
                    if let Some(period) = period {
                        state.enqueue(deadline.saturating_add(period), id);
                    }
                }
            }
        }

        self.state.borrow_mut().now = target;
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = self
            .state
            .borrow_mut()
            .insert(delay, Duration::ZERO, Callback::Once(callback));
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::trace!(timer = id, delay_ms, "timeout scheduled");
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.state.borrow_mut().timers.remove(&id);
    }

    fn set_interval(&self, every: Duration, callback: Box<dyn FnMut()>) -> TimerId {
        let period = every.max(MIN_INTERVAL);
        self.state
            .borrow_mut()
            .insert(period, period, Callback::Every(callback))
    }

    fn clear_interval(&self, id: TimerId) {
        self.state.borrow_mut().timers.remove(&id);
    }
}

impl BrowserClock for ManualScheduler {
    fn now_mono(&self) -> Duration {
        self.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() -> Box<dyn FnMut()>) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move || {
            let h = Rc::clone(&h);
            Box::new(move || h.set(h.get() + 1)) as Box<dyn FnMut()>
        })
    }

    #[test]
    fn timeout_fires_once_at_deadline() {
        let sched = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        sched.set_timeout(Duration::from_millis(100), Box::new(move || h.set(h.get() + 1)));

        assert_eq!(sched.advance(Duration::from_millis(99)), 0);
        assert_eq!(sched.advance(Duration::from_millis(1)), 1);
        assert_eq!(sched.advance(Duration::from_secs(10)), 0);
        assert_eq!(hits.get(), 1);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn cleared_timeout_never_fires() {
        let sched = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let id = sched.set_timeout(Duration::from_millis(5), Box::new(move || h.set(1)));
        sched.clear_timeout(id);
        sched.clear_timeout(id);
        sched.advance(Duration::from_millis(10));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn interval_repeats_until_cleared() {
        let sched = ManualScheduler::new();
        let (hits, make) = counter();
        let id = sched.set_interval(Duration::from_millis(10), make());

        sched.advance(Duration::from_millis(35));
        assert_eq!(hits.get(), 3);

        sched.clear_interval(id);
        sched.advance(Duration::from_millis(100));
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn interval_can_clear_itself() {
        let sched = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let id_cell: Rc<Cell<TimerId>> = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        let s = sched.clone();
        let ids = Rc::clone(&id_cell);
        let id = sched.set_interval(
            Duration::from_millis(1),
            Box::new(move || {
                h.set(h.get() + 1);
                s.clear_interval(ids.get());
            }),
        );
        id_cell.set(id);

        sched.advance(Duration::from_millis(50));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn callbacks_may_schedule_more_work() {
        let sched = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let s = sched.clone();
        let o = Rc::clone(&order);
        sched.set_timeout(
            Duration::from_millis(10),
            Box::new(move || {
                o.borrow_mut().push("outer");
                let o2 = Rc::clone(&o);
                s.set_timeout(Duration::from_millis(10), Box::new(move || o2.borrow_mut().push("inner")));
            }),
        );

        sched.advance(Duration::from_millis(15));
        assert_eq!(*order.borrow(), vec!["outer"]);
        sched.advance(Duration::from_millis(5));
        assert_eq!(*order.borrow(), vec!["outer", "inner"]);
    }

    #[test]
    fn clock_tracks_advance() {
        let sched = ManualScheduler::new();
        sched.advance(Duration::from_millis(1500));
        assert_eq!(sched.now_mono(), Duration::from_millis(1500));
    }

    #[test]
    fn ties_fire_in_scheduling_order() {
        let sched = ManualScheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let o = Rc::clone(&order);
            sched.set_timeout(Duration::ZERO, Box::new(move || o.borrow_mut().push(n)));
        }
        sched.run_due();
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }
}
