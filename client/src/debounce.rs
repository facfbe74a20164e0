use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;

/// Callback slot shared between a debouncer and whoever delivers its value.
pub type Target<T> = Rc<dyn Fn(T)>;

/// A value whose deadline passed, paired with the target that was current at fire time.
pub struct Due<T> {
    target: Target<T>,
    value: T,
}

impl<T> Due<T> {
    pub fn deliver(self) {
        (self.target)(self.value)
    }

    #[cfg(test)]
    pub fn value(&self) -> &T {
        &self.value
    }
}

/// Something that holds at most one pending value with a deadline.
pub trait Deferred {
    type Value;

    fn due_at(&self) -> Option<f64>;

    /// Remove and return the pending value if its deadline has passed.
    fn take_due(&mut self, now_ms: f64) -> Option<Due<Self::Value>>;
}

/// Trailing-edge debouncer driven by explicit millisecond timestamps.
///
/// Every `call` replaces the pending value and pushes the deadline to
/// `now + delay`. The target lives in a replaceable slot that is read when the
/// value is taken, so swapping it never disturbs a running countdown.
pub struct Debouncer<T> {
    delay_ms: f64,
    target: Target<T>,
    pending: Option<(T, f64)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u32, target: impl Fn(T) + 'static) -> Self {
        Self {
            delay_ms: delay_ms as f64,
            target: Rc::new(target),
            pending: None,
        }
    }

    pub fn set_target(&mut self, target: impl Fn(T) + 'static) {
        self.target = Rc::new(target);
    }

    /// Applies from the next `call`; a pending deadline keeps its original delay.
    pub fn set_delay(&mut self, delay_ms: u32) {
        self.delay_ms = delay_ms as f64;
    }

    /// Record `value` and return the new deadline.
    pub fn call(&mut self, value: T, now_ms: f64) -> f64 {
        let due_at = now_ms + self.delay_ms;
        self.pending = Some((value, due_at));
        due_at
    }

    /// Drop the pending value. Returns whether one was dropped.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Deliver the pending value if due. Returns whether delivery happened.
    pub fn fire_due(&mut self, now_ms: f64) -> bool {
        match self.take_due(now_ms) {
            Some(due) => {
                due.deliver();
                true
            }
            None => false,
        }
    }
}

impl<T> Deferred for Debouncer<T> {
    type Value = T;

    fn due_at(&self) -> Option<f64> {
        self.pending.as_ref().map(|(_, due_at)| *due_at)
    }

    fn take_due(&mut self, now_ms: f64) -> Option<Due<T>> {
        let due_at = self.due_at()?;
        if now_ms < due_at {
            return None;
        }
        let (value, _) = self.pending.take()?;
        Some(Due {
            target: Rc::clone(&self.target),
            value,
        })
    }
}

/// Browser timer that wakes a [`Deferred`] host at its deadline.
///
/// Holds the `Timeout` handle so a re-arm cancels the previous JS callback.
#[derive(Clone, Default)]
pub struct DeadlineTimer {
    timeout: Rc<RefCell<Option<Timeout>>>,
}

impl DeadlineTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any scheduled wake-up and schedule one for the host's current deadline.
    pub fn rearm<H>(&self, host: &Rc<RefCell<H>>)
    where
        H: Deferred + 'static,
    {
        self.cancel();
        let Some(due_at) = host.borrow().due_at() else {
            return;
        };
        let wait_ms = (due_at - js_sys::Date::now()).max(0.0).ceil() as u32;

        let host = Rc::clone(host);
        let timer = self.clone();
        let timeout = Timeout::new(wait_ms, move || {
            timer.timeout.borrow_mut().take();
            let due = host.borrow_mut().take_due(js_sys::Date::now());
            match due {
                // Borrow released before delivery so the target may call back in.
                Some(due) => due.deliver(),
                None => timer.rearm(&host),
            }
        });
        *self.timeout.borrow_mut() = Some(timeout);
    }

    pub fn cancel(&self) {
        if let Some(timeout) = self.timeout.borrow_mut().take() {
            timeout.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |value| sink.borrow_mut().push(value))
    }

    #[test]
    fn burst_delivers_last_value_once_after_quiet_window() {
        let (log, target) = recorder();
        let mut debouncer = Debouncer::new(400, target);

        debouncer.call("t0", 0.0);
        debouncer.call("t100", 100.0);
        debouncer.call("t150", 150.0);

        for now in [200.0, 500.0, 549.0] {
            assert!(!debouncer.fire_due(now));
        }
        assert!(debouncer.fire_due(550.0));
        assert!(!debouncer.fire_due(900.0));
        assert_eq!(*log.borrow(), vec!["t150"]);
    }

    #[test]
    fn call_before_deadline_restarts_window() {
        let (log, target) = recorder();
        let mut debouncer = Debouncer::new(400, target);

        debouncer.call("first", 0.0);
        assert_eq!(debouncer.call("second", 399.0), 799.0);
        assert!(!debouncer.fire_due(400.0));
        assert!(debouncer.fire_due(799.0));
        assert_eq!(*log.borrow(), vec!["second"]);
    }

    #[test]
    fn separate_windows_deliver_separately() {
        let (log, target) = recorder();
        let mut debouncer = Debouncer::new(400, target);

        debouncer.call("a", 0.0);
        debouncer.fire_due(400.0);
        debouncer.call("b", 1_000.0);
        debouncer.fire_due(1_400.0);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn swapping_target_keeps_countdown_and_uses_new_target() {
        let (old_log, old_target) = recorder();
        let (new_log, new_target) = recorder();
        let mut debouncer = Debouncer::new(400, old_target);

        debouncer.call("value", 0.0);
        debouncer.set_target(new_target);
        assert_eq!(debouncer.due_at(), Some(400.0));
        assert!(debouncer.fire_due(400.0));

        assert!(old_log.borrow().is_empty());
        assert_eq!(*new_log.borrow(), vec!["value"]);
    }

    #[test]
    fn set_delay_leaves_pending_deadline() {
        let (_log, target) = recorder();
        let mut debouncer = Debouncer::new(400, target);
        debouncer.call("v", 0.0);
        debouncer.set_delay(50);
        assert_eq!(debouncer.due_at(), Some(400.0));
        assert_eq!(debouncer.call("w", 10.0), 60.0);
    }

    #[test]
    fn cancel_drops_pending_value() {
        let (log, target) = recorder();
        let mut debouncer = Debouncer::new(400, target);
        debouncer.call("v", 0.0);
        assert!(debouncer.cancel());
        assert!(!debouncer.fire_due(1_000.0));
        assert!(log.borrow().is_empty());
        assert!(!debouncer.cancel());
    }

    #[test]
    fn take_due_hands_back_value_without_delivering() {
        let (log, target) = recorder();
        let mut debouncer = Debouncer::new(10, target);
        debouncer.call("v", 0.0);
        let due = debouncer.take_due(10.0).unwrap();
        assert_eq!(*due.value(), "v");
        assert!(log.borrow().is_empty());
        due.deliver();
        assert_eq!(*log.borrow(), vec!["v"]);
    }
}
