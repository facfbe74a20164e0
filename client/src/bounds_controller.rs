use venuemap_shared::{BoundingBox, LatLng};

use crate::debounce::{Debouncer, Deferred, Due};

/// Read access to the map's current extent. Either corner is `None` while the
/// map has not finished laying itself out.
pub trait ViewportSource {
    fn north_east(&self) -> Option<LatLng>;
    fn south_west(&self) -> Option<LatLng>;
}

/// Normalize the viewport corners into a bounding box.
pub fn read_bounds(source: &impl ViewportSource) -> Option<BoundingBox> {
    BoundingBox::from_corners(source.north_east()?, source.south_west()?)
}

/// Turns viewport-settled notifications into a debounced stream of bounds.
///
/// The controller is a pure state machine: the map binding feeds it events with
/// a timestamp and wakes it at [`Deferred::due_at`]. After [`teardown`] every
/// event is ignored and nothing is ever delivered again.
///
/// [`teardown`]: BoundsController::teardown
pub struct BoundsController {
    debouncer: Debouncer<BoundingBox>,
    torn_down: bool,
}

impl BoundsController {
    pub fn new(delay_ms: u32, on_bounds: impl Fn(BoundingBox) + 'static) -> Self {
        Self {
            debouncer: Debouncer::new(delay_ms, on_bounds),
            torn_down: false,
        }
    }

    /// Swap the downstream callback without touching a pending emission.
    pub fn set_on_bounds(&mut self, on_bounds: impl Fn(BoundingBox) + 'static) {
        self.debouncer.set_target(on_bounds);
    }

    pub fn set_delay(&mut self, delay_ms: u32) {
        self.debouncer.set_delay(delay_ms);
    }

    /// Handle a move-ended or zoom-ended event. An unreadable viewport drops the event.
    /// Returns the new deadline when an emission was scheduled.
    pub fn viewport_settled(&mut self, source: &impl ViewportSource, now_ms: f64) -> Option<f64> {
        if self.torn_down {
            return None;
        }
        let bounds = read_bounds(source)?;
        Some(self.debouncer.call(bounds, now_ms))
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.debouncer.cancel();
    }

    #[cfg(test)]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Deferred for BoundsController {
    type Value = BoundingBox;

    fn due_at(&self) -> Option<f64> {
        if self.torn_down {
            return None;
        }
        self.debouncer.due_at()
    }

    fn take_due(&mut self, now_ms: f64) -> Option<Due<BoundingBox>> {
        if self.torn_down {
            return None;
        }
        self.debouncer.take_due(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FakeViewport {
        ne: Option<LatLng>,
        sw: Option<LatLng>,
    }

    impl FakeViewport {
        fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
            Self {
                ne: Some(LatLng::new(north, east)),
                sw: Some(LatLng::new(south, west)),
            }
        }

        fn unready() -> Self {
            Self { ne: None, sw: None }
        }
    }

    impl ViewportSource for FakeViewport {
        fn north_east(&self) -> Option<LatLng> {
            self.ne
        }
        fn south_west(&self) -> Option<LatLng> {
            self.sw
        }
    }

    fn controller() -> (BoundsController, Rc<RefCell<Vec<BoundingBox>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let controller = BoundsController::new(400, move |b| sink.borrow_mut().push(b));
        (controller, seen)
    }

    fn fire(controller: &mut BoundsController, now_ms: f64) {
        if let Some(due) = controller.take_due(now_ms) {
            due.deliver();
        }
    }

    #[test]
    fn corners_normalize_to_min_max() {
        let flipped = FakeViewport {
            ne: Some(LatLng::new(20.9, 105.6)),
            sw: Some(LatLng::new(21.15, 106.0)),
        };
        assert_eq!(
            read_bounds(&flipped),
            Some(BoundingBox::new(21.15, 20.9, 106.0, 105.6))
        );
    }

    #[test]
    fn only_settled_bounds_are_emitted() {
        let (mut controller, seen) = controller();
        controller.viewport_settled(&FakeViewport::new(1.0, 0.0, 1.0, 0.0), 0.0);
        controller.viewport_settled(&FakeViewport::new(2.0, 1.0, 2.0, 1.0), 100.0);
        controller.viewport_settled(&FakeViewport::new(21.15, 20.9, 106.0, 105.6), 150.0);

        fire(&mut controller, 549.0);
        assert!(seen.borrow().is_empty());
        fire(&mut controller, 550.0);
        assert_eq!(
            *seen.borrow(),
            vec![BoundingBox::new(21.15, 20.9, 106.0, 105.6)]
        );
    }

    #[test]
    fn unreadable_viewport_is_dropped() {
        let (mut controller, seen) = controller();
        assert_eq!(controller.viewport_settled(&FakeViewport::unready(), 0.0), None);
        assert_eq!(controller.due_at(), None);
        fire(&mut controller, 1_000.0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn unreadable_event_does_not_disturb_pending_emission() {
        let (mut controller, seen) = controller();
        controller.viewport_settled(&FakeViewport::new(1.0, 0.0, 1.0, 0.0), 0.0);
        controller.viewport_settled(&FakeViewport::unready(), 300.0);
        fire(&mut controller, 400.0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn teardown_cancels_pending_and_ignores_later_events() {
        let (mut controller, seen) = controller();
        controller.viewport_settled(&FakeViewport::new(1.0, 0.0, 1.0, 0.0), 0.0);
        controller.teardown();
        fire(&mut controller, 1_000.0);
        assert_eq!(
            controller.viewport_settled(&FakeViewport::new(1.0, 0.0, 1.0, 0.0), 1_100.0),
            None
        );
        fire(&mut controller, 2_000.0);
        assert!(seen.borrow().is_empty());
        assert!(controller.is_torn_down());
    }

    #[test]
    fn replaced_callback_receives_pending_bounds() {
        let (mut controller, first) = controller();
        let second = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&second);

        controller.viewport_settled(&FakeViewport::new(1.0, 0.0, 1.0, 0.0), 0.0);
        controller.set_on_bounds(move |b| sink.borrow_mut().push(b));
        assert_eq!(controller.due_at(), Some(400.0));
        fire(&mut controller, 400.0);

        assert!(first.borrow().is_empty());
        assert_eq!(second.borrow().len(), 1);
    }

    #[test]
    fn reconfigured_delay_applies_to_next_event_only() {
        let (mut controller, seen) = controller();
        controller.viewport_settled(&FakeViewport::new(1.0, 0.0, 1.0, 0.0), 0.0);
        controller.set_delay(100);
        assert_eq!(controller.due_at(), Some(400.0));

        let due = controller.viewport_settled(&FakeViewport::new(2.0, 1.0, 2.0, 1.0), 50.0);
        assert_eq!(due, Some(150.0));
        fire(&mut controller, 150.0);
        assert_eq!(*seen.borrow(), vec![BoundingBox::new(2.0, 1.0, 2.0, 1.0)]);
    }
}
