// Copyright 2019 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

#[cfg(test)]
pub use test_utils::*;

#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct EventId(pub u64);

/// A scheduler to schedule and cancel timeouts. When a deadline passes, the embedder hands
/// the returned `EventId` back to the state machine.
pub trait Scheduler: Send {
    /// Requests to schedule an event. Returns a unique ID used to cancel the scheduled event.
    fn schedule(&mut self, deadline: Instant) -> EventId;
    /// Cancels a previously scheduled event.
    fn cancel(&mut self, id: EventId);
}

/// A timer to schedule and cancel timeouts and retrieve triggered events.
pub struct Timer<E> {
    events: HashMap<EventId, E>,
    scheduler: Box<dyn Scheduler>,
}

impl<E> Timer<E> {
    pub fn new(scheduler: Box<dyn Scheduler>) -> Self {
        Self { events: HashMap::default(), scheduler }
    }

    /// Returns the event once. Cancelled or already consumed ids yield `None`.
    pub fn triggered(&mut self, event_id: &EventId) -> Option<E> {
        self.events.remove(event_id)
    }

    pub fn schedule_event(&mut self, deadline: Instant, event: E) -> EventId {
        let event_id = self.scheduler.schedule(deadline);
        self.events.insert(event_id, event);
        event_id
    }

    pub fn schedule_after(&mut self, timeout: Duration, event: E) -> EventId {
        self.schedule_event(Instant::now() + timeout, event)
    }

    pub fn cancel_event(&mut self, event_id: EventId) {
        self.events.remove(&event_id);
        self.scheduler.cancel(event_id);
    }

    pub fn cancel_all(&mut self) {
        for event_id in self.events.keys() {
            self.scheduler.cancel(*event_id);
        }
        self.events.clear();
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod test_utils {
    use {super::*, parking_lot::Mutex, std::sync::Arc};

    #[derive(Default, Debug)]
    pub struct FakeSchedulerState {
        next_id: u64,
        pub scheduled: Vec<(EventId, Instant)>,
        pub cancelled: Vec<EventId>,
    }

    /// Records every request. Clones share the same state so a test can keep a handle after
    /// moving the scheduler into a `Timer`.
    #[derive(Clone, Default)]
    pub struct FakeScheduler {
        pub state: Arc<Mutex<FakeSchedulerState>>,
    }

    impl FakeScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn as_scheduler(&self) -> Box<dyn Scheduler> {
            Box::new(self.clone())
        }

        pub fn last_scheduled(&self) -> Option<EventId> {
            self.state.lock().scheduled.last().map(|(id, _)| *id)
        }

        pub fn is_cancelled(&self, id: EventId) -> bool {
            self.state.lock().cancelled.contains(&id)
        }
    }

    impl Scheduler for FakeScheduler {
        fn schedule(&mut self, deadline: Instant) -> EventId {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = EventId(state.next_id);
            state.scheduled.push((id, deadline));
            id
        }

        fn cancel(&mut self, id: EventId) {
            self.state.lock().cancelled.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_cancel_event() {
        #[derive(PartialEq, Eq, Debug, Hash)]
        struct FooEvent(u8);

        let fake_scheduler = FakeScheduler::new();
        let mut timer = Timer::<FooEvent>::new(fake_scheduler.as_scheduler());

        // Verify event triggers no more than once.
        let event_id = timer.schedule_after(Duration::from_millis(5), FooEvent(8));
        assert_eq!(timer.triggered(&event_id), Some(FooEvent(8)));
        assert_eq!(timer.triggered(&event_id), None);

        // Verify event does not trigger if it was canceled.
        let event_id = timer.schedule_after(Duration::from_millis(5), FooEvent(9));
        timer.cancel_event(event_id);
        assert_eq!(timer.triggered(&event_id), None);
        assert!(fake_scheduler.is_cancelled(event_id));

        // Verify multiple events can be scheduled and canceled.
        let event_id_1 = timer.schedule_after(Duration::from_millis(5), FooEvent(8));
        let event_id_2 = timer.schedule_after(Duration::from_millis(5), FooEvent(9));
        let event_id_3 = timer.schedule_after(Duration::from_millis(5), FooEvent(10));
        timer.cancel_event(event_id_2);
        assert_eq!(timer.triggered(&event_id_2), None);
        assert_eq!(timer.triggered(&event_id_3), Some(FooEvent(10)));
        assert_eq!(timer.triggered(&event_id_1), Some(FooEvent(8)));
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn deadline_follows_timeout() {
        let fake_scheduler = FakeScheduler::new();
        let mut timer = Timer::new(fake_scheduler.as_scheduler());
        let before = Instant::now();
        timer.schedule_after(Duration::from_millis(1200), ());
        let state = fake_scheduler.state.lock();
        let (_, deadline) = state.scheduled[0];
        assert!(deadline >= before + Duration::from_millis(1200));
    }

    #[test]
    fn cancel_all() {
        let fake_scheduler = FakeScheduler::new();
        let mut timer = Timer::<_>::new(fake_scheduler.as_scheduler());

        let event_id_1 = timer.schedule_after(Duration::from_millis(5), 8);
        let event_id_2 = timer.schedule_after(Duration::from_millis(5), 9);
        let event_id_3 = timer.schedule_after(Duration::from_millis(5), 10);
        timer.cancel_all();
        assert_eq!(timer.triggered(&event_id_1), None);
        assert_eq!(timer.triggered(&event_id_2), None);
        assert_eq!(timer.triggered(&event_id_3), None);
        assert_eq!(fake_scheduler.state.lock().cancelled.len(), 3);
    }
}
