use std::cmp::Ordering;

pub type TimerId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<T> {
    pub time: u64,
    pub id: TimerId,
    pub payload: T,
}

pub trait Timers<T> {
    fn schedule_after(&mut self, now: u64, delay: u64, payload: T) -> TimerId;
    fn cancel(&mut self, id: TimerId) -> bool;
}

#[derive(Debug)]
pub struct Scheduler<T> {
    next_id: TimerId,
    events: Vec<Event<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            events: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, time: u64, payload: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.events.push(Event { time, id, payload });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        self.events.len() != before
    }

    pub fn next_due(&self) -> Option<u64> {
        self.events.iter().map(|event| event.time).min()
    }

    pub fn pop_due(&mut self, time: u64) -> Option<Event<T>> {
        let index = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.time <= time)
            .min_by(|(_, a), (_, b)| match a.time.cmp(&b.time) {
                Ordering::Equal => a.id.cmp(&b.id),
                other => other,
            })
            .map(|(index, _)| index)?;
        Some(self.events.remove(index))
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

impl<T> Timers<T> for Scheduler<T> {
    fn schedule_after(&mut self, now: u64, delay: u64, payload: T) -> TimerId {
        self.schedule(now.saturating_add(delay), payload)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        Scheduler::cancel(self, id)
    }
}
