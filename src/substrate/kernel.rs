//! Event scheduling.
//!
//! Tasks are scheduled for a simulated instant and receive the world they run
//! against. [`EventLoop`] runs them in time order; tasks sharing an instant
//! run in the order they were scheduled.

use core::cmp::Reverse;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::utils::time::SimTime;

/// A unit of work run once at its scheduled instant
pub type Task<W> = Box<dyn FnOnce(&mut W, SimTime)>;

/// The time-advance kernel as seen by the generator
pub trait Kernel<W> {
    fn now(&self) -> SimTime;

    fn schedule(&mut self, at: SimTime, task: Task<W>);
}

struct Scheduled<W> {
    at: SimTime,
    seq: u64,
    task: Task<W>,
}

impl<W> Scheduled<W> {
    fn key(&self) -> (SimTime, u64) {
        (self.at, self.seq)
    }
}

impl<W> PartialEq for Scheduled<W> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<W> Eq for Scheduled<W> {}

impl<W> PartialOrd for Scheduled<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<W> Ord for Scheduled<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Single-threaded discrete event loop
pub struct EventLoop<W> {
    queue: BinaryHeap<Reverse<Scheduled<W>>>,
    now: SimTime,
    next_seq: u64,
}

impl<W> EventLoop<W> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            now: Duration::ZERO,
            next_seq: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Instant of the earliest pending task
    pub fn next_due(&self) -> Option<SimTime> {
        self.queue.peek().map(|entry| entry.0.at)
    }

    /// Run every task due at or before `stop`, then set the clock to `stop`.
    /// Returns the number of tasks run.
    pub fn run(&mut self, world: &mut W, stop: SimTime) -> usize {
        let mut ran = 0;
        while let Some(due) = self.next_due() {
            if due > stop {
                break;
            }
            let Some(Reverse(entry)) = self.queue.pop() else {
                break;
            };
            self.now = entry.at;
            (entry.task)(world, entry.at);
            ran += 1;
        }
        self.now = self.now.max(stop);
        log::debug!("Event loop stopped at {:?} after {} tasks, {} pending", stop, ran, self.queue.len());
        ran
    }
}

impl<W> Kernel<W> for EventLoop<W> {
    fn now(&self) -> SimTime {
        self.now
    }

    fn schedule(&mut self, at: SimTime, task: Task<W>) {
        let at = at.max(self.now);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { at, seq, task }));
    }
}

impl<W> Default for EventLoop<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty() {
        let mut events = EventLoop::<Vec<u32>>::new();
        assert!(events.is_empty());
        assert_eq!(events.len(), 0);
        assert!(events.next_due().is_none());

        let mut world = Vec::new();
        assert_eq!(events.run(&mut world, Duration::from_secs(1)), 0);
        assert_eq!(events.now(), Duration::from_secs(1));
    }

    #[test]
    fn time_order() {
        let mut events = EventLoop::<Vec<u32>>::new();
        events.schedule(Duration::from_millis(30), Box::new(|w: &mut Vec<u32>, _: SimTime| w.push(3)));
        events.schedule(Duration::from_millis(10), Box::new(|w: &mut Vec<u32>, _: SimTime| w.push(1)));
        events.schedule(Duration::from_millis(20), Box::new(|w: &mut Vec<u32>, _: SimTime| w.push(2)));
        assert_eq!(events.next_due(), Some(Duration::from_millis(10)));

        let mut world = Vec::new();
        assert_eq!(events.run(&mut world, Duration::from_secs(1)), 3);
        assert_eq!(world, vec![1, 2, 3]);
    }

    #[test]
    fn same_instant_runs_in_registration_order() {
        let mut events = EventLoop::<Vec<u32>>::new();
        let at = Duration::from_millis(100);
        for value in 0..50 {
            events.schedule(at, Box::new(move |w: &mut Vec<u32>, _: SimTime| w.push(value)));
        }

        let mut world = Vec::new();
        events.run(&mut world, at);
        assert_eq!(world, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn stop_is_inclusive_and_later_tasks_stay_pending() {
        let mut events = EventLoop::<Vec<SimTime>>::new();
        events.schedule(Duration::from_secs(1), Box::new(|w: &mut Vec<SimTime>, now: SimTime| w.push(now)));
        events.schedule(Duration::from_secs(2), Box::new(|w: &mut Vec<SimTime>, now: SimTime| w.push(now)));

        let mut world = Vec::new();
        assert_eq!(events.run(&mut world, Duration::from_secs(1)), 1);
        assert_eq!(world, vec![Duration::from_secs(1)]);
        assert_eq!(events.len(), 1);

        // Scheduling in the past runs at the current instant
        events.schedule(Duration::ZERO, Box::new(|w: &mut Vec<SimTime>, now: SimTime| w.push(now)));
        events.run(&mut world, Duration::from_secs(5));
        assert_eq!(
            world,
            vec![Duration::from_secs(1), Duration::from_secs(1), Duration::from_secs(2)]
        );
    }
}
