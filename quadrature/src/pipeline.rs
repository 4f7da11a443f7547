//! Event pipeline
//!
//! The [`Producer`] runs inside the counting unit's interrupt callback and
//! forwards reached watchpoints to the [`EventQueue`]. The [`Consumer`]
//! waits on that queue with a timeout and polls the raw counter whenever
//! nothing arrived in time, so a silent encoder still shows up in the logs.

use crate::log::{info, warn};
use crate::queue::EventQueue;
use crate::unit::WatchHandler;
use core::future::Future;
use embassy_sync::blocking_mutex::raw::RawMutex;

/// Time to wait for an event before polling the counter, in ms
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Forwards watchpoints to the event queue
pub struct Producer<'q, M: RawMutex, const N: usize> {
    queue: &'q EventQueue<M, N>,
}

impl<'q, M: RawMutex, const N: usize> Producer<'q, M, N> {
    pub fn new(queue: &'q EventQueue<M, N>) -> Self {
        Self { queue }
    }
}

impl<M: RawMutex, const N: usize> Clone for Producer<'_, M, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, const N: usize> Copy for Producer<'_, M, N> {}

impl<M: RawMutex, const N: usize> WatchHandler for Producer<'_, M, N> {
    fn on_reach(&self, value: i32) -> bool {
        // Dropped when full, the consumer's next poll will catch up
        self.queue.try_send(value).unwrap_or(false)
    }
}

/// What the consumer has to wait with
pub trait Hardware {
    /// Run `fut` for at most `timeout_ms`, `None` if it did not complete
    fn with_timeout<F: Future>(
        &mut self,
        timeout_ms: u64,
        fut: F,
    ) -> impl Future<Output = Option<F::Output>>;

    /// Read the raw counter
    fn count(&mut self) -> i32;
}

/// How the consumer waits for events
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPolicy {
    /// Block on the queue up to `ms`, then poll the counter
    Timeout { ms: u64 },
    /// Never wait: drain the queue or poll the counter on every step.
    /// Degraded mode, keeps the CPU busy.
    BusyPoll,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy::Timeout {
            ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Outcome of one consumer step
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    /// A watchpoint has been reached
    Watchpoint(i32),
    /// No event in time, current value of the counter
    PulseCount(i32),
}

impl Report {
    fn log(&self) {
        match self {
            Report::Watchpoint(v) => info!("watchpoint event: {}", v),
            Report::PulseCount(c) => info!("pulse count: {}", c),
        }
    }
}

impl core::fmt::Display for Report {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Report::Watchpoint(v) => write!(f, "watchpoint event: {}", v),
            Report::PulseCount(c) => write!(f, "pulse count: {}", c),
        }
    }
}

/// Application side of the pipeline
pub struct Consumer<'q, H: Hardware, M: RawMutex, const N: usize> {
    pub hw: H,
    queue: &'q EventQueue<M, N>,
    policy: WaitPolicy,
}

impl<'q, H: Hardware, M: RawMutex, const N: usize> Consumer<'q, H, M, N> {
    pub fn new(hw: H, queue: &'q EventQueue<M, N>, policy: WaitPolicy) -> Self {
        Self { hw, queue, policy }
    }

    /// One wait cycle: either handle an event or poll the counter
    pub async fn step(&mut self) -> Report {
        let event = match self.policy {
            WaitPolicy::Timeout { ms } => self.hw.with_timeout(ms, self.queue.receive()).await,
            WaitPolicy::BusyPoll => self.queue.try_receive(),
        };
        let dropped = self.queue.take_dropped();
        if dropped > 0 {
            warn!("event queue full, {} events dropped", dropped);
        }
        let report = match event {
            Some(v) => Report::Watchpoint(v),
            None => Report::PulseCount(self.hw.count()),
        };
        report.log();
        report
    }

    /// Run forever
    pub async fn run(&mut self) -> ! {
        loop {
            self.step().await;
        }
    }
}
