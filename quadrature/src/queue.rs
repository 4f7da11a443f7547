//! Bounded event queue between interrupt context and a task
//!
//! Single producer, single consumer. Sending never blocks and never
//! allocates: when the queue is full the new event is dropped. Receiving
//! is async and parks the consumer's waker until the next send.

use arraydeque::{behavior::Saturating, ArrayDeque};
use core::cell::RefCell;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::WakerRegistration;

/// Capacity of the event queue in the reference configuration
pub const QUEUE_CAPACITY: usize = 10;

/// The event could not be queued, it has been dropped
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

struct State<const N: usize> {
    events: ArrayDeque<i32, N, Saturating>,
    receiver: WakerRegistration,
    /// A [`Receive`] future is parked on the queue
    waiting: bool,
    dropped: u32,
}

/// Queue of watchpoint events
pub struct EventQueue<M: RawMutex, const N: usize> {
    state: Mutex<M, RefCell<State<N>>>,
}

impl<M: RawMutex, const N: usize> EventQueue<M, N> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                events: ArrayDeque::new(),
                receiver: WakerRegistration::new(),
                waiting: false,
                dropped: 0,
            })),
        }
    }

    /// Queue an event without blocking
    ///
    /// Returns `Ok(true)` when a consumer was waiting on the queue and has
    /// been woken up, meaning it should be scheduled as soon as possible.
    pub fn try_send(&self, value: i32) -> Result<bool, QueueFull> {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if s.events.push_back(value).is_err() {
                s.dropped = s.dropped.wrapping_add(1);
                return Err(QueueFull);
            }
            let waiting = core::mem::take(&mut s.waiting);
            s.receiver.wake();
            Ok(waiting)
        })
    }

    /// Take the oldest event, if any
    pub fn try_receive(&self) -> Option<i32> {
        self.state.lock(|s| s.borrow_mut().events.pop_front())
    }

    /// Wait for the next event
    ///
    /// Dropping the future before it completes, on a timeout for example,
    /// unregisters the consumer.
    pub fn receive(&self) -> Receive<'_, M, N> {
        Receive { queue: self }
    }

    fn poll_receive(&self, cx: &mut Context<'_>) -> Poll<i32> {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            match s.events.pop_front() {
                Some(value) => {
                    s.waiting = false;
                    Poll::Ready(value)
                }
                None => {
                    s.receiver.register(cx.waker());
                    s.waiting = true;
                    Poll::Pending
                }
            }
        })
    }

    fn cancel_receive(&self) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.waiting = false;
            s.receiver = WakerRegistration::new();
        })
    }

    /// Number of events dropped since the last call
    pub fn take_dropped(&self) -> u32 {
        self.state
            .lock(|s| core::mem::take(&mut s.borrow_mut().dropped))
    }

    pub fn len(&self) -> usize {
        self.state.lock(|s| s.borrow().events.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    pub fn capacity(&self) -> usize {
        N
    }
}

impl<M: RawMutex, const N: usize> Default for EventQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Future returned by [`EventQueue::receive`]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Receive<'q, M: RawMutex, const N: usize> {
    queue: &'q EventQueue<M, N>,
}

impl<M: RawMutex, const N: usize> Future for Receive<'_, M, N> {
    type Output = i32;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<i32> {
        self.queue.poll_receive(cx)
    }
}

impl<M: RawMutex, const N: usize> Drop for Receive<'_, M, N> {
    fn drop(&mut self) {
        self.queue.cancel_receive();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use std::sync::Arc;
    use tokio::time::{sleep, timeout, Duration};

    type Queue = EventQueue<CriticalSectionRawMutex, QUEUE_CAPACITY>;

    #[test]
    fn test_fifo() {
        let queue = Queue::new();
        assert!(queue.is_empty());
        for v in [-50, 0, 50] {
            assert_eq!(queue.try_send(v), Ok(false));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_receive(), Some(-50));
        assert_eq!(queue.try_receive(), Some(0));
        assert_eq!(queue.try_receive(), Some(50));
        assert_eq!(queue.try_receive(), None);
    }

    #[test]
    fn test_full_drops_newest() {
        let queue = Queue::new();
        for i in 0..QUEUE_CAPACITY as i32 {
            assert!(queue.try_send(i).is_ok());
        }
        assert!(queue.is_full());
        assert_eq!(queue.try_send(100), Err(QueueFull));
        assert_eq!(queue.try_send(-100), Err(QueueFull));
        assert_eq!(queue.len(), queue.capacity());
        assert_eq!(queue.take_dropped(), 2);
        assert_eq!(queue.take_dropped(), 0);
        for i in 0..QUEUE_CAPACITY as i32 {
            assert_eq!(queue.try_receive(), Some(i));
        }
        assert_eq!(queue.try_receive(), None);
    }

    #[tokio::test]
    async fn test_wakes_waiting_receiver() {
        let queue = Arc::new(Queue::new());
        let rx = queue.clone();
        let consumer = tokio::spawn(async move { rx.receive().await });
        // Let the consumer park itself on the queue
        while !queue.state.lock(|s| s.borrow().waiting) {
            sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(queue.try_send(50), Ok(true));
        assert_eq!(timeout(Duration::from_secs(1), consumer).await.unwrap().unwrap(), 50);
        // Nobody is waiting anymore
        assert_eq!(queue.try_send(100), Ok(false));
    }

    #[tokio::test]
    async fn test_timed_out_receiver_is_not_waiting() {
        let queue = Queue::new();
        assert!(timeout(Duration::from_millis(10), queue.receive()).await.is_err());
        assert!(!queue.state.lock(|s| s.borrow().waiting));
        assert_eq!(queue.try_send(50), Ok(false));
        assert_eq!(queue.receive().await, 50);
    }

    #[tokio::test]
    async fn test_receive_ready() {
        let queue = Queue::new();
        queue.try_send(-100).unwrap();
        assert_eq!(queue.receive().await, -100);
    }
}
