use crate::config::{EC11_GPIO_A, EC11_GPIO_B, NB_EVENTS};
use core::cell::RefCell;
use core::future::Future;
#[cfg(feature = "dual_channel")]
use embassy_futures::select::select;
use embassy_rp::gpio::Input;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{with_deadline, with_timeout, Duration, Instant};
use quadrature::decode::{Edge, Level, PinLevels};
use quadrature::pipeline::{Hardware, Producer};
use quadrature::queue::EventQueue;
use quadrature::unit::{CountingPeripheral, PulseUnit};

/// Watchpoint events, from the edge capture to the main task
pub type Queue = EventQueue<CriticalSectionRawMutex, NB_EVENTS>;
/// Counting unit notifying the queue
pub type Unit = PulseUnit<Producer<'static, CriticalSectionRawMutex, NB_EVENTS>>;
/// Counting unit shared between the edge capture and the main task
pub type SharedUnit = Mutex<CriticalSectionRawMutex, RefCell<Unit>>;

/// Feed the pin edges to the counting unit
///
/// Spawned on the interrupt executor, this is the counting unit's interrupt
/// context: the watchpoint producer runs from here.
#[embassy_executor::task]
pub async fn edge_capture(
    unit: &'static SharedUnit,
    mut pin_a: Input<'static>,
    mut pin_b: Input<'static>,
) {
    let mut last_a = Level::from(pin_a.is_high());
    let mut last_b = Level::from(pin_b.is_high());

    loop {
        // Edges held by the glitch filter are applied once it has passed
        let deadline = unit.lock(|u| u.borrow().settle_deadline());
        let edge_seen = match deadline {
            Some(ns) => {
                let at = Instant::from_micros(ns.div_ceil(1000));
                with_deadline(at, wait_for_edge(&mut pin_a, &mut pin_b))
                    .await
                    .is_ok()
            }
            None => {
                wait_for_edge(&mut pin_a, &mut pin_b).await;
                true
            }
        };

        let timestamp_ns = Instant::now().as_micros() * 1000;
        if !edge_seen {
            unit.lock(|u| u.borrow_mut().settle(timestamp_ns));
            continue;
        }
        let a = Level::from(pin_a.is_high());
        let b = Level::from(pin_b.is_high());
        let levels = PinLevels::new()
            .with(EC11_GPIO_A, a)
            .with(EC11_GPIO_B, b);
        // The reschedule hint is not needed here: waking the queue already
        // pends the thread executor.
        unit.lock(|u| {
            let mut u = u.borrow_mut();
            if let Some(edge) = Edge::from_levels(last_a, a) {
                u.on_edge(EC11_GPIO_A, edge, levels, timestamp_ns);
            }
            if let Some(edge) = Edge::from_levels(last_b, b) {
                u.on_edge(EC11_GPIO_B, edge, levels, timestamp_ns);
            }
        });
        last_a = a;
        last_b = b;
    }
}

/// Next edge on a counted pin
#[cfg(feature = "dual_channel")]
async fn wait_for_edge(pin_a: &mut Input<'static>, pin_b: &mut Input<'static>) {
    select(pin_a.wait_for_any_edge(), pin_b.wait_for_any_edge()).await;
}

/// Next edge on a counted pin
#[cfg(not(feature = "dual_channel"))]
async fn wait_for_edge(pin_a: &mut Input<'static>, _pin_b: &mut Input<'static>) {
    pin_a.wait_for_any_edge().await;
}

/// Consumer side of the board
pub struct Board {
    unit: &'static SharedUnit,
}

impl Board {
    pub fn new(unit: &'static SharedUnit) -> Self {
        Self { unit }
    }
}

impl Hardware for Board {
    async fn with_timeout<F: Future>(&mut self, timeout_ms: u64, fut: F) -> Option<F::Output> {
        with_timeout(Duration::from_millis(timeout_ms), fut).await.ok()
    }

    fn count(&mut self) -> i32 {
        self.unit.lock(|u| u.borrow().count())
    }
}
