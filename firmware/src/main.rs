#![no_std]
#![no_main]

use crate::encoder::{Board, Queue, SharedUnit};
use core::cell::RefCell;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::Mutex;
use quadrature::pipeline::{Consumer, Producer};
use quadrature::queue::EventQueue;
use quadrature::setup::{install, EncoderConfig};
use quadrature::unit::PulseUnit;
use quadrature::watchpoints::WatchpointSet;
use quadrature::Error;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

/// Board configuration
mod config;
/// Encoder edge capture
mod encoder;

/// Runs the edge capture above the main task's priority
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

static QUEUE: StaticCell<Queue> = StaticCell::new();
static UNIT: StaticCell<SharedUnit> = StaticCell::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// A misconfigured counter is of no use, stop here
fn fatal(e: Error) -> ! {
    defmt::panic!("pcnt configuration failed: {:?}", e);
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    defmt::info!("Hello World!");

    let queue: &'static Queue = QUEUE.init(EventQueue::new());

    defmt::info!("install pcnt unit");
    let mut unit = PulseUnit::new(config::LIMITS).unwrap_or_else(|e| fatal(e));
    let watchpoints = WatchpointSet::new(
        &config::WATCHPOINTS,
        config::PCNT_LOW_LIMIT,
        config::PCNT_HIGH_LIMIT,
    )
    .unwrap_or_else(|e| fatal(e));
    let encoder_config = EncoderConfig {
        glitch_filter: config::GLITCH_FILTER,
        channels: config::CHANNELS,
        watchpoints: &watchpoints,
    };
    install(&mut unit, &encoder_config, Producer::new(queue)).unwrap_or_else(|e| fatal(e));
    let unit: &'static SharedUnit = UNIT.init(Mutex::new(RefCell::new(unit)));

    // EC11 signals A and B, see config::EC11_GPIO_A and config::EC11_GPIO_B
    let pin_a = Input::new(p.PIN_7, Pull::Up);
    let pin_b = Input::new(p.PIN_2, Pull::Up);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner.must_spawn(encoder::edge_capture(unit, pin_a, pin_b));

    defmt::info!("let's go!");
    let mut consumer = Consumer::new(Board::new(unit), queue, config::WAIT_POLICY);
    consumer.run().await
}
