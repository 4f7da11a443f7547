//! Pulse counting unit
//!
//! [`CountingPeripheral`] is the contract of a pulse counter: saturating
//! limits, a glitch filter, up to [`MAX_CHANNELS`] edge/level channels and
//! a set of watchpoints reported through a callback. [`PulseUnit`] is a
//! software implementation of that contract, fed with the edges captured
//! on the encoder pins.

use crate::decode::{ChannelActions, DecodeTable, Delta, Edge, Level, PinLevels};
use crate::error::Error;
use crate::watchpoints::MAX_WATCHPOINTS;
use heapless::Vec;

/// Number of channels on a unit
pub const MAX_CHANNELS: usize = 2;

/// Longest glitch the filter can hold, in ns (1023 cycles at 80MHz)
pub const MAX_GLITCH_NS: u32 = 12_787;

/// Receives watchpoint notifications from the unit
///
/// Called from the context the edges are applied in, which is an interrupt
/// context on the firmware: implementations must not block, allocate or log.
pub trait WatchHandler {
    /// Watchpoint `value` has been reached.
    /// Returns whether a task must be scheduled right away.
    fn on_reach(&self, value: i32) -> bool;
}

/// Counter limits
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnitConfig {
    pub low_limit: i32,
    pub high_limit: i32,
}

/// Glitch filter configuration
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GlitchFilterConfig {
    /// Pulses shorter than this, in ns, are ignored. 0 disables the filter.
    pub max_glitch_ns: u32,
}

/// A channel: which signal is counted, which one is sampled, and how
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// GPIO whose edges are counted
    pub edge_gpio: u8,
    /// GPIO whose level is checked on each edge
    pub level_gpio: u8,
    pub actions: ChannelActions,
}

/// Lifecycle of a unit
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnitState {
    /// Being configured
    Init,
    /// Configuration frozen, not counting
    Enabled,
    /// Counting
    Running,
}

/// Contract of a pulse counting peripheral
pub trait CountingPeripheral {
    /// Callback type notified on watchpoints
    type Handler: WatchHandler;

    /// Set the glitch filter
    fn set_glitch_filter(&mut self, config: GlitchFilterConfig) -> Result<(), Error>;
    /// Install a channel
    fn add_channel(&mut self, config: ChannelConfig) -> Result<(), Error>;
    /// Register a watchpoint
    fn add_watch_point(&mut self, value: i32) -> Result<(), Error>;
    /// Register the watchpoint callback
    fn register_handler(&mut self, handler: Self::Handler) -> Result<(), Error>;
    /// Freeze the configuration
    fn enable(&mut self) -> Result<(), Error>;
    /// Back to configuration
    fn disable(&mut self) -> Result<(), Error>;
    /// Reset the counter to 0
    fn clear(&mut self) -> Result<(), Error>;
    /// Start counting
    fn start(&mut self) -> Result<(), Error>;
    /// Stop counting, the counter keeps its value
    fn stop(&mut self) -> Result<(), Error>;
    /// Current counter value
    fn count(&self) -> i32;
}

/// An edge held by the glitch filter
#[derive(Debug, Clone, Copy)]
struct HeldEdge {
    edge: Edge,
    /// Level of the channel's level signal when the edge was seen
    level: Level,
    at_ns: u64,
}

/// An installed channel, with its compiled table
#[derive(Debug, Clone, Copy)]
struct Channel {
    edge_gpio: u8,
    level_gpio: u8,
    table: DecodeTable,
    /// Edge on `edge_gpio` waiting for the glitch filter window to pass
    held: Option<HeldEdge>,
}

/// Software pulse counting unit
pub struct PulseUnit<H: WatchHandler> {
    config: UnitConfig,
    max_glitch_ns: u32,
    channels: Vec<Channel, MAX_CHANNELS>,
    watchpoints: Vec<i32, MAX_WATCHPOINTS>,
    handler: Option<H>,
    state: UnitState,
    count: i32,
}

impl<H: WatchHandler> PulseUnit<H> {
    /// Create a unit with the given limits
    pub fn new(config: UnitConfig) -> Result<Self, Error> {
        if config.low_limit >= 0 || config.high_limit <= 0 {
            return Err(Error::InvalidLimits {
                low: config.low_limit,
                high: config.high_limit,
            });
        }
        Ok(Self {
            config,
            max_glitch_ns: 0,
            channels: Vec::new(),
            watchpoints: Vec::new(),
            handler: None,
            state: UnitState::Init,
            count: 0,
        })
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn config(&self) -> UnitConfig {
        self.config
    }

    /// Apply an edge seen on `edge_gpio` at `timestamp_ns`
    ///
    /// `levels` is a snapshot of the pins taken with the edge: each channel
    /// counting `edge_gpio` samples its own `level_gpio` in it.
    ///
    /// With the glitch filter on, the edge is held until `max_glitch_ns` has
    /// passed. An opposite edge on the same GPIO within that window is a
    /// pulse too short to count: both edges are dropped. A held edge is
    /// applied by the first call to `on_edge` or [`PulseUnit::settle`] made
    /// once its window is over.
    ///
    /// Returns whether the watchpoint handler asked for a reschedule.
    pub fn on_edge(&mut self, edge_gpio: u8, edge: Edge, levels: PinLevels, timestamp_ns: u64) -> bool {
        if self.state != UnitState::Running {
            return false;
        }
        let mut reschedule = self.settle(timestamp_ns);
        for i in 0..self.channels.len() {
            let channel = &mut self.channels[i];
            if channel.edge_gpio != edge_gpio {
                continue;
            }
            let level = levels.get(channel.level_gpio);
            if self.max_glitch_ns == 0 {
                let delta = channel.table.delta(edge, level);
                reschedule |= self.apply(delta);
                continue;
            }
            let seen = HeldEdge {
                edge,
                level,
                at_ns: timestamp_ns,
            };
            match channel.held.take() {
                // Short pulse, drop both edges
                Some(held) if held.edge != edge => {}
                // Same direction twice, the edge in between was lost
                Some(held) => {
                    channel.held = Some(seen);
                    let delta = channel.table.delta(held.edge, held.level);
                    reschedule |= self.apply(delta);
                }
                None => channel.held = Some(seen),
            }
        }
        reschedule
    }

    /// Apply the held edges whose glitch filter window is over at `now_ns`
    ///
    /// Returns whether the watchpoint handler asked for a reschedule.
    pub fn settle(&mut self, now_ns: u64) -> bool {
        if self.state != UnitState::Running {
            return false;
        }
        let mut reschedule = false;
        for i in 0..self.channels.len() {
            let channel = &mut self.channels[i];
            let delta = match channel.held {
                Some(held) if now_ns.saturating_sub(held.at_ns) >= self.max_glitch_ns as u64 => {
                    channel.held = None;
                    channel.table.delta(held.edge, held.level)
                }
                _ => continue,
            };
            reschedule |= self.apply(delta);
        }
        reschedule
    }

    /// When the next held edge can be settled, in ns
    pub fn settle_deadline(&self) -> Option<u64> {
        self.channels
            .iter()
            .filter_map(|c| c.held)
            .map(|held| held.at_ns.saturating_add(self.max_glitch_ns as u64))
            .min()
    }

    /// Move the counter, notifying when it lands on a watchpoint
    fn apply(&mut self, delta: Delta) -> bool {
        let next = self
            .count
            .saturating_add(delta.as_i32())
            .clamp(self.config.low_limit, self.config.high_limit);
        if next == self.count {
            return false;
        }
        self.count = next;
        if !self.watchpoints.contains(&next) {
            return false;
        }
        match &self.handler {
            Some(handler) => handler.on_reach(next),
            None => false,
        }
    }

    fn forget_held_edges(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.held = None;
        }
    }

    fn expect_state(&self, state: UnitState) -> Result<(), Error> {
        if self.state == state {
            Ok(())
        } else {
            Err(Error::InvalidState)
        }
    }
}

impl<H: WatchHandler> CountingPeripheral for PulseUnit<H> {
    type Handler = H;

    fn set_glitch_filter(&mut self, config: GlitchFilterConfig) -> Result<(), Error> {
        self.expect_state(UnitState::Init)?;
        if config.max_glitch_ns > MAX_GLITCH_NS {
            return Err(Error::GlitchFilterTooLong(config.max_glitch_ns));
        }
        self.max_glitch_ns = config.max_glitch_ns;
        Ok(())
    }

    fn add_channel(&mut self, config: ChannelConfig) -> Result<(), Error> {
        self.expect_state(UnitState::Init)?;
        self.channels
            .push(Channel {
                edge_gpio: config.edge_gpio,
                level_gpio: config.level_gpio,
                table: config.actions.table(),
                held: None,
            })
            .map_err(|_| Error::TooManyChannels)
    }

    fn add_watch_point(&mut self, value: i32) -> Result<(), Error> {
        self.expect_state(UnitState::Init)?;
        if value < self.config.low_limit || value > self.config.high_limit {
            return Err(Error::WatchpointOutOfRange(value));
        }
        if self.watchpoints.contains(&value) {
            return Err(Error::DuplicateWatchpoint(value));
        }
        self.watchpoints
            .push(value)
            .map_err(|_| Error::TooManyWatchpoints)
    }

    fn register_handler(&mut self, handler: H) -> Result<(), Error> {
        self.expect_state(UnitState::Init)?;
        self.handler = Some(handler);
        Ok(())
    }

    fn enable(&mut self) -> Result<(), Error> {
        self.expect_state(UnitState::Init)?;
        self.state = UnitState::Enabled;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), Error> {
        self.expect_state(UnitState::Enabled)?;
        self.state = UnitState::Init;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Error> {
        if self.state == UnitState::Init {
            return Err(Error::InvalidState);
        }
        self.count = 0;
        self.forget_held_edges();
        Ok(())
    }

    fn start(&mut self) -> Result<(), Error> {
        self.expect_state(UnitState::Enabled)?;
        self.state = UnitState::Running;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        self.expect_state(UnitState::Running)?;
        self.state = UnitState::Enabled;
        self.forget_held_edges();
        Ok(())
    }

    fn count(&self) -> i32 {
        self.count
    }
}
