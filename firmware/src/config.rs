//! Board configuration

use quadrature::decode::ChannelActions;
use quadrature::pipeline::{WaitPolicy, DEFAULT_TIMEOUT_MS};
use quadrature::unit::{ChannelConfig, GlitchFilterConfig, UnitConfig};

/// Counter upper limit
pub const PCNT_HIGH_LIMIT: i32 = 100;
/// Counter lower limit
pub const PCNT_LOW_LIMIT: i32 = -100;

pub const LIMITS: UnitConfig = UnitConfig {
    low_limit: PCNT_LOW_LIMIT,
    high_limit: PCNT_HIGH_LIMIT,
};

/// EC11 signal A
pub const EC11_GPIO_A: u8 = 7;
/// EC11 signal B
pub const EC11_GPIO_B: u8 = 2;

/// Ignore pulses shorter than 1µs
pub const GLITCH_FILTER: GlitchFilterConfig = GlitchFilterConfig {
    max_glitch_ns: 1000,
};

/// Values of the counter reported as events
pub const WATCHPOINTS: [i32; 5] = [PCNT_LOW_LIMIT, -50, 0, 50, PCNT_HIGH_LIMIT];

/// Number of events in the watchpoint queue
pub const NB_EVENTS: usize = 10;

/// Edge on A, check B
const CHANNEL_A: ChannelConfig = ChannelConfig {
    edge_gpio: EC11_GPIO_A,
    level_gpio: EC11_GPIO_B,
    actions: ChannelActions::ec11(),
};

#[cfg(not(feature = "dual_channel"))]
pub const CHANNELS: &[ChannelConfig] = &[CHANNEL_A];

#[cfg(feature = "dual_channel")]
pub const CHANNELS: &[ChannelConfig] = &[
    CHANNEL_A,
    // Edge on B, check A
    ChannelConfig {
        edge_gpio: EC11_GPIO_B,
        level_gpio: EC11_GPIO_A,
        actions: ChannelActions::ec11_mirror(),
    },
];

#[cfg(not(feature = "busy_poll"))]
pub const WAIT_POLICY: WaitPolicy = WaitPolicy::Timeout {
    ms: DEFAULT_TIMEOUT_MS,
};

#[cfg(feature = "busy_poll")]
pub const WAIT_POLICY: WaitPolicy = WaitPolicy::BusyPoll;
