//! Counting unit installation
//!
//! Applies a configuration to a [`CountingPeripheral`] in the order the
//! hardware expects, then arms it. Any refusal aborts the installation: the
//! caller must not start consuming events with a half configured unit.

use crate::error::Error;
use crate::log::{info, Debug2Format};
use crate::unit::{ChannelConfig, CountingPeripheral, GlitchFilterConfig};
use crate::watchpoints::WatchpointSet;

/// Everything needed to arm a counting unit
#[derive(Debug, Clone)]
pub struct EncoderConfig<'a> {
    pub glitch_filter: GlitchFilterConfig,
    /// Channel on A checking B, then the optional mirror channel
    pub channels: &'a [ChannelConfig],
    pub watchpoints: &'a WatchpointSet,
}

/// Configure, enable, clear and start `unit`
pub fn install<P: CountingPeripheral>(
    unit: &mut P,
    config: &EncoderConfig<'_>,
    handler: P::Handler,
) -> Result<(), Error> {
    info!("set glitch filter");
    unit.set_glitch_filter(config.glitch_filter)?;

    info!("install pcnt channels");
    for channel in config.channels {
        info!(
            "set edge and level actions on gpio {} (level gpio {}): {}",
            channel.edge_gpio,
            channel.level_gpio,
            Debug2Format(&channel.actions)
        );
        unit.add_channel(*channel)?;
    }

    info!("add watch points");
    for value in config.watchpoints.iter() {
        unit.add_watch_point(value)?;
    }

    info!("register event callbacks");
    unit.register_handler(handler)?;

    info!("enable pcnt unit");
    unit.enable()?;

    info!("clear pcnt unit");
    unit.clear()?;

    info!("start pcnt unit");
    unit.start()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{ChannelActions, Edge, Level, PinLevels};
    use crate::pipeline::Producer;
    use crate::queue::{EventQueue, QUEUE_CAPACITY};
    use crate::unit::{PulseUnit, UnitConfig, UnitState};
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use lovely_env_logger;

    type Queue = EventQueue<CriticalSectionRawMutex, QUEUE_CAPACITY>;

    const LIMITS: UnitConfig = UnitConfig {
        low_limit: -100,
        high_limit: 100,
    };

    const EC11: [ChannelConfig; 1] = [ChannelConfig {
        edge_gpio: 7,
        level_gpio: 2,
        actions: ChannelActions::ec11(),
    }];

    #[test]
    fn test_install() {
        let _ = lovely_env_logger::try_init_default();
        let queue = Queue::new();
        let watchpoints = WatchpointSet::new(&[-100, -50, 0, 50, 100], -100, 100).unwrap();
        let config = EncoderConfig {
            glitch_filter: GlitchFilterConfig { max_glitch_ns: 1000 },
            channels: &EC11,
            watchpoints: &watchpoints,
        };
        let mut unit = PulseUnit::new(LIMITS).unwrap();
        install(&mut unit, &config, Producer::new(&queue)).unwrap();
        assert_eq!(unit.state(), UnitState::Running);
        assert_eq!(unit.count(), 0);

        // Counter-clockwise cycles, each edge 2µs apart
        let b_high = PinLevels::new().with(2, Level::High);
        for i in 0..50u64 {
            unit.on_edge(7, Edge::Rising, b_high, i * 4000);
            unit.on_edge(7, Edge::Falling, PinLevels::new(), i * 4000 + 2000);
        }
        assert_eq!(unit.count(), -50);
        unit.settle(200_000);
        assert_eq!(unit.count(), -50);
        assert_eq!(queue.try_receive(), Some(-50));
        assert_eq!(queue.try_receive(), None);
    }

    #[test]
    fn test_install_rejects_bad_filter() {
        let _ = lovely_env_logger::try_init_default();
        let queue = Queue::new();
        let watchpoints = WatchpointSet::new(&[0], -100, 100).unwrap();
        let config = EncoderConfig {
            glitch_filter: GlitchFilterConfig {
                max_glitch_ns: 1_000_000,
            },
            channels: &EC11,
            watchpoints: &watchpoints,
        };
        let mut unit = PulseUnit::new(LIMITS).unwrap();
        assert_eq!(
            install(&mut unit, &config, Producer::new(&queue)),
            Err(Error::GlitchFilterTooLong(1_000_000))
        );
        assert_eq!(unit.state(), UnitState::Init);
    }

    #[test]
    fn test_install_rejects_watchpoints_beyond_unit_limits() {
        let _ = lovely_env_logger::try_init_default();
        let queue = Queue::new();
        // Validated against wider bounds than the unit accepts
        let watchpoints = WatchpointSet::new(&[0, 150], -200, 200).unwrap();
        let config = EncoderConfig {
            glitch_filter: GlitchFilterConfig { max_glitch_ns: 0 },
            channels: &EC11,
            watchpoints: &watchpoints,
        };
        let mut unit = PulseUnit::new(LIMITS).unwrap();
        assert_eq!(
            install(&mut unit, &config, Producer::new(&queue)),
            Err(Error::WatchpointOutOfRange(150))
        );
    }

    #[test]
    fn test_install_too_many_channels() {
        let _ = lovely_env_logger::try_init_default();
        let queue = Queue::new();
        let watchpoints = WatchpointSet::new(&[], -100, 100).unwrap();
        let channels = [EC11[0], EC11[0], EC11[0]];
        let config = EncoderConfig {
            glitch_filter: GlitchFilterConfig { max_glitch_ns: 0 },
            channels: &channels,
            watchpoints: &watchpoints,
        };
        let mut unit = PulseUnit::new(LIMITS).unwrap();
        assert_eq!(
            install(&mut unit, &config, Producer::new(&queue)),
            Err(Error::TooManyChannels)
        );
    }
}
