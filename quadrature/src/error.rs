//! Configuration errors

/// Errors reported while configuring the counting unit
///
/// All of them are fatal at startup: there is no sane default to fall back
/// to when the unit refuses a setting.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Limits must satisfy `low < 0 < high`
    InvalidLimits { low: i32, high: i32 },
    /// Glitch filter threshold, in ns, above what the filter can hold
    GlitchFilterTooLong(u32),
    /// All the channels of the unit are already in use
    TooManyChannels,
    /// The same watchpoint was given twice
    DuplicateWatchpoint(i32),
    /// Watchpoint outside of the counter limits
    WatchpointOutOfRange(i32),
    /// No room left for another watchpoint
    TooManyWatchpoints,
    /// Operation not allowed in the current state of the unit
    InvalidState,
}
