//! Edge/level decode policy
//!
//! A counting channel watches two signals: the *edge* signal, whose
//! transitions are counted, and the *level* signal, sampled at the moment of
//! each transition. The edge action picks a direction from the transition,
//! the level action then keeps, inverts or cancels it.
//!
//! For an EC11 style encoder with A on the edge input and B on the level
//! input this gives:
//!
//! | Edge on A | Level of B | Delta |
//! |-----------|------------|-------|
//! | falling   | low        | hold  |
//! | falling   | high       | +1    |
//! | rising    | low        | hold  |
//! | rising    | high       | -1    |

/// Transition observed on the edge signal
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    /// Edge between two samples of the same signal, if any
    pub fn from_levels(before: Level, after: Level) -> Option<Self> {
        match (before, after) {
            (Level::Low, Level::High) => Some(Edge::Rising),
            (Level::High, Level::Low) => Some(Edge::Falling),
            _ => None,
        }
    }
}

/// Logic level of a signal
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Levels of the GPIOs at one instant, one bit per GPIO number
///
/// GPIOs 64 and above cannot be represented and always read low.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinLevels(u64);

impl PinLevels {
    /// All pins low
    pub const fn new() -> Self {
        Self(0)
    }

    /// Same snapshot with `gpio` at `level`
    pub const fn with(self, gpio: u8, level: Level) -> Self {
        if gpio >= 64 {
            return self;
        }
        match level {
            Level::High => Self(self.0 | 1 << gpio),
            Level::Low => Self(self.0 & !(1 << gpio)),
        }
    }

    /// Level of `gpio`
    pub fn get(&self, gpio: u8) -> Level {
        let bits = self.0.checked_shr(gpio as u32).unwrap_or(0);
        Level::from(bits & 1 == 1)
    }
}

/// Change applied to the counter for one edge
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delta {
    Increment,
    Decrement,
    Hold,
}

impl Delta {
    /// Signed value of the delta
    pub fn as_i32(self) -> i32 {
        match self {
            Delta::Increment => 1,
            Delta::Decrement => -1,
            Delta::Hold => 0,
        }
    }

    /// Opposite direction, hold stays hold
    fn inverse(self) -> Self {
        match self {
            Delta::Increment => Delta::Decrement,
            Delta::Decrement => Delta::Increment,
            Delta::Hold => Delta::Hold,
        }
    }
}

/// What to do with the counter on an edge of the edge signal
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeAction {
    Hold,
    Increase,
    Decrease,
}

/// How the level signal modifies the edge action
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LevelAction {
    /// Keep the edge action
    Keep,
    /// Invert the edge action
    Inverse,
    /// Do not count at all
    Hold,
}

/// Edge and level actions of one counting channel
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelActions {
    /// Action on a rising edge of the edge signal
    pub on_rising: EdgeAction,
    /// Action on a falling edge of the edge signal
    pub on_falling: EdgeAction,
    /// Modifier when the level signal is high
    pub when_high: LevelAction,
    /// Modifier when the level signal is low
    pub when_low: LevelAction,
}

impl ChannelActions {
    /// Channel on A checking B: falling A with B high counts up
    pub const fn ec11() -> Self {
        Self {
            on_rising: EdgeAction::Decrease,
            on_falling: EdgeAction::Increase,
            when_high: LevelAction::Keep,
            when_low: LevelAction::Hold,
        }
    }

    /// Mirror channel on B checking A
    ///
    /// Counts the same direction as [`ChannelActions::ec11`] when installed
    /// with B as edge signal and A as level signal.
    pub const fn ec11_mirror() -> Self {
        Self {
            on_rising: EdgeAction::Increase,
            on_falling: EdgeAction::Decrease,
            when_high: LevelAction::Keep,
            when_low: LevelAction::Hold,
        }
    }

    /// Compile the actions into a decode table
    pub fn table(&self) -> DecodeTable {
        let cell = |edge: EdgeAction, level: LevelAction| {
            let delta = match edge {
                EdgeAction::Hold => Delta::Hold,
                EdgeAction::Increase => Delta::Increment,
                EdgeAction::Decrease => Delta::Decrement,
            };
            match level {
                LevelAction::Keep => delta,
                LevelAction::Inverse => delta.inverse(),
                LevelAction::Hold => Delta::Hold,
            }
        };
        DecodeTable {
            cells: [
                [
                    cell(self.on_rising, self.when_low),
                    cell(self.on_rising, self.when_high),
                ],
                [
                    cell(self.on_falling, self.when_low),
                    cell(self.on_falling, self.when_high),
                ],
            ],
        }
    }
}

/// 2x2 decision table: edge direction x level
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodeTable {
    /// `cells[edge][level]`, rising first, low first
    cells: [[Delta; 2]; 2],
}

impl DecodeTable {
    /// Delta for an edge seen with the given level on the paired signal
    pub fn delta(&self, edge: Edge, level: Level) -> Delta {
        let e = match edge {
            Edge::Rising => 0,
            Edge::Falling => 1,
        };
        let l = match level {
            Level::Low => 0,
            Level::High => 1,
        };
        self.cells[e][l]
    }
}
