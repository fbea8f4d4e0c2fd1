//! GPIO pin identifiers and static pin configuration.

/// Platform-scoped pin number (GPIO matrix index on the ESP32).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinId(u8);

impl PinId {
    pub const fn new(gpio: u8) -> Self {
        Self(gpio)
    }

    /// Raw GPIO number.
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Single-bit mask used by bulk GPIO configuration calls.
    #[inline]
    pub const fn mask(self) -> u64 {
        1u64 << self.0
    }
}

impl core::fmt::Display for PinId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Pin direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Which logic transitions raise an interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeTrigger {
    /// Interrupts disabled for this pin.
    Disabled,
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
    /// Either transition.
    Any,
}

/// Static configuration applied once per pin at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinConfig {
    pub direction: Direction,
    pub pull_up: bool,
    pub pull_down: bool,
    pub edge: EdgeTrigger,
}

impl PinConfig {
    /// Input with internal pull-up, interrupting on `edge`.
    pub const fn pulled_up_input(edge: EdgeTrigger) -> Self {
        Self {
            direction: Direction::Input,
            pull_up: true,
            pull_down: false,
            edge,
        }
    }

    /// Plain output, no pull resistors, no interrupt.
    pub const fn output() -> Self {
        Self {
            direction: Direction::Output,
            pull_up: false,
            pull_down: false,
            edge: EdgeTrigger::Disabled,
        }
    }
}
