/// HyperBus chip-select timing, in controller clock cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Minimum chip-select high time between transactions.
    pub cs_high: u8,
    pub cs_setup: u8,
    pub cs_hold: u8,
    /// Additional initial access latency.
    pub latency: u8,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            cs_high: 4,
            cs_setup: 4,
            cs_hold: 4,
            latency: 0,
        }
    }
}

/// Driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Number of status reads before an operation is declared timed out.
    pub poll_attempts: u32,
    /// Delay between two status reads.
    pub poll_interval_us: u32,
    /// Volatile configuration register value written by `init`.
    ///
    /// The default selects 5 initial read latency cycles.
    pub vcr: u16,
    pub timing: Timing,
    /// Longest burst the controller may issue on the flash channel.
    pub max_transfer_len: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_attempts: 10_000,
            poll_interval_us: 1_000,
            vcr: 0x8E0B,
            timing: Timing::default(),
            max_transfer_len: 0x1FF,
        }
    }
}
