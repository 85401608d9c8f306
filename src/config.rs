use crate::Epoch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Epoch before the first `ground()` call; the first call stamps `base_epoch + 1`.
    pub base_epoch: Epoch,
    /// Prefix of display names made up for atoms without an output symbol.
    pub synthesized_prefix: &'static str,
}
pub const CONFIG: Config = Config { base_epoch: 0, synthesized_prefix: "x_" };

impl Default for Config {
    fn default() -> Self {
        CONFIG
    }
}
