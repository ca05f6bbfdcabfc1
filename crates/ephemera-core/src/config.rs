//! Simulator timing and probability configuration.

use std::time::Duration;

use crate::types::MessageKind;

/// Inclusive range of delays sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    /// Shortest delay.
    pub min: Duration,
    /// Longest delay.
    pub max: Duration,
}

impl DelayRange {
    /// No delay at all.
    pub const ZERO: DelayRange = DelayRange { min: Duration::ZERO, max: Duration::ZERO };

    /// Range between `min` and `max`. Bounds are swapped if given in reverse.
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min { Self { min: max, max: min } } else { Self { min, max } }
    }

    /// Range containing exactly one delay.
    pub fn fixed(delay: Duration) -> Self {
        Self { min: delay, max: delay }
    }

    /// Range in milliseconds.
    pub fn millis(min: u64, max: u64) -> Self {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }
}

/// Configuration for [`crate::ChatSimulator`].
///
/// Defaults reproduce the latencies of the mock chat screens: delivery after
/// 1.5s, read 1s later, then a reply that starts typing 1-3s after the read
/// and lands 2-3s after that.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Delay from `Sent` to `Delivered`.
    pub delivery_delay: Duration,

    /// Delay from `Delivered` to `Read`.
    pub read_delay: Duration,

    /// Chance in `[0, 1]` that a read text message draws a reply.
    pub reply_probability: f64,

    /// Chance in `[0, 1]` that a read image or voice message draws a reply.
    pub media_reply_probability: f64,

    /// Pause between the read receipt and the peer starting to type.
    pub reply_lead: DelayRange,

    /// How long the peer types before the reply lands.
    pub typing_duration: DelayRange,

    /// Delay before unprompted peer activity after a conversation is opened.
    /// `None` disables unprompted activity.
    pub unsolicited_delay: Option<DelayRange>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            delivery_delay: Duration::from_millis(1500),
            read_delay: Duration::from_millis(1000),
            reply_probability: 0.7,
            media_reply_probability: 1.0,
            reply_lead: DelayRange::millis(1000, 3000),
            typing_duration: DelayRange::millis(2000, 3000),
            unsolicited_delay: Some(DelayRange::millis(5000, 15_000)),
        }
    }
}

impl SimulatorConfig {
    /// Set both status delays.
    #[must_use]
    pub fn with_status_delays(mut self, delivery: Duration, read: Duration) -> Self {
        self.delivery_delay = delivery;
        self.read_delay = read;
        self
    }

    /// Set the same reply probability for every message kind.
    ///
    /// Clamped to `[0, 1]`; NaN means never reply.
    #[must_use]
    pub fn with_reply_probability(mut self, probability: f64) -> Self {
        let probability = if probability.is_nan() { 0.0 } else { probability.clamp(0.0, 1.0) };
        self.reply_probability = probability;
        self.media_reply_probability = probability;
        self
    }

    /// Set the reply lead range.
    #[must_use]
    pub fn with_reply_lead(mut self, lead: DelayRange) -> Self {
        self.reply_lead = lead;
        self
    }

    /// Set the typing duration range.
    #[must_use]
    pub fn with_typing_duration(mut self, typing: DelayRange) -> Self {
        self.typing_duration = typing;
        self
    }

    /// Set or disable unprompted peer activity.
    #[must_use]
    pub fn with_unsolicited_delay(mut self, delay: Option<DelayRange>) -> Self {
        self.unsolicited_delay = delay;
        self
    }

    /// Reply probability for a read message of `kind`.
    pub fn reply_probability_for(&self, kind: MessageKind) -> f64 {
        if kind.is_media() { self.media_reply_probability } else { self.reply_probability }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_range_orders_bounds() {
        let range = DelayRange::millis(3000, 1000);
        assert_eq!(range.min, Duration::from_millis(1000));
        assert_eq!(range.max, Duration::from_millis(3000));
    }

    #[test]
    fn reply_probability_is_clamped_and_split_by_kind() {
        let config = SimulatorConfig::default();
        assert!((config.reply_probability_for(MessageKind::Text) - 0.7).abs() < f64::EPSILON);
        assert!((config.reply_probability_for(MessageKind::Voice) - 1.0).abs() < f64::EPSILON);

        let config = config.with_reply_probability(4.0);
        assert!((config.reply_probability_for(MessageKind::Text) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nan_reply_probability_never_replies() {
        let config = SimulatorConfig::default().with_reply_probability(f64::NAN);
        assert!(config.reply_probability_for(MessageKind::Text).abs() < f64::EPSILON);
        assert!(config.reply_probability_for(MessageKind::Image).abs() < f64::EPSILON);
    }
}
