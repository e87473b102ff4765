use rdpwn_timing::TimerId;

pub const FIRST_POLL_MS: u64 = 100;
pub const POLL_INTERVAL_MS: u64 = 250;
/// Silence required before the screen counts as settled.
pub const SILENCE_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuiescenceState {
    Accumulating,
    Settled,
}

#[derive(Debug, Default)]
pub struct QuiescenceDetector {
    last_update: Option<u64>,
    poll_timer: Option<TimerId>,
}

impl QuiescenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_update(&mut self, now: u64) {
        self.last_update = Some(now);
    }

    pub fn is_armed(&self) -> bool {
        self.poll_timer.is_some()
    }

    pub fn set_armed(&mut self, id: TimerId) {
        self.poll_timer = Some(id);
    }

    /// Consumes the armed poll and reports whether the silence threshold has
    /// passed. No update at all counts as still accumulating.
    pub fn poll(&mut self, now: u64) -> QuiescenceState {
        self.poll_timer = None;
        match self.last_update {
            Some(last) if now.saturating_sub(last) > SILENCE_MS => QuiescenceState::Settled,
            _ => QuiescenceState::Accumulating,
        }
    }

    pub fn reset(&mut self) -> Option<TimerId> {
        self.last_update = None;
        self.poll_timer.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settles_only_after_strict_silence() {
        let mut detector = QuiescenceDetector::new();
        detector.record_update(1000);
        assert_eq!(detector.poll(1500), QuiescenceState::Accumulating);
        assert_eq!(detector.poll(1501), QuiescenceState::Settled);
    }

    #[test]
    fn late_update_restarts_silence() {
        let mut detector = QuiescenceDetector::new();
        detector.record_update(0);
        detector.record_update(400);
        assert_eq!(detector.poll(600), QuiescenceState::Accumulating);
        assert_eq!(detector.poll(901), QuiescenceState::Settled);
    }

    #[test]
    fn poll_disarms_and_reset_clears() {
        let mut detector = QuiescenceDetector::new();
        assert_eq!(detector.poll(10_000), QuiescenceState::Accumulating);
        detector.set_armed(7);
        assert!(detector.is_armed());
        detector.record_update(5);
        assert_eq!(detector.reset(), Some(7));
        assert!(!detector.is_armed());
        assert_eq!(detector.poll(10_000), QuiescenceState::Accumulating);
    }
}
