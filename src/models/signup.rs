use serde::Deserialize;

/// Lifecycle of one card's signup control.
///
/// `Idle -> Processing -> Signed`, `Processing -> Idle` on failure, and
/// `Idle | Processing -> Full` once the capacity check fails. `Signed` and
/// `Full` are terminal until the page is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPhase {
    Idle,
    Processing,
    Signed,
    Full,
}

impl ControlPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            ControlPhase::Idle => "idle",
            ControlPhase::Processing => "processing",
            ControlPhase::Signed => "signed",
            ControlPhase::Full => "full",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ControlPhase::Signed | ControlPhase::Full)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacitySnapshot {
    pub capacity: i64,
    pub registered: i64,
}

impl CapacitySnapshot {
    pub fn is_full(self) -> bool {
        self.registered >= self.capacity
    }

    // Not clamped: a roster that is already over capacity shows a negative value.
    pub fn spots_left(self) -> i64 {
        self.capacity - self.registered
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupControlState {
    pub activity_id: String,
    pub capacity: i64,
    pub registered: i64,
    pub phase: ControlPhase,
}

impl SignupControlState {
    pub fn new(activity_id: impl Into<String>, capacity: i64, registered: i64, signed: bool) -> Self {
        Self {
            activity_id: activity_id.into(),
            capacity,
            registered,
            phase: if signed {
                ControlPhase::Signed
            } else {
                ControlPhase::Idle
            },
        }
    }

    pub fn snapshot(&self) -> CapacitySnapshot {
        CapacitySnapshot {
            capacity: self.capacity,
            registered: self.registered,
        }
    }

    pub fn spots_left(&self) -> i64 {
        self.snapshot().spots_left()
    }
}

/// The signup form as submitted (and as redisplayed after a failure).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub activity: String,
}

impl SignupForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Error => "error",
        }
    }
}

/// The `#message` banner. `generation` increases with every message so a
/// hide timer only hides the message it was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBanner {
    pub text: String,
    pub kind: BannerKind,
    pub visible: bool,
    pub generation: u64,
}

impl Default for MessageBanner {
    fn default() -> Self {
        Self {
            text: String::new(),
            kind: BannerKind::Success,
            visible: false,
            generation: 0,
        }
    }
}

impl MessageBanner {
    pub fn show(&mut self, kind: BannerKind, text: impl Into<String>) -> u64 {
        self.generation += 1;
        self.kind = kind;
        self.text = text.into();
        self.visible = true;
        self.generation
    }

    pub fn hide_if_current(&mut self, generation: u64) -> bool {
        if self.generation != generation {
            return false;
        }
        self.visible = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spots_left_is_not_clamped() {
        let snapshot = CapacitySnapshot {
            capacity: 2,
            registered: 3,
        };
        assert_eq!(snapshot.spots_left(), -1);
        assert!(snapshot.is_full());
    }

    #[test]
    fn stale_generation_does_not_hide_banner() {
        let mut banner = MessageBanner::default();
        let first = banner.show(BannerKind::Success, "one");
        let second = banner.show(BannerKind::Error, "two");
        assert!(!banner.hide_if_current(first));
        assert!(banner.visible);
        assert!(banner.hide_if_current(second));
        assert!(!banner.visible);
    }

    #[test]
    fn signed_flag_starts_control_in_signed_phase() {
        let state = SignupControlState::new("chess", 4, 1, true);
        assert_eq!(state.phase, ControlPhase::Signed);
        assert!(state.phase.is_terminal());
        assert_eq!(state.spots_left(), 3);
    }
}
