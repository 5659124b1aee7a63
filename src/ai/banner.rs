//! Generation banner state machine.
//!
//! States: `Default -> Generating -> {Complete | AuthRequired} -> Dismissed`,
//! with two back-edges: cancel returns `Generating` to `Default` and the
//! setup screen's back action returns `AuthRequired` to `Default`.
//! `Complete` auto-dismisses after [`AUTO_DISMISS_MS`].

use std::fmt;

/// How long a completed banner lingers before auto-dismissing.
pub const AUTO_DISMISS_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerState {
    Default,
    Generating,
    Complete,
    AuthRequired,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerEvent {
    /// Generation started.
    Start,
    /// All CLIs settled with at least one fulfilled result.
    Finish,
    /// A CLI rejected with `CliNotAuthenticated`.
    AuthFailure,
    /// User cancelled an in-flight generation.
    Cancel,
    /// Back from the setup screen.
    Back,
    /// Explicit dismissal, or the auto-dismiss timer firing on `Complete`.
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub state: BannerState,
    pub event: BannerEvent,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event {:?} is not valid in state {:?}", self.event, self.state)
    }
}

impl std::error::Error for InvalidTransition {}

#[derive(Debug, Clone, Copy)]
pub struct Banner {
    state: BannerState,
}

impl Default for Banner {
    fn default() -> Self {
        Self::new()
    }
}

impl Banner {
    pub fn new() -> Self {
        Banner {
            state: BannerState::Default,
        }
    }

    pub fn state(&self) -> BannerState {
        self.state
    }

    /// Apply an event, rejecting transitions outside the state machine.
    pub fn apply(&mut self, event: BannerEvent) -> Result<BannerState, InvalidTransition> {
        use BannerEvent::*;
        use BannerState::*;

        let next = match (self.state, event) {
            (Default, Start) => Generating,
            (Generating, Finish) => Complete,
            (Generating, AuthFailure) => AuthRequired,
            (Generating, Cancel) => Default,
            (AuthRequired, Back) => Default,
            (Complete, Dismiss) => Dismissed,
            (AuthRequired, Dismiss) => Dismissed,
            (Default, Dismiss) => Dismissed,
            (state, event) => return Err(InvalidTransition { state, event }),
        };
        self.state = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_reaches_dismissed() {
        let mut banner = Banner::new();
        banner.apply(BannerEvent::Start).unwrap();
        banner.apply(BannerEvent::Finish).unwrap();
        assert_eq!(banner.state(), BannerState::Complete);
        banner.apply(BannerEvent::Dismiss).unwrap();
        assert_eq!(banner.state(), BannerState::Dismissed);
    }

    #[test]
    fn cancel_returns_to_default() {
        let mut banner = Banner::new();
        banner.apply(BannerEvent::Start).unwrap();
        banner.apply(BannerEvent::Cancel).unwrap();
        assert_eq!(banner.state(), BannerState::Default);
        // The banner is usable again after a cancel.
        banner.apply(BannerEvent::Start).unwrap();
        assert_eq!(banner.state(), BannerState::Generating);
    }

    #[test]
    fn auth_failure_offers_a_way_back() {
        let mut banner = Banner::new();
        banner.apply(BannerEvent::Start).unwrap();
        banner.apply(BannerEvent::AuthFailure).unwrap();
        assert_eq!(banner.state(), BannerState::AuthRequired);
        banner.apply(BannerEvent::Back).unwrap();
        assert_eq!(banner.state(), BannerState::Default);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut banner = Banner::new();
        assert!(banner.apply(BannerEvent::Finish).is_err());
        assert_eq!(banner.state(), BannerState::Default);

        banner.apply(BannerEvent::Start).unwrap();
        assert!(banner.apply(BannerEvent::Start).is_err());
        assert!(banner.apply(BannerEvent::Back).is_err());

        banner.apply(BannerEvent::Finish).unwrap();
        banner.apply(BannerEvent::Dismiss).unwrap();
        assert!(banner.apply(BannerEvent::Start).is_err(), "dismissed is terminal");
    }
}
