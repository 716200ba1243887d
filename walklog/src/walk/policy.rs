//! Fix acceptance policy.
//!
//! By default every delivered fix is appended to the path. GPS jitter while
//! standing still then adds spurious distance; callers who care can opt into
//! [`AcceptancePolicy::MinMovement`], which drops fixes that did not move far
//! enough from the last accepted one.

use super::model::PositionSample;

/// Decides whether a delivered fix is appended to the path.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AcceptancePolicy {
    /// Append every fix.
    #[default]
    AcceptAll,

    /// Drop fixes closer than `meters` to the last accepted sample.
    MinMovement {
        /// Minimum great-circle distance in meters.
        meters: f64,
    },
}

impl AcceptancePolicy {
    /// Build a policy from a minimum movement in meters.
    ///
    /// Zero, negative or non-finite values mean "accept everything".
    pub fn from_min_movement(meters: f64) -> Self {
        if meters.is_finite() && meters > 0.0 {
            AcceptancePolicy::MinMovement { meters }
        } else {
            AcceptancePolicy::AcceptAll
        }
    }

    /// Effective minimum movement in meters.
    ///
    /// Zero for [`AcceptancePolicy::AcceptAll`] and for a `MinMovement`
    /// threshold that is not a positive finite number.
    pub fn min_movement_m(&self) -> f64 {
        match self {
            AcceptancePolicy::MinMovement { meters } if meters.is_finite() && *meters > 0.0 => {
                *meters
            }
            _ => 0.0,
        }
    }

    /// Whether `next` should be appended after `last_accepted`.
    ///
    /// The first fix of a session is always accepted.
    pub fn accepts(&self, last_accepted: Option<&PositionSample>, next: &PositionSample) -> bool {
        let threshold = self.min_movement_m();
        match last_accepted {
            Some(last) if threshold > 0.0 => last.distance_to(next) >= threshold,
            _ => true,
        }
    }
}
