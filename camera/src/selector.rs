//! Capture resolution selection.

use serde::{Deserialize, Serialize};

use crate::Resolution;

/// An open interval of width/height ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRange {
    /// Exclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

impl AspectRange {
    /// Approximately 4:3.
    pub const FOUR_BY_THREE: Self = Self {
        min: 1.32,
        max: 1.34,
    };

    /// Whether `ratio` lies strictly inside the range.
    #[must_use]
    pub fn contains(&self, ratio: f64) -> bool {
        ratio > self.min && ratio < self.max
    }
}

impl Default for AspectRange {
    fn default() -> Self {
        Self::FOUR_BY_THREE
    }
}

/// Pick the widest resolution whose aspect ratio lies inside `range`.
///
/// The first candidate wins ties on width. Returns [`Resolution::ZERO`] when
/// nothing matches; callers treat that as "use the device default".
pub fn select_capture_resolution<'a, I>(available: I, range: AspectRange) -> Resolution
where
    I: IntoIterator<Item = &'a Resolution>,
{
    available
        .into_iter()
        .filter(|candidate| {
            candidate
                .aspect_ratio()
                .is_some_and(|ratio| range.contains(ratio))
        })
        .fold(Resolution::ZERO, |best, candidate| {
            if candidate.width > best.width {
                *candidate
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_widest_four_by_three() {
        let available = [
            Resolution::new(640, 480),
            Resolution::new(1280, 960),
            Resolution::new(800, 600),
        ];
        assert_eq!(
            select_capture_resolution(&available, AspectRange::FOUR_BY_THREE),
            Resolution::new(1280, 960)
        );
    }

    #[test]
    fn ignores_other_ratios() {
        let available = [
            Resolution::new(3840, 2160),
            Resolution::new(1024, 768),
            Resolution::new(1920, 1080),
        ];
        assert_eq!(
            select_capture_resolution(&available, AspectRange::FOUR_BY_THREE),
            Resolution::new(1024, 768)
        );
    }

    #[test]
    fn no_match_is_zero() {
        assert_eq!(
            select_capture_resolution(&[], AspectRange::FOUR_BY_THREE),
            Resolution::ZERO
        );
        let wide = [Resolution::new(1920, 1080), Resolution::new(1280, 0)];
        assert_eq!(
            select_capture_resolution(&wide, AspectRange::FOUR_BY_THREE),
            Resolution::ZERO
        );
    }

    #[test]
    fn first_candidate_wins_ties() {
        // 3264x2448 and 3264x2449 are both inside the range.
        let available = [Resolution::new(3264, 2448), Resolution::new(3264, 2449)];
        assert_eq!(
            select_capture_resolution(&available, AspectRange::FOUR_BY_THREE),
            Resolution::new(3264, 2448)
        );
    }

    #[test]
    fn bounds_are_exclusive() {
        let range = AspectRange { min: 1.0, max: 2.0 };
        assert!(!range.contains(1.0));
        assert!(!range.contains(2.0));
        assert!(range.contains(1.5));
    }
}
