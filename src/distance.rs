//! RSSI to distance estimation.
//!
//! Uses the empirical two-branch path-loss fit common to beacon
//! implementations. The constants are a calibration contract shared with
//! other implementations and must stay exact for readings to be comparable.

/// Distance returned when the radio reported no signal.
pub const INDETERMINATE_DISTANCE: f64 = -1.0;

/// Ratio at which the estimate switches from the power curve to the fit.
const BRANCH_RATIO: f64 = 1.0;

/// Exponent for ratios below [`BRANCH_RATIO`].
const NEAR_EXPONENT: i32 = 10;

const FIT_COEFFICIENT: f64 = 0.89976;
const FIT_EXPONENT: f64 = 7.7095;
const FIT_OFFSET: f64 = 0.111;

/// Estimate distance in meters from a received signal strength.
///
/// # Arguments
///
/// * `reference_power` - RSSI expected at 1 meter, as broadcast in the frame
/// * `rssi` - Received signal strength in dBm
///
/// # Returns
///
/// Estimated distance in meters, or [`INDETERMINATE_DISTANCE`] when `rssi`
/// is zero. The two branches do not meet at a ratio of exactly 1 (1.0
/// versus 1.01076); readings there jump by about a centimeter.
///
/// # Example
///
/// ```
/// use beacon_proximity::distance::estimate;
///
/// let meters = estimate(-75, -80);
/// assert!((meters - 1.5908).abs() < 0.001);
/// assert_eq!(estimate(-75, 0), -1.0);
/// ```
pub fn estimate(reference_power: i8, rssi: i32) -> f64 {
    if rssi == 0 {
        return INDETERMINATE_DISTANCE;
    }

    let ratio = f64::from(rssi) / f64::from(reference_power);
    if ratio < BRANCH_RATIO {
        ratio.powi(NEAR_EXPONENT)
    } else {
        FIT_COEFFICIENT * ratio.powf(FIT_EXPONENT) + FIT_OFFSET
    }
}

/// Check whether a distance is the indeterminate sentinel.
#[inline]
pub fn is_indeterminate(distance: f64) -> bool {
    distance == INDETERMINATE_DISTANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_rssi_is_indeterminate() {
        assert_eq!(estimate(-75, 0), -1.0);
        assert_eq!(estimate(0, 0), -1.0);
        assert_eq!(estimate(127, 0), -1.0);
        assert!(is_indeterminate(estimate(-59, 0)));
    }

    #[test]
    fn test_far_branch_golden_value() {
        // ratio = 80 / 75
        let meters = estimate(-75, -80);
        assert!((meters - 1.590_837_835).abs() < 1e-6, "got {}", meters);
    }

    #[test]
    fn test_near_branch() {
        // ratio = 60 / 75 = 0.8
        let meters = estimate(-75, -60);
        assert!((meters - 0.8f64.powi(10)).abs() < 1e-12);
        assert!((meters - 0.107_374_182_4).abs() < 1e-9);
    }

    #[test]
    fn test_branch_boundary() {
        // At ratio 1 the fit branch applies.
        let at_one = estimate(-75, -75);
        assert!((at_one - 1.01076).abs() < 1e-9);

        let just_below = estimate(-75, -74);
        assert!(just_below < 1.0);
    }

    #[test]
    fn test_is_indeterminate() {
        assert!(is_indeterminate(-1.0));
        assert!(!is_indeterminate(0.0));
        assert!(!is_indeterminate(1.5));
    }

    proptest! {
        #[test]
        fn prop_zero_rssi_always_sentinel(reference_power in any::<i8>()) {
            prop_assert_eq!(estimate(reference_power, 0), INDETERMINATE_DISTANCE);
        }

        #[test]
        fn prop_distance_grows_with_weaker_signal(
            reference_power in -100i8..-30,
            rssi in -120i32..-1,
        ) {
            let nearer = estimate(reference_power, rssi + 1);
            let farther = estimate(reference_power, rssi);
            prop_assert!(farther >= nearer);
        }
    }
}
