use anyhow::Context;

use crate::models::{Classification, Standing};

pub const DEFAULT_MAX_ABSENCE_PERCENT: i32 = 25;

const NEW_COURSE_TEXT: &str = "جديد";

/// Maps an attendance rate onto a standing relative to the absence policy.
///
/// Bands are fractions of `max_absence_percent`, so the same cascade works for
/// any institutional limit. Comparisons happen on the unrounded thresholds.
pub fn classify(attendance_rate: i32, max_absence_percent: i32) -> Classification {
    let absence_rate = f64::from(100 - attendance_rate);
    let limit = f64::from(max_absence_percent);

    let standing = if absence_rate > limit {
        Standing::Blocked
    } else if absence_rate >= limit * 0.8 {
        Standing::Danger
    } else if absence_rate >= limit * 0.6 {
        Standing::Warning
    } else if absence_rate >= limit * 0.3 {
        Standing::Good
    } else {
        Standing::Excellent
    };

    Classification {
        standing,
        text: standing.label(),
        color: standing.color(),
    }
}

/// Courses that have not held a lecture yet are never at risk.
pub fn new_course() -> Classification {
    Classification {
        standing: Standing::Excellent,
        text: NEW_COURSE_TEXT,
        color: Standing::Excellent.color(),
    }
}

/// Absence limits are whole percentages; `30`, `30.0` and `"30.00"` all read as 30.
pub fn policy_percent(value: f64) -> anyhow::Result<i32> {
    if !value.is_finite() || value.fract() != 0.0 || !(0.0..=100.0).contains(&value) {
        anyhow::bail!("absence limit must be a whole percentage between 0 and 100, got {value}");
    }
    Ok(value as i32)
}

pub fn parse_policy(raw: &str) -> anyhow::Result<i32> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("absence limit is not a number: `{raw}`"))?;
    policy_percent(value)
}

pub fn percent(part: usize, whole: usize) -> i32 {
    (part as f64 / whole as f64 * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_boundary_is_exclusive() {
        assert_ne!(classify(75, 25).standing, Standing::Blocked);
        assert_eq!(classify(75, 25).standing, Standing::Danger);
        assert_eq!(classify(74, 25).standing, Standing::Blocked);
    }

    #[test]
    fn bands_follow_policy_fractions() {
        // limit 25: danger >= 20, warning >= 15, good >= 7.5
        assert_eq!(classify(80, 25).standing, Standing::Danger);
        assert_eq!(classify(81, 25).standing, Standing::Warning);
        assert_eq!(classify(85, 25).standing, Standing::Warning);
        assert_eq!(classify(86, 25).standing, Standing::Good);
        assert_eq!(classify(92, 25).standing, Standing::Good);
        assert_eq!(classify(93, 25).standing, Standing::Excellent);
        assert_eq!(classify(100, 25).standing, Standing::Excellent);
    }

    #[test]
    fn bands_scale_with_the_limit() {
        assert_eq!(classify(92, 10).standing, Standing::Danger);
        assert_eq!(classify(89, 10).standing, Standing::Blocked);
        assert_eq!(classify(70, 40).standing, Standing::Warning);
        assert_eq!(classify(68, 40).standing, Standing::Danger);
    }

    #[test]
    fn every_input_lands_in_one_band_in_cascade_order() {
        for max in 1..=100 {
            let mut previous = Standing::Excellent;
            for rate in (0..=100).rev() {
                let standing = classify(rate, max).standing;
                assert!(standing >= previous, "rate {rate} max {max}");
                previous = standing;
            }
            assert_eq!(classify(100, max).standing, Standing::Excellent);
        }
        assert_eq!(classify(0, 99).standing, Standing::Blocked);
        assert_eq!(classify(0, 100).standing, Standing::Danger);
    }

    #[test]
    fn classification_carries_label_and_color() {
        let blocked = classify(10, 25);
        assert_eq!(blocked.text, "محروم");
        assert_eq!(blocked.color, "gray");

        let fresh = new_course();
        assert_eq!(fresh.standing, Standing::Excellent);
        assert_eq!(fresh.text, "جديد");
    }

    #[test]
    fn policy_accepts_whole_decimals_only() {
        assert_eq!(parse_policy("30").unwrap(), 30);
        assert_eq!(parse_policy(" 30.00 ").unwrap(), 30);
        assert_eq!(policy_percent(25.0).unwrap(), 25);
        assert!(parse_policy("27.5").is_err());
        assert!(parse_policy("thirty").is_err());
        assert!(parse_policy("").is_err());
        assert!(policy_percent(140.0).is_err());
        assert!(policy_percent(-5.0).is_err());
        assert!(policy_percent(f64::NAN).is_err());
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent(8, 10), 80);
        assert_eq!(percent(5, 6), 83);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(0, 3), 0);
    }
}
