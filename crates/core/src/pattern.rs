//! Crew allocation patterns for fractional assignment rates.
//!
//! A rate such as 0.75 workers per shift cycle is turned into a repeating
//! integer pattern (`[1, 1, 1, 0]`) whose average equals the rate. Rates are
//! rounded to two decimal places before reduction; that precision is fixed
//! so stored patterns stay comparable.

use serde::{Deserialize, Serialize};

/// Fixed denominator: rates are resolved to the nearest 0.01.
pub const RATE_DENOMINATOR: i64 = 100;

/// Largest rate a pattern is calculated for.
pub const MAX_RATE: f64 = 10_000.0;

/// A repeating allocation: `pattern[i]` workers in slot `i` of each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPattern {
    pub cycle: usize,
    pub pattern: Vec<i64>,
}

impl AllocationPattern {
    fn single(value: i64) -> Self {
        Self {
            cycle: 1,
            pattern: vec![value],
        }
    }

    /// Sum of the pattern entries over one cycle.
    pub fn total(&self) -> i64 {
        self.pattern.iter().sum()
    }
}

/// Reject rates no pattern can be calculated for.
pub fn check_rate(rate: f64) -> Result<(), String> {
    if !rate.is_finite() {
        return Err("Rate must be a finite number".to_string());
    }
    if rate > MAX_RATE {
        return Err(format!("Rate cannot be greater than {MAX_RATE}"));
    }
    Ok(())
}

/// Convert a fractional rate into a repeating integer allocation.
///
/// The cycle is the reduced denominator of the rate rounded to hundredths,
/// so 0.75 repeats every 4 slots and 1/3 (rounded to 0.33) every 100.
///
/// - `rate <= 0` (or not finite) gives `[0]`.
/// - Rates above [`MAX_RATE`] are clamped to it.
/// - Whole rates give `[rate]`.
/// - Otherwise the rate becomes `round(rate * 100) / 100`, reduced by the
///   gcd, and the numerator is spread over `denominator` slots with the
///   remainder front-loaded one unit per slot.
pub fn calculate_pattern(rate: f64) -> AllocationPattern {
    if !rate.is_finite() || rate <= 0.0 {
        return AllocationPattern::single(0);
    }
    let rate = rate.min(MAX_RATE);
    if rate.fract() == 0.0 {
        return AllocationPattern::single(rate as i64);
    }

    let numerator = (rate * RATE_DENOMINATOR as f64).round() as i64;
    if numerator == 0 {
        return AllocationPattern::single(0);
    }
    let divisor = gcd(numerator, RATE_DENOMINATOR);
    let num = numerator / divisor;
    let den = RATE_DENOMINATOR / divisor;

    let base = num / den;
    let remainder = (num % den) as usize;

    let pattern = (0..den as usize)
        .map(|slot| if slot < remainder { base + 1 } else { base })
        .collect();

    AllocationPattern {
        cycle: den as usize,
        pattern,
    }
}

/// Check that a pattern is internally consistent.
pub fn validate_pattern(allocation: &AllocationPattern) -> Result<(), String> {
    if allocation.cycle == 0 {
        return Err("Pattern cycle must be at least 1".to_string());
    }
    if allocation.pattern.len() != allocation.cycle {
        return Err(format!(
            "Pattern length {} does not match cycle {}",
            allocation.pattern.len(),
            allocation.cycle
        ));
    }
    if let Some(slot) = allocation.pattern.iter().position(|v| *v < 0) {
        return Err(format!(
            "Pattern entry at slot {slot} is negative ({})",
            allocation.pattern[slot]
        ));
    }
    Ok(())
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_quarters() {
        let p = calculate_pattern(0.75);
        assert_eq!(p.cycle, 4);
        assert_eq!(p.pattern, vec![1, 1, 1, 0]);
    }

    #[test]
    fn whole_rate_is_single_slot() {
        assert_eq!(calculate_pattern(2.0), AllocationPattern::single(2));
    }

    #[test]
    fn zero_and_negative_rates() {
        assert_eq!(calculate_pattern(0.0), AllocationPattern::single(0));
        assert_eq!(calculate_pattern(-1.5), AllocationPattern::single(0));
        assert_eq!(calculate_pattern(f64::NAN), AllocationPattern::single(0));
    }

    #[test]
    fn one_third_rounds_to_hundredths() {
        let p = calculate_pattern(1.0 / 3.0);
        assert_eq!(p.cycle, 100);
        assert_eq!(p.pattern.len(), 100);
        assert_eq!(p.total(), 33);
    }

    #[test]
    fn rate_above_one_carries_base() {
        // 2.5 -> 250/100 -> 5/2
        let p = calculate_pattern(2.5);
        assert_eq!(p.cycle, 2);
        assert_eq!(p.pattern, vec![3, 2]);
    }

    #[test]
    fn rounding_can_produce_whole_rate() {
        // 1.999 rounds to 200/100 -> 2/1
        assert_eq!(calculate_pattern(1.999), AllocationPattern::single(2));
    }

    #[test]
    fn tiny_rate_rounds_to_zero() {
        assert_eq!(calculate_pattern(0.004), AllocationPattern::single(0));
    }

    #[test]
    fn sum_and_length_hold_for_every_hundredth() {
        for hundredths in 1..=500_i64 {
            let rate = hundredths as f64 / 100.0;
            let p = calculate_pattern(rate);
            let g = gcd(hundredths, RATE_DENOMINATOR);
            assert_eq!(p.pattern.len(), p.cycle, "rate {rate}");
            assert_eq!(p.cycle as i64, RATE_DENOMINATOR / g, "rate {rate}");
            assert_eq!(p.total(), hundredths / g, "rate {rate}");
            assert!(validate_pattern(&p).is_ok());
        }
    }

    #[test]
    fn huge_rate_is_clamped() {
        assert_eq!(calculate_pattern(1e300), AllocationPattern::single(MAX_RATE as i64));
    }

    #[test]
    fn rate_check_bounds() {
        assert!(check_rate(0.75).is_ok());
        assert!(check_rate(-2.0).is_ok());
        assert!(check_rate(MAX_RATE).is_ok());
        assert!(check_rate(MAX_RATE + 0.5).unwrap_err().contains("greater than"));
        assert!(check_rate(f64::INFINITY).is_err());
        assert!(check_rate(f64::NAN).is_err());
    }

    #[test]
    fn validator_rejects_length_mismatch() {
        let p = AllocationPattern {
            cycle: 3,
            pattern: vec![1, 0],
        };
        assert!(validate_pattern(&p).unwrap_err().contains("does not match"));
    }

    #[test]
    fn validator_rejects_negative_entries() {
        let p = AllocationPattern {
            cycle: 2,
            pattern: vec![1, -1],
        };
        assert!(validate_pattern(&p).unwrap_err().contains("negative"));
    }

    #[test]
    fn validator_rejects_empty_cycle() {
        let p = AllocationPattern {
            cycle: 0,
            pattern: vec![],
        };
        assert!(validate_pattern(&p).is_err());
    }
}
