//! Summary statistics used by the fit diagnostics.
//!
//! Only the pieces [`crate::ols::LinearFit`] needs: compensated sums, the
//! mean, and the centered sum of squares behind R².

/// Neumaier compensated summation.
///
/// An improved Kahan variant that also captures the low-order bits when
/// the addend is larger in magnitude than the running sum, giving O(ε)
/// error independent of `n`.
///
/// Reference: Neumaier (1974), *ZAMM* 54(1), pp. 39–51.
///
/// # Examples
/// ```
/// use u_numfit::stats::kahan_sum;
/// assert_eq!(kahan_sum(&[1.0, 1e100, 1.0, -1e100]), 2.0);
/// ```
pub fn kahan_sum(data: &[f64]) -> f64 {
    kahan_sum_iter(data.iter().copied())
}

/// [`kahan_sum`] over any iterator of values, so residual sums need not
/// be collected first.
pub fn kahan_sum_iter<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let (sum, compensation) = values.into_iter().fold((0.0_f64, 0.0_f64), |(sum, c), x| {
        let t = sum + x;
        let c = if sum.abs() >= x.abs() {
            c + ((sum - t) + x)
        } else {
            c + ((x - t) + sum)
        };
        (t, c)
    });
    sum + compensation
}

/// Arithmetic mean with compensated summation.
///
/// # Returns
/// `None` if `data` is empty or contains NaN/Inf.
///
/// # Examples
/// ```
/// use u_numfit::stats::mean;
/// assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), Some(3.0));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !data.iter().all(|x| x.is_finite()) {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

/// Σ (xᵢ − x̄)², the total sum of squares around the mean.
///
/// Two-pass: the mean first, then compensated accumulation of squared
/// deviations.
///
/// # Returns
/// `None` if `data` is empty or contains NaN/Inf.
pub fn centered_sum_of_squares(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    Some(kahan_sum_iter(data.iter().map(|&x| (x - m) * (x - m))))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn finite_vec(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
        proptest::collection::vec(-1e6_f64..1e6, min_len..=max_len)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn sum_of_squares_non_negative(data in finite_vec(1, 100)) {
            prop_assert!(centered_sum_of_squares(&data).unwrap() >= 0.0);
        }

        #[test]
        fn mean_within_bounds(data in finite_vec(1, 100)) {
            let m = mean(&data).unwrap();
            let lo = data.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(m >= lo - 1e-9 && m <= hi + 1e-9, "mean {m} outside [{lo}, {hi}]");
        }
    }
}
