//! Integer linear interpolation between two ranges.

use crate::error::GloveError;

/// Map `x` from `[in_min, in_max]` onto `[out_min, out_max]`:
///
/// `(x - in_min) * (out_max - out_min) / (in_max - in_min) + out_min`
///
/// Division truncates toward zero. `x` outside the input range extrapolates.
/// Intermediates are 128-bit; a result beyond `i64` saturates.
///
/// Returns `GloveError::DegenerateCalibration` when `in_min == in_max`.
pub fn linear_map(
    x: i64,
    in_min: i64,
    in_max: i64,
    out_min: i64,
    out_max: i64,
) -> Result<i64, GloveError> {
    let in_span = i128::from(in_max) - i128::from(in_min);
    if in_span == 0 {
        return Err(GloveError::DegenerateCalibration(in_min));
    }
    let out_span = i128::from(out_max) - i128::from(out_min);
    let scaled = (i128::from(x) - i128::from(in_min)) * out_span / in_span + i128::from(out_min);
    Ok(i64::try_from(scaled).unwrap_or(if scaled < 0 { i64::MIN } else { i64::MAX }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, 100, 900, 0, 99, 0)]
    #[case(900, 100, 900, 0, 99, 99)]
    #[case(500, 100, 900, 0, 99, 49)] // 400*99/800 = 49.5, truncated
    #[case(50, 100, 900, 0, 99, -6)] // below range extrapolates, truncating toward zero
    #[case(300, 900, 100, 0, 99, 74)] // reversed input range
    #[case(5, 0, 10, 100, 0, 50)] // reversed output range
    fn maps_known_points(
        #[case] x: i64,
        #[case] in_min: i64,
        #[case] in_max: i64,
        #[case] out_min: i64,
        #[case] out_max: i64,
        #[case] want: i64,
    ) {
        assert_eq!(linear_map(x, in_min, in_max, out_min, out_max), Ok(want));
    }

    #[test]
    fn equal_input_bounds_are_degenerate() {
        assert_eq!(
            linear_map(512, 512, 512, 0, 99),
            Err(GloveError::DegenerateCalibration(512))
        );
    }

    #[test]
    fn extreme_inputs_saturate_instead_of_overflowing() {
        assert_eq!(linear_map(i64::MAX, 0, 1, 0, i64::MAX), Ok(i64::MAX));
        assert_eq!(linear_map(i64::MIN, 0, 1, 0, i64::MAX), Ok(i64::MIN));
    }
}
