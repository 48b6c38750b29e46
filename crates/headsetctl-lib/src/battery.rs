//! Voltage to battery percentage estimation.
//!
//! Many headsets only report a raw cell voltage. Backends convert it with one
//! of two pure strategies: piecewise-linear interpolation over calibration
//! breakpoints ([`spline_battery_level`]) or a fitted polynomial
//! ([`poly_battery_level`]).

/// Calibration breakpoints for spline interpolation.
///
/// `percentages[i]` corresponds to `voltages[i]`; both are ordered from
/// full to empty (voltages decreasing).
#[derive(Debug)]
pub struct BatteryCalibration {
    pub percentages: &'static [i32],
    pub voltages: &'static [i32],
}

/// Estimation strategy selected per device model.
#[derive(Debug, Clone, Copy)]
pub enum BatteryCurve {
    Spline(&'static BatteryCalibration),
    /// Coefficients, lowest degree first.
    Polynomial(&'static [f64]),
}

impl BatteryCurve {
    pub fn estimate(&self, voltage_mv: i32) -> i32 {
        match self {
            BatteryCurve::Spline(cal) => {
                spline_battery_level(cal.percentages, cal.voltages, voltage_mv)
            }
            BatteryCurve::Polynomial(coeffs) => poly_battery_level(coeffs, f64::from(voltage_mv)),
        }
    }
}

/// Interpolate a battery percentage from calibration breakpoints.
///
/// Voltages at or above the first breakpoint saturate at its percentage;
/// voltages below the last breakpoint saturate at the last percentage.
/// Between breakpoints the interpolated share is truncated, never rounded up.
/// Adjacent breakpoints with equal voltage yield the lower percentage.
/// Empty or mismatched tables yield 0.
pub fn spline_battery_level(percentages: &[i32], voltages: &[i32], voltage: i32) -> i32 {
    if percentages.is_empty() || percentages.len() != voltages.len() {
        return 0;
    }

    if voltage >= voltages[0] {
        return percentages[0];
    }

    for i in 0..voltages.len() - 1 {
        let (v_hi, v_lo) = (voltages[i], voltages[i + 1]);
        let (p_hi, p_lo) = (percentages[i], percentages[i + 1]);

        if voltage >= v_lo {
            if v_hi == v_lo {
                return p_lo;
            }
            let t = (voltage - v_lo) as f32 / (v_hi - v_lo) as f32;
            return p_lo + (t * (p_hi - p_lo) as f32) as i32;
        }
    }

    percentages[percentages.len() - 1]
}

/// Evaluate a polynomial (coefficients lowest degree first) at `voltage`
/// and clamp the result to `[0, 100]`.
pub fn poly_battery_level(coefficients: &[f64], voltage: f64) -> i32 {
    let value = coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * voltage + c);
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as i32
}

// ── Time estimates ──

/// Minutes to full charge, assuming ~2 hours from empty.
pub fn time_to_full_min(level: i32) -> Option<i32> {
    (level < 100).then(|| (100 - level.max(0)) * 120 / 100)
}

/// Minutes of playback left, assuming ~15 hours on a full charge.
pub fn time_to_empty_min(level: i32) -> Option<i32> {
    (level > 0).then(|| level.min(100) * 900 / 100)
}

// ── Calibrations ──

pub static LOGITECH_G533: BatteryCalibration = BatteryCalibration {
    percentages: &[100, 50, 30, 20, 5, 0],
    voltages: &[4200, 3850, 3790, 3750, 3680, 3330],
};

pub static LOGITECH_G535: BatteryCalibration = BatteryCalibration {
    percentages: &[100, 50, 30, 20, 5, 0],
    voltages: &[4175, 3817, 3766, 3730, 3664, 3310],
};

/// G633, G635, G733, G933, G935.
pub static LOGITECH_G633_FAMILY: BatteryCalibration = BatteryCalibration {
    percentages: &[100, 80, 60, 40, 20, 10, 5, 0],
    voltages: &[4100, 3950, 3850, 3750, 3650, 3500, 3300, 3150],
};

/// G430, G432.
pub static LOGITECH_G430: BatteryCalibration = BatteryCalibration {
    percentages: &[100, 50, 30, 20, 5, 0],
    voltages: &[4100, 3800, 3750, 3700, 3600, 3300],
};

pub static LOGITECH_GPRO: BatteryCalibration = BatteryCalibration {
    percentages: &[100, 50, 30, 20, 5, 0],
    voltages: &[4150, 3830, 3780, 3740, 3670, 3320],
};

pub static LOGITECH_ZONE: BatteryCalibration = BatteryCalibration {
    percentages: &[100, 50, 20, 0],
    voltages: &[4100, 3800, 3600, 3300],
};

/// Fallback for Logitech models without a measured curve.
pub static LOGITECH_DEFAULT: BatteryCalibration = BatteryCalibration {
    percentages: &[100, 50, 30, 20, 5, 0],
    voltages: &[4100, 3850, 3780, 3730, 3650, 3300],
};
