//! Perceptual volume mapping
//!
//! User-facing volume is a 0-100 percentage. Native media elements take a
//! linear amplitude in 0.0..=1.0. The two are related by a cubic curve so
//! that equal slider steps sound roughly equal:
//!
//! - `native = (percent / 100) ^ 3`
//! - `percent = native ^ (1 / 3) * 100`
//!
//! Both directions share [`VOLUME_EXPONENT`], so the mapping round-trips
//! for every integer percentage and is exact at 0 and 100.

/// Exponent of the perceptual curve
pub const VOLUME_EXPONENT: f64 = 3.0;

/// Convert a 0-100 percentage to native amplitude
///
/// Values above 100 are clamped.
pub fn percent_to_native(percent: u8) -> f64 {
    let fraction = f64::from(percent.min(100)) / 100.0;
    fraction.powf(VOLUME_EXPONENT)
}

/// Convert native amplitude to a 0-100 percentage
///
/// Out-of-range and non-finite amplitudes are clamped to 0.0..=1.0.
pub fn native_to_percent(native: f64) -> u8 {
    let native = if native.is_finite() {
        native.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let percent = (native.powf(1.0 / VOLUME_EXPONENT) * 100.0).round();

    // percent is within 0.0..=100.0 here
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = percent as u8;
    percent.min(100)
}
