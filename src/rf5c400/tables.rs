//! Volume and pan attenuation tables
//!
//! The chip attenuates every decoded sample through two fixed curves: a
//! 256-step logarithmic volume ladder and a square-root pan law with a hard
//! silence region at the bottom. Both are pure functions of chip constants
//! and are built once per process, then shared by reference.

use std::sync::LazyLock;

/// Number of volume attenuation steps (one per volume code).
pub const VOLUME_STEPS: usize = 256;

/// Number of pan attenuation entries. Codes `0x00..=0x47` attenuate,
/// `0x48..=0x63` are hard silence.
pub const PAN_STEPS: usize = 0x64;

/// First pan code of the hard-silence region.
pub const PAN_SILENCE: usize = 0x48;

/// Volume ladder: entry 0 is full scale (255), each following entry is the
/// previous divided by `10^((4.5/16)/20)` and truncated to a 16-bit integer.
/// The tail of the ladder truncates to 0.
static VOLUME_TABLE: LazyLock<[i32; VOLUME_STEPS]> = LazyLock::new(|| {
    let ratio = 10.0f64.powf((4.5 / (256.0 / 16.0)) / 20.0);
    let mut table = [0i32; VOLUME_STEPS];
    let mut level = 255.0f64;
    for entry in table.iter_mut() {
        *entry = i32::from(level as u16);
        level /= ratio;
    }
    table
});

/// Pan law: `sqrt(0x47 - code) / sqrt(0x47)` down to the silence region.
static PAN_TABLE: LazyLock<[f64; PAN_STEPS]> = LazyLock::new(|| {
    let mut table = [0.0f64; PAN_STEPS];
    let full_scale = (PAN_SILENCE as f64 - 1.0).sqrt();
    for (code, entry) in table.iter_mut().take(PAN_SILENCE).enumerate() {
        *entry = ((PAN_SILENCE - 1 - code) as f64).sqrt() / full_scale;
    }
    table
});

/// Look up the integer volume scale for a volume code.
#[inline]
pub fn volume(code: u8) -> i32 {
    VOLUME_TABLE[code as usize]
}

/// Look up the pan attenuation factor for a pan code.
///
/// Codes past the end of the table fall into the silence region and
/// return 0.0.
#[inline]
pub fn pan(code: u8) -> f64 {
    PAN_TABLE.get(code as usize).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_volume_full_scale() {
        assert_eq!(volume(0), 255);
    }

    #[test]
    fn test_volume_monotonic_non_increasing() {
        for code in 1..=255u8 {
            assert!(
                volume(code) <= volume(code - 1),
                "volume table not monotonic at {code}: {} > {}",
                volume(code),
                volume(code - 1)
            );
        }
    }

    #[test]
    fn test_volume_tail_non_negative() {
        // The far end of the ladder truncates to zero, never below.
        assert!(volume(255) >= 0);
        assert_eq!(volume(255), 0);
    }

    #[test]
    fn test_volume_log_curve() {
        // Each non-truncated step attenuates by 4.5/16 dB.
        let ratio = 10.0f64.powf((4.5 / 16.0) / 20.0);
        let expected = (255.0 / ratio.powi(16)) as u16 as i32;
        assert_eq!(volume(16), expected);
    }

    #[test]
    fn test_pan_center_is_unity() {
        assert_relative_eq!(pan(0), 1.0);
    }

    #[test]
    fn test_pan_sqrt_law() {
        for code in 0..PAN_SILENCE as u8 {
            let expected = ((0x47 - code as usize) as f64).sqrt() / (0x47 as f64).sqrt();
            assert_relative_eq!(pan(code), expected);
        }
    }

    #[test]
    fn test_pan_strictly_decreasing_until_silence() {
        for code in 1..PAN_SILENCE as u8 {
            assert!(
                pan(code) < pan(code - 1),
                "pan table not strictly decreasing at {code}"
            );
        }
    }

    #[test]
    fn test_pan_silence_region() {
        for code in PAN_SILENCE as u8..=0x63 {
            assert_eq!(pan(code), 0.0);
        }
        // Out-of-table codes read as silence too.
        assert_eq!(pan(0x64), 0.0);
        assert_eq!(pan(0xFF), 0.0);
    }
}
