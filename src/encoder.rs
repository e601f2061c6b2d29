//! Tempo and phase quantization
//!
//! The clock hardware understands tempos between 60 and 187 BPM with two
//! decimal digits, and a beat phase of 0..=127. All rounding is
//! half-away-from-zero (`f64::round`).

pub const MIN_BPM: u64 = 60;
pub const MAX_BPM: u64 = MIN_BPM + FIELD_MAX as u64;
pub const FIELD_MAX: u8 = 0x7F;

/// Where the requested tempo sits relative to the encodable window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempoRange {
    InRange,
    /// Reported as 60 BPM
    BelowRange,
    /// Reported as 187 BPM
    AboveRange,
}

/// Three 7-bit fields ready for the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedFields {
    pub bpm_whole: u8,
    pub bpm_fractional: u8,
    pub phase: u8,
    pub range: TempoRange,
}

pub fn encode(bpm: f64, beat_distance: f64) -> EncodedFields {
    let (whole, fractional) = split_bpm(bpm);
    let (bpm_whole, range) = encode_whole(whole);

    EncodedFields {
        bpm_whole,
        bpm_fractional: fractional,
        phase: encode_phase(beat_distance),
        range,
    }
}

/// Rounds to hundredths first, so 119.999 becomes (120, 0)
fn split_bpm(bpm: f64) -> (u64, u8) {
    let hundredths = if bpm.is_finite() && bpm > 0.0 {
        (bpm * 100.0).round() as u64
    } else {
        0
    };
    (hundredths / 100, (hundredths % 100) as u8)
}

fn encode_whole(whole: u64) -> (u8, TempoRange) {
    if whole < MIN_BPM {
        (0, TempoRange::BelowRange)
    } else if whole > MAX_BPM {
        (FIELD_MAX, TempoRange::AboveRange)
    } else {
        ((whole - MIN_BPM) as u8, TempoRange::InRange)
    }
}

fn encode_phase(beat_distance: f64) -> u8 {
    if !beat_distance.is_finite() || beat_distance <= 0.0 {
        return 0;
    }
    let phase = (beat_distance * f64::from(FIELD_MAX)).round();
    phase.min(f64::from(FIELD_MAX)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_whole_and_fractional() {
        let fields = encode(128.37, 0.0);
        assert_eq!(fields.bpm_whole, 68);
        assert_eq!(fields.bpm_fractional, 37);
        assert_eq!(fields.range, TempoRange::InRange);
    }

    #[test]
    fn test_rounds_to_hundredths_before_splitting() {
        let fields = encode(119.999, 0.0);
        assert_eq!(fields.bpm_whole, 60);
        assert_eq!(fields.bpm_fractional, 0);

        let fields = encode(120.016, 0.0);
        assert_eq!(fields.bpm_fractional, 2);
    }

    #[test]
    fn test_whole_field_covers_window() {
        for bpm in MIN_BPM..=MAX_BPM {
            let fields = encode(bpm as f64, 0.0);
            assert_eq!(u64::from(fields.bpm_whole), bpm - MIN_BPM);
            assert_eq!(fields.bpm_fractional, 0);
            assert_eq!(fields.range, TempoRange::InRange);
        }
    }

    #[test]
    fn test_clamps_outside_window() {
        let slow = encode(45.0, 0.0);
        assert_eq!(slow.bpm_whole, 0);
        assert_eq!(slow.range, TempoRange::BelowRange);

        let fast = encode(200.0, 0.0);
        assert_eq!(fast.bpm_whole, 127);
        assert_eq!(fast.range, TempoRange::AboveRange);

        let edge = encode(187.99, 0.0);
        assert_eq!(edge.bpm_whole, 127);
        assert_eq!(edge.bpm_fractional, 99);
        assert_eq!(edge.range, TempoRange::InRange);

        // 187.999 rounds up to 188.00
        assert_eq!(encode(187.999, 0.0).range, TempoRange::AboveRange);
        assert_eq!(encode(0.0, 0.0).range, TempoRange::BelowRange);
    }

    #[test]
    fn test_phase_boundaries() {
        assert_eq!(encode(120.0, 0.0).phase, 0);
        // 63.5 rounds half away from zero
        assert_eq!(encode(120.0, 0.5).phase, 64);
        assert_eq!(encode(120.0, 0.999_999).phase, 127);
        assert_eq!(encode(120.0, 1.0 - f64::EPSILON).phase, 127);
        assert_eq!(encode(120.0, 1.0).phase, 127);
    }

    #[test]
    fn test_phase_stays_in_range() {
        for step in 0..1000 {
            let beat_distance = step as f64 / 1000.0;
            let phase = encode(120.0, beat_distance).phase;
            assert_eq!(phase, (beat_distance * 127.0).round() as u8);
            assert!(phase <= 127);
        }
    }
}
