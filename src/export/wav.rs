//! WAV file export functionality

use std::path::Path;

use crate::rf5c400::{Rf5c400, SampleMemory};
use crate::Result;

/// Frames rendered per engine invocation while exporting.
const RENDER_BLOCK: usize = 1024;

/// Render the chip's next `frame_count` output frames to a WAV file.
///
/// The chip renders from its current register state, so voices should be
/// programmed and keyed on beforehand. The file is stereo 16-bit PCM at the
/// chip's current sample rate.
///
/// # Examples
///
/// ```no_run
/// use rf5c400::{render_to_wav, Rf5c400, SampleRam};
///
/// # fn main() -> rf5c400::Result<()> {
/// let mut chip = Rf5c400::new(SampleRam::new(0x10000));
/// // ... program voices, key on ...
/// render_to_wav(&mut chip, 44_100, "one_second.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn render_to_wav<M: SampleMemory, P: AsRef<Path>>(
    chip: &mut Rf5c400<M>,
    frame_count: usize,
    path: P,
) -> Result<()> {
    let mut left = vec![0.0f32; frame_count];
    let mut right = vec![0.0f32; frame_count];

    for (l, r) in left
        .chunks_mut(RENDER_BLOCK)
        .zip(right.chunks_mut(RENDER_BLOCK))
    {
        chip.render(l, r);
    }

    write_wav(path, &left, &right, chip.sample_rate())
}

/// Write already-rendered stereo buffers to a 16-bit PCM WAV file.
///
/// # Examples
///
/// ```no_run
/// use rf5c400::write_wav;
///
/// # fn main() -> rf5c400::Result<()> {
/// let left = vec![0.0f32; 44_100];
/// let right = vec![0.0f32; 44_100];
/// write_wav("silence.wav", &left, &right, 44_100)?;
/// # Ok(())
/// # }
/// ```
pub fn write_wav<P: AsRef<Path>>(
    path: P,
    left: &[f32],
    right: &[f32],
    sample_rate: u32,
) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)
        .map_err(|e| format!("Failed to create WAV file: {}", e))?;

    for (&l, &r) in left.iter().zip(right.iter()) {
        writer
            .write_sample(to_i16(l))
            .map_err(|e| format!("Failed to write sample: {}", e))?;
        writer
            .write_sample(to_i16(r))
            .map_err(|e| format!("Failed to write sample: {}", e))?;
    }

    writer
        .finalize()
        .map_err(|e| format!("Failed to finalize WAV file: {}", e))?;

    Ok(())
}

/// Convert a normalized sample to 16-bit PCM with clamping.
fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_i16_clamps() {
        assert_eq!(to_i16(0.0), 0);
        assert_eq!(to_i16(1.0), i16::MAX);
        assert_eq!(to_i16(2.0), i16::MAX);
        assert_eq!(to_i16(-2.0), -i16::MAX);
    }

    #[test]
    fn test_to_i16_scaling() {
        assert_eq!(to_i16(0.5), (0.5 * i16::MAX as f32) as i16);
    }
}
