//! RF5C400 PCM Sound Chip Emulator
//!
//! A bit-accurate emulator of the Ricoh RF5C400, the 32-voice PCM sound
//! generator used by Konami Firebeat-era arcade hardware. The chip plays
//! 16-bit and 8-bit PCM from an external word-addressable memory, with a
//! per-voice attack/decay/release envelope, logarithmic volume attenuation
//! and a square-root pan law, at an output rate of `clock / 384`.
//!
//! # Features
//! - All 32 PCM voices with fixed-point pitch control and loop handling
//! - Full envelope generator, including the chip's nonlinear rate encoding
//! - Register-accurate command interface (key-on/key-off/mute, streaming
//!   position poll, indirect memory access)
//! - Hardware numeric quirks preserved (sign-fold sample encoding,
//!   truncating attenuation arithmetic, loop-wrap masking)
//! - Block-based stereo rendering and WAV export
//!
//! # Crate feature flags
//! - `streaming` (default): block transport between the render loop and an
//!   audio callback (`streaming`)
//!
//! # Quick start
//! ```
//! use rf5c400::{Rf5c400, SampleRam};
//!
//! let mut ram = SampleRam::new(0x10000);
//! ram.load(0x100, &[0x4000; 0x100]);
//!
//! let mut chip = Rf5c400::new(ram);
//! chip.write(0x401, 0x0100); // voice 0 start
//! chip.write(0x403, 0x01FF); // voice 0 end
//! chip.write(0x404, 0x0000); // end high / loop high
//! chip.write(0x405, 0x0100); // loop low
//! chip.write(0x402, 0x5000); // 1:1 playback rate
//! chip.write(0x001, 0x0060); // key on voice 0
//!
//! let mut left = [0.0f32; 256];
//! let mut right = [0.0f32; 256];
//! chip.render(&mut left, &mut right);
//! ```

#![warn(missing_docs)]

// Domain modules
pub mod export; // WAV rendering
pub mod rf5c400; // RF5C400 PCM emulation (core)

#[cfg(feature = "streaming")]
pub mod streaming; // Block transport to an audio callback

/// Error types for emulator operations
///
/// The synthesis core itself never fails: malformed register configurations
/// decode to silence by hardware policy. This enum covers the export and
/// streaming surfaces around it.
#[derive(thiserror::Error, Debug)]
pub enum Rf5c400Error {
    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Rf5c400Error {
    /// Converts a String into `Rf5c400Error::Other`.
    ///
    /// Convenience conversion for generic string errors; prefer the specific
    /// variant constructors where the error class is known.
    fn from(msg: String) -> Self {
        Rf5c400Error::Other(msg)
    }
}

impl From<&str> for Rf5c400Error {
    /// Converts a string slice into `Rf5c400Error::Other`.
    fn from(msg: &str) -> Self {
        Rf5c400Error::Other(msg.to_string())
    }
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, Rf5c400Error>;

// Public API exports
pub use export::{render_to_wav, write_wav};
pub use rf5c400::{
    Channel, EnvPhase, Rf5c400, SampleMemory, SampleRam, SampleType, CLOCK_DIVIDER, DEFAULT_CLOCK,
    NUM_VOICES,
};

#[cfg(feature = "streaming")]
pub use streaming::{RingBuffer, StreamConfig};
