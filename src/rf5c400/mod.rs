//! RF5C400 PCM Sound Generator Domain
//!
//! Core Ricoh RF5C400 emulation: the 32-voice register file, per-voice
//! envelope state machine, attenuation tables and the block synthesis
//! engine.
//!
//! Implementation:
//! - `chip` - register interface and per-sample synthesis loop
//! - `channel` - per-voice state records
//! - `envelope` - clock-derived rate tables and phase machine
//! - `tables` - process-lifetime volume/pan attenuation curves
//! - `memory` - external sample-storage seam

// Internal modules
pub mod channel;
pub mod chip;
pub mod envelope;
pub mod memory;
pub mod tables;

// Re-export public API
pub use channel::{Channel, SampleType, NUM_VOICES};
pub use chip::{Rf5c400, CLOCK_DIVIDER, DEFAULT_CLOCK};
pub use envelope::{EnvPhase, EnvelopeTables};
pub use memory::{SampleMemory, SampleRam};
