//! RF5C400 device: register file and synthesis engine
//!
//! The device exposes a 16-bit register window split at offset 0x400 into
//! global/command registers and 32 per-voice register banks, and renders
//! stereo audio in caller-sized blocks at `clock / 384` Hz. Register writes
//! mutate voice state synchronously; the host serializes writes and render
//! calls.

use log::{debug, trace};

use crate::rf5c400::channel::{self, Channel, NUM_VOICES};
use crate::rf5c400::envelope::{EnvPhase, EnvelopeTables};
use crate::rf5c400::memory::SampleMemory;
use crate::rf5c400::tables;

/// Default master clock (16.9344 MHz, 44.1 kHz output rate).
pub const DEFAULT_CLOCK: u32 = 16_934_400;

/// Output sample rate divisor: one output sample per 384 clock cycles.
pub const CLOCK_DIVIDER: u32 = 384;

/// Offsets below this decode as global registers, at or above as per-voice
/// register banks.
const VOICE_REG_BASE: u16 = 0x400;

/// RF5C400 32-voice PCM sound generator.
///
/// Generic over its sample storage: the chip fetches PCM words through
/// [`SampleMemory`] and exposes the indirect memory-access registers over
/// the same seam.
///
/// # Example
///
/// ```
/// use rf5c400::{Rf5c400, SampleRam};
///
/// let mut chip = Rf5c400::new(SampleRam::new(0x10000));
///
/// // Voice 0: play words 0x100..=0x1FF at 1:1 rate, full volume, centered.
/// chip.write(0x400, 0x0000); // start 23-16
/// chip.write(0x401, 0x0100); // start 15-0
/// chip.write(0x402, 0x5000); // frequency
/// chip.write(0x403, 0x01FF); // end 15-0
/// chip.write(0x404, 0x0000); // end 23-16 / loop 23-16
/// chip.write(0x405, 0x0100); // loop 15-0
/// chip.write(0x001, 0x0060); // key on voice 0
///
/// let mut left = [0.0f32; 64];
/// let mut right = [0.0f32; 64];
/// chip.render(&mut left, &mut right);
/// ```
pub struct Rf5c400<M: SampleMemory> {
    mem: M,
    clock: u32,
    status: u16,
    ext_mem_address: u32,
    ext_mem_data: u16,
    req_channel: usize,
    env_tables: EnvelopeTables,
    channels: [Channel; NUM_VOICES],
}

impl<M: SampleMemory> Rf5c400<M> {
    /// Create a chip with the default master clock.
    pub fn new(mem: M) -> Self {
        Self::with_clock(mem, DEFAULT_CLOCK)
    }

    /// Create a chip with a custom master clock in Hz.
    pub fn with_clock(mem: M, clock: u32) -> Self {
        Rf5c400 {
            mem,
            clock,
            status: 0,
            ext_mem_address: 0,
            ext_mem_data: 0,
            req_channel: 0,
            env_tables: EnvelopeTables::new(clock),
            channels: [Channel::new(); NUM_VOICES],
        }
    }

    /// Reset all voices and command state, as a hardware reset does.
    /// The clock setting and sample storage are preserved.
    pub fn reset(&mut self) {
        self.status = 0;
        self.ext_mem_address = 0;
        self.ext_mem_data = 0;
        self.req_channel = 0;
        self.channels = [Channel::new(); NUM_VOICES];
    }

    /// Change the master clock: rebuilds the envelope rate tables and the
    /// output sample rate without touching voice playback state.
    pub fn set_clock(&mut self, clock: u32) {
        self.clock = clock;
        self.env_tables.init(clock);
    }

    /// Current master clock in Hz.
    pub fn clock(&self) -> u32 {
        self.clock
    }

    /// Output sample rate in Hz (`clock / 384`).
    pub fn sample_rate(&self) -> u32 {
        self.clock / CLOCK_DIVIDER
    }

    /// Shared access to the sample storage.
    pub fn memory(&self) -> &M {
        &self.mem
    }

    /// Mutable access to the sample storage, for host-side DMA loads.
    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.mem
    }

    /// Inspect one voice.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 32`.
    pub fn voice(&self, index: usize) -> &Channel {
        &self.channels[index]
    }

    /// Read a register.
    ///
    /// Global reads expose the status register, the streaming-position poll
    /// and the indirect memory-data port; everything else reads as 0 except
    /// the fixed per-voice 0x0F sentinel. The position poll reflects state
    /// as of the last rendered block.
    pub fn read(&self, offset: u16) -> u16 {
        if offset < VOICE_REG_BASE {
            match offset {
                0x00 => self.status,

                0x09 => {
                    // Position poll for the last requested voice, in units
                    // of 64 words past the sample start. Drivers pace
                    // streaming DMA refills off this value; muted voices
                    // read 0.
                    let ch = &self.channels[self.req_channel];
                    if ch.env_phase() == EnvPhase::None {
                        return 0;
                    }
                    let words = (ch.position() >> 16).wrapping_sub(u64::from(ch.start()));
                    (words >> 6) as u16
                }

                0x13 => self.mem.read_word(self.ext_mem_address << 1),

                _ => {
                    trace!("unhandled global read {offset:#05X}");
                    0
                }
            }
        } else {
            match offset & 0x1F {
                // Fixed sentinel observed on hardware.
                0x0F => 0xF,
                reg => {
                    trace!("unhandled voice register read {reg:#04X}");
                    0
                }
            }
        }
    }

    /// Write a register.
    ///
    /// Writes take effect immediately: the next rendered sample sees the
    /// new state. Unknown offsets are ignored.
    pub fn write(&mut self, offset: u16, data: u16) {
        if offset < VOICE_REG_BASE {
            self.write_global(offset, data);
        } else {
            self.write_voice_reg(
                usize::from((offset >> 5) & 0x1F),
                offset & 0x1F,
                data,
            );
        }
    }

    fn write_global(&mut self, offset: u16, data: u16) {
        match offset {
            0x00 => self.status = data,

            0x01 => {
                // Channel control: voice index in bits 4-0, command in
                // bits 6-5.
                let voice = usize::from(data & 0x1F);
                match data & 0x60 {
                    0x60 => {
                        trace!("key on voice {voice:02X}");
                        self.channels[voice].key_on(&self.env_tables);
                    }
                    0x40 => {
                        trace!("key off voice {voice:02X}");
                        self.channels[voice].key_off(&self.env_tables);
                    }
                    _ => {
                        trace!("mute voice {voice:02X}");
                        self.channels[voice].mute();
                    }
                }
            }

            0x08 => {
                // The upper bits carry a poll command id; only the voice
                // index matters for the position read at 0x09.
                self.req_channel = usize::from(data & 0x1F);
            }

            0x09 => trace!("envelope-related global write {data:#06X} ignored"),

            // External memory address, bits 15-0 then 23-16.
            0x11 => self.ext_mem_address = (self.ext_mem_address & !0xFFFF) | u32::from(data),
            0x12 => self.ext_mem_address = (self.ext_mem_address & 0xFFFF) | (u32::from(data) << 16),

            // External memory write-data latch.
            0x13 => self.ext_mem_data = data,

            0x14 => {
                // Commit the latched word; requires both qualifier bits.
                if data & 0x3 == 0x3 {
                    self.mem.write_word(self.ext_mem_address << 1, self.ext_mem_data);
                }
            }

            0x20 | 0x21 | 0x22 | 0x23 | 0x24 | 0x27 | 0x2B | 0x2C | 0x2F | 0x30 | 0x32 => {
                // Reverb/chorus family: accepted, no effect on the audio
                // path.
                debug!("effect register {offset:#04X} = {data:#06X} (not implemented)");
            }

            _ => debug!("unhandled global write {offset:#05X} = {data:#06X}"),
        }
    }

    fn write_voice_reg(&mut self, voice: usize, reg: u16, data: u16) {
        let ch = &mut self.channels[voice];
        match reg {
            0x00 => ch.set_start_high(data),
            0x01 => ch.set_start_low(data),
            0x02 => ch.set_frequency(data),
            0x03 => ch.set_end_low(data),
            0x04 => ch.set_end_loop_high(data),
            0x05 => ch.set_loop_low(data),
            0x06 => ch.pan = data,
            // 0xCCRR: chorus / reverb send depths, latched only.
            0x07 => ch.effect = data,
            0x08 => ch.volume = data,
            0x09 => ch.attack = data,
            0x0C => ch.decay = data,
            0x0E => ch.release = data,
            // Companions of the rate registers, observed as constants;
            // no modeled behavior.
            0x0A | 0x0B | 0x0D => {
                trace!("voice {voice:02X} env register {reg:#04X} = {data:#06X} ignored");
            }
            0x0F => trace!("voice {voice:02X} register 0x0F = {data:#06X} ignored"),
            // Bits 15-12 resonance, bits 11-0 cutoff; latched only.
            0x10 => ch.cutoff = data,
            _ => debug!("unhandled voice register write {reg:#04X} = {data:#06X}"),
        }
    }

    /// Render one block of stereo output.
    ///
    /// Both buffers are zeroed, then each live voice accumulates into them.
    /// Exactly `left.len()` frames are produced synchronously.
    ///
    /// # Panics
    ///
    /// Panics if the buffers differ in length.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        assert_eq!(
            left.len(),
            right.len(),
            "stereo output buffers must have equal length"
        );

        left.fill(0.0);
        right.fill(0.0);

        for index in 0..NUM_VOICES {
            let ch = self.channels[index];

            let start = u64::from(ch.start());
            let end = u64::from(ch.end());
            let loop_offset = u64::from(ch.loop_offset());
            let step = u64::from(ch.step());
            let mut pos = ch.position();

            // Empty sample slot; drivers key these on for nonexistent
            // sounds and expect silence.
            if start == end {
                continue;
            }

            let vol_scale = tables::volume(ch.volume_code());
            let pan_l = tables::pan(ch.pan_left());
            let pan_r = tables::pan(ch.pan_right());
            let sample_type = ch.sample_type();

            let mut env_phase = ch.env_phase();
            let mut env_level = ch.env_level();
            let mut env_step = ch.env_step();
            let mut env_rstep = env_step * ch.env_scale;

            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                // A finished envelope leaves the rest of the block silent
                // for this voice.
                if env_phase == EnvPhase::None {
                    break;
                }

                let raw = self.mem.read_word(((pos >> 16) << 1) as u32);
                let mut sample = channel::fold_sign(channel::decode_sample(raw, sample_type));

                env_level += env_rstep;
                match env_phase {
                    EnvPhase::Attack => {
                        if env_level >= 1.0 {
                            env_phase = EnvPhase::Decay;
                            env_level = 1.0;
                            env_step = if ch.decay_holds() {
                                0.0
                            } else {
                                self.env_tables.decay_rate(ch.decay)
                            };
                            env_rstep = env_step * ch.env_scale;
                        }
                    }
                    EnvPhase::Decay | EnvPhase::Release => {
                        if env_level <= 0.0 {
                            env_phase = EnvPhase::None;
                            env_level = 0.0;
                            env_step = 0.0;
                            env_rstep = 0.0;
                        }
                    }
                    EnvPhase::None => {}
                }

                // Integer volume scaling, then fractional envelope
                // modulation, truncating at each stage as the DAC path does.
                sample *= vol_scale;
                let sample = ((sample >> 9) as f64 * env_level) as i32;
                *l += (f64::from(sample) * pan_l) as i32 as f32 / 32768.0;
                *r += (f64::from(sample) * pan_r) as i32 as f32 / 32768.0;

                pos += step;
                if (pos >> 16) > end {
                    pos = pos.wrapping_sub(loop_offset << 16);
                    // Rewind lands on a whole sample: fractional bits clear.
                    pos &= 0xFF_FFFF_0000;
                    if pos < (start << 16) {
                        // Streaming DMA leaves the loop length larger than
                        // the live buffer; wrap back to the buffer head.
                        pos = start << 16;
                    }
                }
            }

            let ch = &mut self.channels[index];
            ch.pos = pos;
            ch.env_phase = env_phase;
            ch.env_level = env_level;
            ch.env_step = env_step;
        }
    }
}

impl<M: SampleMemory> std::fmt::Debug for Rf5c400<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rf5c400")
            .field("clock", &self.clock)
            .field("sample_rate", &self.sample_rate())
            .field("status", &self.status)
            .field("req_channel", &self.req_channel)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rf5c400::memory::SampleRam;

    fn chip() -> Rf5c400<SampleRam> {
        Rf5c400::new(SampleRam::new(0x10000))
    }

    #[test]
    fn test_default_sample_rate() {
        let chip = chip();
        assert_eq!(chip.sample_rate(), 44_100);
    }

    #[test]
    fn test_status_roundtrip() {
        let mut chip = chip();
        chip.write(0x00, 0x1234);
        assert_eq!(chip.read(0x00), 0x1234);
    }

    #[test]
    fn test_unknown_global_read_is_zero() {
        let chip = chip();
        assert_eq!(chip.read(0x04), 0);
        assert_eq!(chip.read(0x3FF), 0);
    }

    #[test]
    fn test_voice_register_sentinel() {
        let chip = chip();
        assert_eq!(chip.read(0x400 | 0x0F), 0xF);
        assert_eq!(chip.read(0x400 | (5 << 5) | 0x0F), 0xF);
        assert_eq!(chip.read(0x400 | 0x08), 0);
    }

    #[test]
    fn test_voice_register_decode_targets_channel() {
        let mut chip = chip();
        let base = 0x400 | (7 << 5);
        chip.write(base, 0x1200);
        chip.write(base | 0x01, 0x3456);
        chip.write(base | 0x02, 0x5000);
        assert_eq!(chip.voice(7).start(), 0x123456);
        assert_eq!(chip.voice(7).step(), 0x10000);
        assert_eq!(chip.voice(7).frequency(), 0x5000);
        // Neighbor voices untouched.
        assert_eq!(chip.voice(6).start(), 0);
        assert_eq!(chip.voice(8).start(), 0);
    }

    #[test]
    fn test_effect_registers_latch_only() {
        let mut chip = chip();
        chip.write(0x400 | 0x07, 0x1234);
        chip.write(0x400 | 0x10, 0xF123);
        assert_eq!(chip.voice(0).effect(), 0x1234);
        assert_eq!(chip.voice(0).cutoff(), 0xF123);
    }

    #[test]
    fn test_req_channel_masks_command_bits() {
        let mut chip = chip();
        // Poll command 6 in the upper bits, voice 3 in the lower.
        chip.write(0x08, (6 << 5) | 3);
        chip.write(0x400 | (3 << 5) | 0x01, 0x0100); // nonzero start
        chip.write(0x01, 0x60 | 3); // key on so the poll is live
        assert_eq!(chip.read(0x09), 0);
    }

    #[test]
    fn test_indirect_memory_write_commit() {
        let mut chip = chip();
        chip.write(0x11, 0x0042); // address 15-0
        chip.write(0x12, 0x0000); // address 23-16
        chip.write(0x13, 0xBEEF); // data latch
        chip.write(0x14, 0x0001); // one qualifier bit: no commit
        assert_eq!(chip.memory().read_word(0x42 << 1), 0);
        chip.write(0x14, 0x0003);
        assert_eq!(chip.memory().read_word(0x42 << 1), 0xBEEF);
        // The data port reads back through the same address latch.
        assert_eq!(chip.read(0x13), 0xBEEF);
    }

    #[test]
    fn test_reset_clears_command_state() {
        let mut chip = chip();
        chip.write(0x00, 0xFFFF);
        chip.write(0x401, 0x4444);
        chip.reset();
        assert_eq!(chip.read(0x00), 0);
        assert_eq!(chip.voice(0).start(), 0);
        assert_eq!(chip.sample_rate(), 44_100);
    }

    #[test]
    fn test_set_clock_keeps_playback_state() {
        let mut chip = chip();
        chip.write(0x401, 0x0100);
        chip.write(0x01, 0x60); // key on voice 0
        chip.set_clock(DEFAULT_CLOCK / 2);
        assert_eq!(chip.sample_rate(), 22_050);
        assert_eq!(chip.voice(0).position(), 0x0100 << 16);
        assert_eq!(chip.voice(0).env_phase(), EnvPhase::Attack);
    }

    #[test]
    #[should_panic(expected = "equal length")]
    fn test_render_rejects_mismatched_buffers() {
        let mut chip = chip();
        let mut left = [0.0f32; 8];
        let mut right = [0.0f32; 4];
        chip.render(&mut left, &mut right);
    }
}
