//! Demo: program two voices through the register file and render a short
//! stereo clip to a WAV file.

use std::f64::consts::TAU;

use anyhow::{Context, Result};
use rf5c400::{write_wav, Rf5c400, SampleMemory, SampleRam};

/// Firebeat master clock: 44.1 kHz output.
const CLOCK: u32 = 16_934_400;

/// Word address of the looped waveform in sample memory.
const TONE_BASE: u32 = 0x1000;
/// Loop length in words.
const TONE_LEN: u32 = 0x800;

const OUTPUT_PATH: &str = "rf5c400-demo.wav";

fn main() -> Result<()> {
    env_logger::init();

    let mut ram = SampleRam::new(0x10000);
    ram.load(TONE_BASE as usize, &sine_words(TONE_LEN as usize));

    let mut chip = Rf5c400::with_clock(ram, CLOCK);
    let sample_rate = chip.sample_rate();

    // Voice 0: the loop at native rate, panned slightly left, gentle attack.
    program_voice(
        &mut chip,
        0,
        VoiceSetup {
            start: TONE_BASE,
            end: TONE_BASE + TONE_LEN - 1,
            loop_offset: TONE_LEN,
            freq: 0x5000, // one word per tick
            pan: 0x1000,  // L attenuation 0x00, R attenuation 0x10
            volume: 0x0000,
            attack: 0x4000,
            decay: 0x0080, // hold at the attack peak
            release: 0x3000,
        },
    );

    // Voice 1: same loop a fifth up (1.5x rate), panned right, faster attack.
    program_voice(
        &mut chip,
        1,
        VoiceSetup {
            start: TONE_BASE,
            end: TONE_BASE + TONE_LEN - 1,
            loop_offset: TONE_LEN,
            freq: 0x5800, // 1.5 words per tick
            pan: 0x0010,  // L attenuation 0x10, R attenuation 0x00
            volume: 0x0008,
            attack: 0x2000,
            decay: 0x0080,
            release: 0x3000,
        },
    );

    chip.write(0x01, 0x60); // key on voice 0
    chip.write(0x01, 0x61); // key on voice 1

    // Two seconds keyed on, then release, then one second of tail.
    let held = sample_rate as usize * 2;
    let tail = sample_rate as usize;
    let mut left = vec![0.0f32; held + tail];
    let mut right = vec![0.0f32; held + tail];

    chip.render(&mut left[..held], &mut right[..held]);
    chip.write(0x01, 0x40); // key off voice 0
    chip.write(0x01, 0x41); // key off voice 1
    chip.render(&mut left[held..], &mut right[held..]);

    write_wav(OUTPUT_PATH, &left, &right, sample_rate)
        .with_context(|| format!("writing {OUTPUT_PATH}"))?;

    println!(
        "Rendered {:.1}s at {} Hz to {}",
        (held + tail) as f32 / sample_rate as f32,
        sample_rate,
        OUTPUT_PATH
    );
    Ok(())
}

/// Register values for one voice.
struct VoiceSetup {
    start: u32,
    end: u32,
    loop_offset: u32,
    freq: u16,
    pan: u16,
    volume: u16,
    attack: u16,
    decay: u16,
    release: u16,
}

/// Program one voice entirely through the register window.
fn program_voice<M: SampleMemory>(chip: &mut Rf5c400<M>, voice: u16, setup: VoiceSetup) {
    let base = 0x400 | (voice << 5);
    chip.write(base, ((setup.start >> 8) & 0xFF00) as u16);
    chip.write(base | 0x01, (setup.start & 0xFFFF) as u16);
    chip.write(base | 0x02, setup.freq);
    chip.write(base | 0x03, (setup.end & 0xFFFF) as u16);
    chip.write(
        base | 0x04,
        (((setup.end >> 16) & 0xFF) | ((setup.loop_offset >> 8) & 0xFF00)) as u16,
    );
    chip.write(base | 0x05, (setup.loop_offset & 0xFFFF) as u16);
    chip.write(base | 0x06, setup.pan);
    chip.write(base | 0x08, setup.volume);
    chip.write(base | 0x09, setup.attack);
    chip.write(base | 0x0C, setup.decay);
    chip.write(base | 0x0E, setup.release);
}

/// One cycle of a sine wave in the chip's complement sample encoding
/// (negative values store their low 15 bits inverted).
fn sine_words(len: usize) -> Vec<u16> {
    (0..len)
        .map(|i| {
            let level = ((TAU * i as f64 / len as f64).sin() * 12_000.0) as i16;
            if level < 0 {
                (level as u16) ^ 0x7FFF
            } else {
                level as u16
            }
        })
        .collect()
}
