//! Single-producer single-consumer sample ring
//!
//! Fixed-capacity circular buffer of interleaved f32 samples. The render
//! loop is the producer, the audio callback the consumer. Storage sits
//! behind a `parking_lot` mutex; read/write positions are atomics so either
//! side can check fill levels without taking the lock.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Result, Rf5c400Error};

// 256 MB of f32 samples; anything above this is a configuration mistake.
const MAX_CAPACITY: usize = 256 * 1024 * 1024 / std::mem::size_of::<f32>();

/// Interleaved-sample ring buffer for one producer and one consumer.
#[derive(Debug)]
pub struct RingBuffer {
    storage: Mutex<Box<[f32]>>,
    /// Monotonic producer position; `& mask` gives the storage index.
    write_pos: AtomicUsize,
    /// Monotonic consumer position.
    read_pos: AtomicUsize,
    capacity: usize,
    mask: usize,
}

impl RingBuffer {
    /// Create a ring holding at least `capacity` samples, rounded up to a
    /// power of two.
    ///
    /// # Errors
    ///
    /// Returns [`Rf5c400Error::ConfigError`] for a zero capacity or one
    /// beyond the allocation bound.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Rf5c400Error::ConfigError(
                "ring capacity must be greater than 0".into(),
            ));
        }
        let capacity = capacity.next_power_of_two();
        if capacity > MAX_CAPACITY {
            return Err(Rf5c400Error::ConfigError(format!(
                "ring capacity {capacity} exceeds the {MAX_CAPACITY}-sample bound"
            )));
        }

        Ok(RingBuffer {
            storage: Mutex::new(vec![0.0; capacity].into_boxed_slice()),
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
            mask: capacity - 1,
            capacity,
        })
    }

    /// Ring capacity in samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples ready to be read.
    pub fn available_read(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Samples that can be written without overrunning the reader.
    pub fn available_write(&self) -> usize {
        self.capacity - self.available_read()
    }

    /// Ratio of buffered samples to capacity, 0.0 to 1.0.
    pub fn fill_ratio(&self) -> f32 {
        self.available_read() as f32 / self.capacity as f32
    }

    /// Write interleaved samples; returns how many were accepted.
    /// A full ring accepts 0 rather than blocking.
    pub fn write(&self, samples: &[f32]) -> usize {
        let mut storage = self.storage.lock();
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);

        let free = self.capacity - write.wrapping_sub(read);
        let count = samples.len().min(free);
        if count == 0 {
            return 0;
        }

        copy_into_ring(&mut storage, write & self.mask, &samples[..count]);
        drop(storage);

        self.write_pos
            .store(write.wrapping_add(count), Ordering::Release);
        count
    }

    /// Push one rendered stereo block as interleaved frames.
    ///
    /// Accepts only whole frames: returns the number of *frames* written,
    /// stopping early if the ring cannot hold another pair.
    pub fn write_frames(&self, left: &[f32], right: &[f32]) -> usize {
        let frames = left.len().min(right.len());
        let mut interleaved = Vec::with_capacity(frames * 2);
        for (&l, &r) in left.iter().zip(right.iter()).take(frames) {
            interleaved.push(l);
            interleaved.push(r);
        }
        // Never split a frame across the capacity check.
        let writable_frames = (self.available_write() / 2).min(frames);
        self.write(&interleaved[..writable_frames * 2]) / 2
    }

    /// Read interleaved samples into `dest`; returns how many were copied.
    /// An empty ring yields 0 (the audio callback fills the rest with
    /// silence).
    pub fn read(&self, dest: &mut [f32]) -> usize {
        let storage = self.storage.lock();
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Acquire);

        let buffered = write.wrapping_sub(read);
        let count = dest.len().min(buffered);
        if count == 0 {
            return 0;
        }

        copy_from_ring(&storage, read & self.mask, &mut dest[..count]);
        drop(storage);

        self.read_pos
            .store(read.wrapping_add(count), Ordering::Release);
        count
    }

    /// Discard everything buffered.
    pub fn clear(&self) {
        let write = self.write_pos.load(Ordering::Acquire);
        self.read_pos.store(write, Ordering::Release);
    }
}

/// Copy `src` into the ring starting at `index`, wrapping once if needed.
fn copy_into_ring(storage: &mut [f32], index: usize, src: &[f32]) {
    let tail = storage.len() - index;
    if src.len() <= tail {
        storage[index..index + src.len()].copy_from_slice(src);
    } else {
        storage[index..].copy_from_slice(&src[..tail]);
        storage[..src.len() - tail].copy_from_slice(&src[tail..]);
    }
}

/// Copy from the ring starting at `index` into `dest`, wrapping once if
/// needed.
fn copy_from_ring(storage: &[f32], index: usize, dest: &mut [f32]) {
    let tail = storage.len() - index;
    if dest.len() <= tail {
        dest.copy_from_slice(&storage[index..index + dest.len()]);
    } else {
        dest[..tail].copy_from_slice(&storage[index..]);
        let rest = dest.len() - tail;
        dest[tail..].copy_from_slice(&storage[..rest]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rounds_to_power_of_two() {
        let ring = RingBuffer::new(1000).unwrap();
        assert_eq!(ring.capacity(), 1024);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(RingBuffer::new(0).is_err());
    }

    #[test]
    fn test_oversized_capacity_rejected() {
        assert!(RingBuffer::new(MAX_CAPACITY + 1).is_err());
    }

    #[test]
    fn test_write_read_roundtrip() {
        let ring = RingBuffer::new(16).unwrap();
        let samples = [0.1, 0.2, 0.3, 0.4];
        assert_eq!(ring.write(&samples), 4);
        assert_eq!(ring.available_read(), 4);

        let mut dest = [0.0; 4];
        assert_eq!(ring.read(&mut dest), 4);
        assert_eq!(dest, samples);
        assert_eq!(ring.available_read(), 0);
    }

    #[test]
    fn test_wrap_around() {
        let ring = RingBuffer::new(8).unwrap();
        ring.write(&[1.0; 6]);
        let mut scratch = [0.0; 6];
        ring.read(&mut scratch);

        // Positions now sit near the end of storage; this write wraps.
        let samples = [9.0, 8.0, 7.0, 6.0, 5.0];
        assert_eq!(ring.write(&samples), 5);
        let mut dest = [0.0; 5];
        assert_eq!(ring.read(&mut dest), 5);
        assert_eq!(dest, samples);
    }

    #[test]
    fn test_full_ring_accepts_nothing() {
        let ring = RingBuffer::new(4).unwrap();
        assert_eq!(ring.write(&[1.0; 4]), 4);
        assert_eq!(ring.write(&[2.0]), 0);
        assert_eq!(ring.available_write(), 0);
    }

    #[test]
    fn test_write_frames_interleaves() {
        let ring = RingBuffer::new(8).unwrap();
        let left = [1.0, 2.0];
        let right = [-1.0, -2.0];
        assert_eq!(ring.write_frames(&left, &right), 2);

        let mut dest = [0.0; 4];
        assert_eq!(ring.read(&mut dest), 4);
        assert_eq!(dest, [1.0, -1.0, 2.0, -2.0]);
    }

    #[test]
    fn test_write_frames_never_splits_a_frame() {
        let ring = RingBuffer::new(4).unwrap();
        ring.write(&[0.0]);
        // Three samples free: only one whole frame fits.
        let frames = ring.write_frames(&[1.0, 2.0], &[3.0, 4.0]);
        assert_eq!(frames, 1);
        assert_eq!(ring.available_read(), 3);
    }

    #[test]
    fn test_clear() {
        let ring = RingBuffer::new(8).unwrap();
        ring.write(&[1.0; 5]);
        ring.clear();
        assert_eq!(ring.available_read(), 0);
        assert_eq!(ring.available_write(), 8);
    }
}
