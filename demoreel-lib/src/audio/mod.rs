//! Canonical in-memory audio representation.

mod buffer;

pub use buffer::SampleBuffer;
