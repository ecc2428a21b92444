//! Mastering-bus DSP: level conversions and the bus compressor.

pub mod compressor;
pub mod level;

pub use compressor::MasteringCompressor;
