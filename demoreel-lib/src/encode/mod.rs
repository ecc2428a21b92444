//! Container encoding for rendered reels.

mod wav;
mod writer;

use serde::Serialize;

pub use wav::encode_wav;
pub use writer::ByteWriter;

/// Container of an encoded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Wav,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Wav => "audio/wav",
        }
    }
}

/// Encoded bytes tagged with their real container format.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedAudio {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}
