//! Test fixtures: JPEG-looking payloads and canned classifications.

use safelens_core::{Likelihood, SafeSearchResult};

/// A JPEG-framed payload of exactly `len` bytes (SOI/APP0 header, EOI trailer).
///
/// `marker` fills the body so a fake classifier can tell uploads apart.
pub fn jpeg_bytes(len: usize, marker: u8) -> Vec<u8> {
    const HEADER: [u8; 20] = [
        0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
        0x01, 0x00, 0x01, 0x00, 0x00,
    ];
    const TRAILER: [u8; 2] = [0xFF, 0xD9];

    let len = len.max(HEADER.len() + TRAILER.len());
    let mut data = Vec::with_capacity(len);
    data.extend_from_slice(&HEADER);
    data.resize(len - TRAILER.len(), marker);
    data.extend_from_slice(&TRAILER);
    data
}

/// Byte the fake classifiers use to recognize an upload
pub fn marker_of(data: &[u8]) -> u8 {
    data.get(20).copied().unwrap_or_default()
}

/// adult UNLIKELY, violence VERY_UNLIKELY, racy POSSIBLE
pub fn mild_result() -> SafeSearchResult {
    SafeSearchResult {
        adult: Likelihood::Unlikely,
        violence: Likelihood::VeryUnlikely,
        racy: Likelihood::Possible,
        ..Default::default()
    }
}

pub fn violent_result() -> SafeSearchResult {
    SafeSearchResult {
        adult: Likelihood::VeryUnlikely,
        violence: Likelihood::VeryLikely,
        racy: Likelihood::Unlikely,
        ..Default::default()
    }
}
