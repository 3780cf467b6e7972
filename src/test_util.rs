//! Helpers for building voxel input in tests

use crate::voxel::record::payload_len;

/// A single framed record with a recognizable payload
pub fn record_bytes(length_code: u8) -> Vec<u8> {
    let mut result = vec![length_code];
    result.extend((0..payload_len(length_code)).map(|i| length_code.wrapping_add(i as u8)));
    result
}

/// The concatenation of complete records for the given length codes
pub fn record_stream(length_codes: &[u8]) -> Vec<u8> {
    length_codes.iter()
        .flat_map(|&length_code| record_bytes(length_code))
        .collect()
}
