//! Base64 framing for PCM16 audio payloads.
//!
//! Audio crosses the wire as base64 text inside the JSON envelope; the
//! samples themselves are 16-bit signed little-endian PCM.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes little-endian PCM16 samples into a base64 payload.
pub fn encode_pcm16(samples: &[i16]) -> String {
    let bytes: Vec<u8> = samples.iter().flat_map(|&sample| sample.to_le_bytes()).collect();
    STANDARD.encode(&bytes)
}

/// Decodes a base64 payload back into PCM16 samples.
///
/// A trailing incomplete sample (odd byte count) is dropped rather than
/// treated as corruption; invalid base64 is an error.
pub fn decode_pcm16(payload: &str) -> Result<Vec<i16>, base64::DecodeError> {
    let bytes = STANDARD.decode(payload)?;
    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pcm16_known_values() {
        // 16384 = 0x4000 is [0x00, 0x40] in little endian
        let encoded = encode_pcm16(&[16384]);
        assert_eq!(encoded, STANDARD.encode([0x00u8, 0x40u8]));

        // Empty input encodes to an empty payload
        assert_eq!(encode_pcm16(&[]), "");
    }

    #[test]
    fn test_decode_pcm16_known_values() {
        // [16384, -32768] in little endian
        let payload = STANDARD.encode([0x00u8, 0x40u8, 0x00u8, 0x80u8]);
        let decoded = decode_pcm16(&payload).unwrap();
        assert_eq!(decoded, vec![16384, -32768]);

        // Empty payload decodes to no samples
        assert_eq!(decode_pcm16("").unwrap(), Vec::<i16>::new());
    }

    #[test]
    fn test_decode_pcm16_rejects_invalid_base64() {
        assert!(decode_pcm16("not_base64!").is_err());
    }

    #[test]
    fn test_decode_pcm16_drops_trailing_odd_byte() {
        // 3 bytes form exactly one complete sample
        let payload = STANDARD.encode([0x01u8, 0x00u8, 0xFFu8]);
        let decoded = decode_pcm16(&payload).unwrap();
        assert_eq!(decoded, vec![1]);

        // A single byte cannot form any sample
        let payload = STANDARD.encode([0x7Fu8]);
        assert!(decode_pcm16(&payload).unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_is_exact() {
        let original = vec![1000i16, -2000, 0, i16::MAX, i16::MIN, 1, -1];
        let decoded = decode_pcm16(&encode_pcm16(&original)).unwrap();
        assert_eq!(decoded, original);
    }
}
