use crate::error::{FrameError, Result};

/// Length prefix: one big-endian `u32`.
pub const PREFIX_SIZE: usize = 4;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Encode a payload length into the wire prefix.
///
/// Wire format:
/// ```text
/// ┌────────────────────┬──────────────────────┐
/// │ Length (4B BE)     │ Payload              │
/// │ network byte order │ (Length bytes)       │
/// └────────────────────┴──────────────────────┘
/// ```
pub fn encode_prefix(len: usize) -> Result<[u8; PREFIX_SIZE]> {
    let len = u32::try_from(len).map_err(|_| FrameError::PayloadTooLarge {
        size: len,
        max: u32::MAX as usize,
    })?;
    Ok(len.to_be_bytes())
}

/// Decode a complete wire prefix into the declared payload length.
pub fn decode_prefix(prefix: [u8; PREFIX_SIZE]) -> u32 {
    u32::from_be_bytes(prefix)
}

/// Configuration for message framing.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes, enforced on send and on receive.
    /// Default: 16 MiB. `u32::MAX as usize` lifts the cap entirely.
    pub max_payload_size: usize,
}

impl FrameConfig {
    /// Configuration that accepts any length the prefix can express.
    pub fn unbounded() -> Self {
        Self {
            max_payload_size: u32::MAX as usize,
        }
    }

    /// Reject `size` if it exceeds the configured cap.
    pub fn check_payload_size(&self, size: usize) -> Result<()> {
        if size > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: self.max_payload_size,
            });
        }
        Ok(())
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_big_endian() {
        assert_eq!(encode_prefix(0).unwrap(), [0, 0, 0, 0]);
        assert_eq!(encode_prefix(300_000).unwrap(), [0x00, 0x04, 0x93, 0xE0]);
        assert_eq!(encode_prefix(u32::MAX as usize).unwrap(), [0xFF; 4]);
    }

    #[test]
    fn decode_matches_encode() {
        assert_eq!(decode_prefix([0x00, 0x00, 0x01, 0x00]), 256);
        assert_eq!(decode_prefix(encode_prefix(1234).unwrap()), 1234);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn prefix_rejects_lengths_beyond_u32() {
        let result = encode_prefix(u32::MAX as usize + 1);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn default_config_caps_at_16_mib() {
        let config = FrameConfig::default();
        assert_eq!(config.max_payload_size, DEFAULT_MAX_PAYLOAD);
        assert!(config.check_payload_size(DEFAULT_MAX_PAYLOAD).is_ok());
        assert!(matches!(
            config.check_payload_size(DEFAULT_MAX_PAYLOAD + 1),
            Err(FrameError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn unbounded_config_accepts_any_prefix_value() {
        let config = FrameConfig::unbounded();
        assert!(config.check_payload_size(u32::MAX as usize).is_ok());
    }
}
