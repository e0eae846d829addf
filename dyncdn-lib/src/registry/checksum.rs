//! Stable checksum used to pin asset paths to pool members.
//!
//! This is plain CRC-32 (IEEE 802.3, reflected polynomial `0xEDB88320`).
//! It has no seed, so an asset keeps its CDN host across restarts and
//! across every process serving the same site.

const POLYNOMIAL: u32 = 0xEDB8_8320;

/// CRC-32 checksum of `data`
pub(crate) fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for byte in data {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            if crc & 1 == 0 {
                crc >>= 1;
            } else {
                crc = (crc >> 1) ^ POLYNOMIAL;
            }
        }
    }
    !crc
}

/// Index into a pool of `len` entries for the given key.
///
/// `len` must not be zero.
pub(crate) fn pool_index(key: &str, len: usize) -> usize {
    crc32(key.as_bytes()) as usize % len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn test_crc32_known_paths() {
        assert_eq!(crc32(b"file1.jpg"), 2_013_160_872);
        assert_eq!(crc32(b"file2.jpg"), 811_474_808);
    }

    #[test]
    fn test_pool_index() {
        assert_eq!(pool_index("file1.jpg", 3), 0);
        assert_eq!(pool_index("file2.jpg", 3), 2);
        assert_eq!(pool_index("anything", 1), 0);
    }
}
