use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    Lz4,      // Fast compression (~500 MB/s), ratio 2-3x
}

impl CompressionType {
    pub fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Lz4),
            other => Err(Error::Corrupt(format!("unknown compression flag {}", other))),
        }
    }

    pub fn flag(self) -> u8 {
        match self {
            CompressionType::None => 0,
            CompressionType::Lz4 => 1,
        }
    }
}

pub fn compress(data: &[u8], compression: CompressionType) -> Vec<u8> {
    match compression {
        CompressionType::None => data.to_vec(),
        CompressionType::Lz4 => lz4_flex::compress_prepend_size(data),
    }
}

pub fn decompress(data: &[u8], compression: CompressionType) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Lz4 => lz4_flex::decompress_size_prepended(data)
            .map_err(|e| Error::Corrupt(format!("lz4: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lz4_shrinks_repetitive_data() {
        let data = "lorem ipsum ".repeat(200).into_bytes();
        let packed = compress(&data, CompressionType::Lz4);
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed, CompressionType::Lz4).unwrap(), data);
    }

    #[test]
    fn test_garbage_is_corrupt() {
        assert!(decompress(&[4, 0, 0, 0, 0xff], CompressionType::Lz4).is_err());
        assert!(CompressionType::from_flag(9).is_err());
    }
}
