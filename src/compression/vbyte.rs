use crate::core::error::{Error, Result};

/// Variable byte encoding for integers (best for small integers)
pub struct VByteEncoder;

impl VByteEncoder {
    /// Encode single u64 value
    /// Values < 128 use 1 byte, < 16384 use 2 bytes, etc.
    pub fn encode_u64(output: &mut Vec<u8>, mut value: u64) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);  // Set continuation bit
            value >>= 7;
        }
        output.push(value as u8);  // Last byte without continuation bit
    }

    pub fn encode_u32(output: &mut Vec<u8>, value: u32) {
        Self::encode_u64(output, value as u64)
    }

    /// Decode single u64 value, returns (value, bytes_consumed)
    pub fn decode_u64(input: &[u8]) -> Result<(u64, usize)> {
        let mut value = 0u64;
        let mut shift = 0;

        for (i, &byte) in input.iter().enumerate() {
            if shift > 63 || (shift == 63 && byte & 127 > 1) {
                return Err(Error::Corrupt("vbyte overflow".to_string()));
            }
            value |= ((byte & 127) as u64) << shift;

            if byte & 128 == 0 {  // No continuation bit
                return Ok((value, i + 1));
            }
            shift += 7;
        }

        Err(Error::Corrupt("incomplete vbyte".to_string()))
    }

    pub fn decode_u32(input: &[u8]) -> Result<(u32, usize)> {
        let (value, consumed) = Self::decode_u64(input)?;
        let value = u32::try_from(value)
            .map_err(|_| Error::Corrupt(format!("vbyte value {} exceeds u32", value)))?;
        Ok((value, consumed))
    }
}

/// Cursor over a vbyte-coded buffer
pub struct VByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        VByteReader { data, pos: 0 }
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let (value, consumed) = VByteEncoder::decode_u64(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let (value, consumed) = VByteEncoder::decode_u32(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }
}
