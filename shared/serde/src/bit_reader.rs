use crate::SerdeErr;

/// Reads bits back in the order a [`BitWriter`](crate::BitWriter) wrote them.
pub struct BitReader<'b> {
    buffer: &'b [u8],
    byte_index: usize,
    bit_index: u8,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            byte_index: 0,
            bit_index: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        let Some(byte) = self.buffer.get(self.byte_index) else {
            return Err(SerdeErr::EndOfBuffer {
                bits_read: self.bits_read(),
            });
        };

        let bit = (byte >> self.bit_index) & 1 != 0;

        self.bit_index += 1;
        if self.bit_index >= 8 {
            self.bit_index = 0;
            self.byte_index += 1;
        }

        Ok(bit)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut output: u8 = 0;
        for index in 0..8 {
            if self.read_bit()? {
                output |= 1 << index;
            }
        }
        Ok(output)
    }

    pub fn bits_read(&self) -> u32 {
        (self.byte_index as u32) * 8 + self.bit_index as u32
    }

    /// Whole bytes left after the current position, not counting a partially
    /// consumed byte.
    pub fn bytes_remaining(&self) -> usize {
        let consumed = self.byte_index + usize::from(self.bit_index > 0);
        self.buffer.len().saturating_sub(consumed)
    }
}
