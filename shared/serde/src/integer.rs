use crate::{bit_reader::BitReader, bit_writer::BitWrite, error::SerdeErr, serde::Serde};

/// Unsigned integer written as a chain of `BITS`-wide chunks, each preceded
/// by a continuation bit. Small values (lengths, counts, most node ids)
/// cost `BITS + 1` bits instead of a full machine word.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct UnsignedVariableInteger<const BITS: u8> {
    value: u64,
}

impl<const BITS: u8> UnsignedVariableInteger<BITS> {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn get(&self) -> u64 {
        self.value
    }

    pub fn to_usize(&self) -> Result<usize, SerdeErr> {
        usize::try_from(self.value).map_err(|_| SerdeErr::IntegerOverflow {
            type_name: "usize",
            value: self.value,
        })
    }

    pub fn to_u16(&self) -> Result<u16, SerdeErr> {
        u16::try_from(self.value).map_err(|_| SerdeErr::IntegerOverflow {
            type_name: "u16",
            value: self.value,
        })
    }
}

impl<const BITS: u8> Serde for UnsignedVariableInteger<BITS> {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let chunk_limit = 1u128 << BITS;
        let mut value = u128::from(self.value);

        loop {
            let proceed = value >= chunk_limit;
            writer.write_bit(proceed);
            for _ in 0..BITS {
                writer.write_bit(value & 1 != 0);
                value >>= 1;
            }
            if !proceed {
                return;
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut output: u128 = 0;
        let mut shift: u32 = 0;

        loop {
            let proceed = reader.read_bit()?;

            for _ in 0..BITS {
                if reader.read_bit()? {
                    if shift >= 64 {
                        return Err(SerdeErr::IntegerOverflow {
                            type_name: "u64",
                            value: u64::MAX,
                        });
                    }
                    output |= 1u128 << shift;
                }
                shift += 1;
            }

            if !proceed {
                break;
            }
        }

        let value = u64::try_from(output).map_err(|_| SerdeErr::IntegerOverflow {
            type_name: "u64",
            value: u64::MAX,
        })?;
        Ok(Self { value })
    }

    fn bit_length(&self) -> u32 {
        let chunk_limit = 1u128 << BITS;
        let mut value = u128::from(self.value);
        let mut output: u32 = 0;

        loop {
            output += 1 + BITS as u32;
            if value < chunk_limit {
                break;
            }
            value >>= BITS;
        }
        output
    }
}
