use thiserror::Error;

/// Errors raised while decoding bit-packed data. Every variant means the
/// buffer was truncated or produced by a different protocol revision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The reader ran past the end of its buffer
    #[error("Unexpected end of buffer after reading {bits_read} bits")]
    EndOfBuffer { bits_read: u32 },

    /// A tag value did not map onto any variant of the target enum
    #[error("Invalid tag {tag} while decoding {type_name}")]
    InvalidTag { type_name: &'static str, tag: u64 },

    /// A variable-length integer did not fit the target type
    #[error("Integer value {value} does not fit in {type_name}")]
    IntegerOverflow { type_name: &'static str, value: u64 },

    /// A decoded string was not valid UTF-8
    #[error("String of {length} bytes is not valid UTF-8")]
    InvalidUtf8 { length: usize },

    /// A length prefix claimed more data than the buffer holds
    #[error("Length prefix {length} exceeds the {remaining} bytes remaining")]
    LengthExceedsBuffer { length: u64, remaining: usize },
}
