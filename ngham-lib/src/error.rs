#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Reed-Solomon or field parameters outside their allowed ranges.
    #[error("invalid reed-solomon parameters: {0}")]
    InvalidParameters(String),
    /// The field generator polynomial does not generate the full multiplicative group.
    #[error("field polynomial {0:#x} is not primitive")]
    NonPrimitivePolynomial(u32),

    #[error("codeword length {actual} does not match expected {expected}")]
    CodewordLength { actual: usize, expected: usize },
    #[error("invalid erasures: {0}")]
    Erasures(String),

    #[error("payload length {actual} must be between 1 and {maximum}")]
    PayloadLength { actual: usize, maximum: usize },
    #[error("flags value {0} does not fit in 3 bits")]
    Flags(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
