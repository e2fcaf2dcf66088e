use thiserror::Error;

/// Arithmetic failure on a financial quantity.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ArithError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivByZero,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonetaryError {
    #[error("{0}")]
    Arithmetic(#[from] ArithError),

    #[error("denomination {0} does not accept input")]
    InputNotAllowed(String),

    #[error("unknown denomination {name} for {asset}")]
    UnknownDenomination { asset: String, name: String },

    #[error("malformed amount: {0:?}")]
    Malformed(String),

    #[error("too many decimal places: {got} > {allowed}")]
    TooManyDecimals { got: usize, allowed: u32 },

    #[error("amount {0} is not representable in raw units")]
    NotRepresentable(String),
}
