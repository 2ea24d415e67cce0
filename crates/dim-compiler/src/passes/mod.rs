//! Analysis passes run over a method body before it is lowered.

mod volatility;

pub use volatility::volatile_locals;
