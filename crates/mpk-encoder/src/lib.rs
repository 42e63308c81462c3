#![warn(clippy::pedantic)]

pub mod error;
pub mod writer;

pub use error::EncodeError;
pub use writer::MsgPackWriter;
