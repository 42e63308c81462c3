#![warn(clippy::pedantic)]

pub mod error;
pub mod marker;
pub mod width;

pub use error::WireError;
pub use marker::{Family, Marker};
pub use width::{Signedness, Width};
