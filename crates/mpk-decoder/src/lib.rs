#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod error;
pub mod outcome;
pub mod reader;
pub mod view;

mod blob;
mod scalar;

pub use arena::ScratchArena;
pub use config::ReaderConfig;
pub use error::DecodeError;
pub use mpk_wire::{Family, Marker};
pub use outcome::{Next, Outcome};
pub use reader::{MsgPackReader, Value};
pub use view::BlobView;
