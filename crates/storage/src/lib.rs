#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub mod json;
pub mod wire;

pub use json::{Collection, JsonStorage, JsonStorageError};
pub use wire::RawSets;
