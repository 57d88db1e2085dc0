#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod activity;
mod error;
mod metric;
mod name;
mod personal_record;
mod progression;
mod record;
mod service;
mod session;
mod set;
mod settings;

pub use activity::*;
pub use error::*;
pub use metric::*;
pub use name::*;
pub use personal_record::*;
pub use progression::*;
pub use record::*;
pub use service::*;
pub use session::*;
pub use set::*;
pub use settings::*;
