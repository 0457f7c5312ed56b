//! Talking to a Z-Wave controller over an async byte stream.

mod config;
mod controller;
mod error;
mod serial;

pub use config::Config;
pub use controller::Controller;
pub use error::Error;
pub use serial::{
    connect,
    SerialController,
    DEFAULT_BAUD,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
