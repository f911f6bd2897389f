//! The `capsense-station` crate is the base station side of the
//! capsense soil-moisture network, and runs on the RPI. It owns the
//! receiving radio, and on every received reading it:
//! 1. Reads the raw payload bytes and decodes them field by field
//!    into a [`SensorPayload`] using the schema shared with the node
//!    (see [`capsense_payload::schema`])
//! 2. Reloads the ACK payload that the radio sends back with the
//!    acknowledgement of the next reading, carrying any queued
//!    [`Command`] to the node exactly once
//! 3. Appends the reading to a plain text log, at most once per log
//!    interval
//!
//! All of this state lives in a [`Station`] value owned by the caller;
//! the radio itself sits behind the [`Radio`] trait.
//!
//! # Examples
//! ```no_run
//! use capsense_station::{link::UdpRadio, Station, StationSettings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = StationSettings::from_build_config()?;
//!     let radio = UdpRadio::new(settings.bind_addr);
//!     let station = Station::setup(radio, settings, chrono::Local::now())?;
//!     let received = station
//!         .run(async {
//!             tokio::signal::ctrl_c().await.ok();
//!         })
//!         .await?;
//!     println!("received {received} readings");
//!     Ok(())
//! }
//! ```

pub mod console;
pub mod link;
mod logbook;
mod radio;
mod settings;
mod station;

pub use capsense_payload::{AckPayload, Command, SensorPayload};
pub use logbook::{LogError, LogSchedule, ReadingLog};
pub use radio::{PaLevel, Radio, RadioError};
pub use settings::StationSettings;
pub use station::{run_station, Exit, Station};

use capsense_payload::PayloadError;
use thiserror::Error;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Error, Debug)]
pub enum StationError {
    #[error("radio hardware is not responding")]
    HardwareNotResponding,
    #[error("Radio Error")]
    Radio(#[from] RadioError),
    #[error("Reading log Error")]
    Log(#[from] LogError),
    #[error("Payload Error")]
    Payload(#[from] PayloadError),
    #[error("Config Error {0}")]
    Config(String),
}

pub type StationResult<T> = Result<T, StationError>;
