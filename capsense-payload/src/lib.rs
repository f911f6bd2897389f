//! Shared lib for the capsense soil-moisture network: the wire
//! records exchanged between the sensor node and the base station,
//! plus the node-side measurement and reporting logic.
//!
//! Both ends of the radio link build against this crate, so the
//! byte layout of every record is declared exactly once (see
//! [`schema`]). The records are never overlaid on memory; each field
//! is copied in and out at its own offset, which keeps the layout
//! independent of how either compiler pads its structs.
//!
//! Two build configurations exist:
//!
//! 1. `no_std` builds, used by the sensor node firmware. The node
//! samples the sensing capacitor through [`measure::CapSensor`],
//! fills a [`SensorPayload`] via [`node::SensorNode`] and reacts to
//! the [`AckPayload`] piggybacked on the radio acknowledgement.
//! 2. `std` builds (feature `std`), used by the base station, which
//! adds `thiserror` based error types.
#![cfg_attr(not(any(feature = "std", test)), no_std)]

pub mod ack;
pub mod config;
pub mod measure;
pub mod node;
pub mod payload;
pub mod schema;
pub mod text;

pub use ack::{AckPayload, Command, ACK_PAYLOAD_LEN};
pub use payload::{SensorPayload, SENSOR_PAYLOAD_LEN};
pub use schema::{Decoded, WireRecord};

#[cfg(feature = "std")]
use thiserror::Error;

/// Largest payload the nRF24 radio carries in a single packet
pub const MAX_PAYLOAD_LEN: usize = 32;

#[cfg(feature = "std")]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Unknown ACK command {0}")]
    UnknownCommand(u8),
}

#[cfg(not(feature = "std"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    UnknownCommand(u8),
}

#[cfg(feature = "std")]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("ADC Read Error")]
    AdcReadError,
    #[error("Charge Pin Error")]
    PinError,
    #[error("Every sample saturated the ADC")]
    Saturated,
}

#[cfg(not(feature = "std"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    AdcReadError,
    PinError,
    Saturated,
}
