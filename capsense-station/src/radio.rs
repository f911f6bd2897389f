use capsense_payload::config::RadioAddress;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadioError {
    #[error("I/O Error")]
    Io(#[from] std::io::Error),
    #[error("Radio not responding: {0}")]
    NotResponding(String),
    #[error("Radio not started")]
    NotStarted,
    #[error("Invalid pipe {0}")]
    InvalidPipe(u8),
    #[error("Payload of {0} bytes exceeds radio limit")]
    PayloadTooLarge(usize),
    #[error("ACK payload FIFO full on pipe {0}")]
    AckFifoFull(u8),
}

/// Power amplifier level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaLevel {
    Min,
    Low,
    High,
    #[default]
    Max,
}

/// Number of reading pipes on an nRF24
pub const NUM_PIPES: u8 = 6;

/// Trait to allow different implementations of the station's radio.
/// Mirrors the subset of the nRF24 driver the station uses; every
/// call is non-blocking.
pub trait Radio: Send {
    /// Bring the radio up. An error here means the hardware is not
    /// responding.
    fn begin(&mut self) -> Result<(), RadioError>;
    fn enable_dynamic_payloads(&mut self) -> Result<(), RadioError>;
    /// ACK packets carry no payload unless this is enabled
    fn enable_ack_payload(&mut self) -> Result<(), RadioError>;
    fn set_pa_level(&mut self, level: PaLevel) -> Result<(), RadioError>;
    fn open_writing_pipe(&mut self, address: RadioAddress) -> Result<(), RadioError>;
    fn open_reading_pipe(&mut self, pipe: u8, address: RadioAddress) -> Result<(), RadioError>;
    fn start_listening(&mut self) -> Result<(), RadioError>;
    fn stop_listening(&mut self) -> Result<(), RadioError>;
    /// Pipe number of a waiting payload, if any
    fn available(&mut self) -> Result<Option<u8>, RadioError>;
    /// Length of the waiting payload
    fn dynamic_payload_size(&mut self) -> Result<usize, RadioError>;
    /// Pop the waiting payload into `buf`, returning bytes copied
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, RadioError>;
    /// Queue `payload` to go out with the next ACK on `pipe`
    fn write_ack_payload(&mut self, pipe: u8, payload: &[u8]) -> Result<(), RadioError>;
    /// Human readable configuration dump
    fn details(&self) -> String;
}
