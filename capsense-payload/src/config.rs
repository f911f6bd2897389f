//! Link parameters fixed at build time. Values are picked up from
//! `cfg.toml` in the crate root, falling back to the defaults below.

use crate::text::fixed_text;

/// nRF24 addresses are 5 bytes
pub const ADDRESS_LEN: usize = 5;

pub type RadioAddress = [u8; ADDRESS_LEN];

#[toml_cfg::toml_config]
pub struct LinkConfig {
    #[default("1Node")]
    master_address: &'static str,
    #[default("2Node")]
    node_address: &'static str,
    #[default(1)]
    ack_pipe: u8,
    #[default(76)]
    channel: u8,
}

/// Address the station listens on; the node transmits to it
pub fn master_address() -> RadioAddress {
    fixed_text(LINK_CONFIG.master_address)
}

/// Address of the sensor node's own radio
pub fn node_address() -> RadioAddress {
    fixed_text(LINK_CONFIG.node_address)
}

/// Reading pipe whose ACKs carry the station's payload
pub fn ack_pipe() -> u8 {
    LINK_CONFIG.ack_pipe
}

pub fn channel() -> u8 {
    LINK_CONFIG.channel
}
