use std::{net::SocketAddr, path::PathBuf, time::Duration};

use capsense_payload::config::{self as link, RadioAddress};

use crate::{StationError, StationResult};

/// Station parameters fixed at build time from `cfg.toml`
#[toml_cfg::toml_config]
pub struct StationConfig {
    #[default("/home/readings.txt")]
    log_path: &'static str,
    #[default(3600)]
    log_interval_secs: u64,
    #[default(10)]
    poll_interval_millis: u64,
    #[default("0.0.0.0:4824")]
    bind_addr: &'static str,
    #[default("./logs")]
    trace_dir: &'static str,
}

/// Runtime view of the station configuration
#[derive(Debug, Clone)]
pub struct StationSettings {
    /// Plain text reading log
    pub log_path: PathBuf,
    /// Minimum time between two logged readings
    pub log_interval: Duration,
    /// Pause between radio polls
    pub poll_interval: Duration,
    /// Where the UDP link listens
    pub bind_addr: SocketAddr,
    /// Directory for the rolling diagnostic trace files
    pub trace_dir: PathBuf,
    pub master_address: RadioAddress,
    pub node_address: RadioAddress,
    pub ack_pipe: u8,
}

impl StationSettings {
    pub fn from_build_config() -> StationResult<Self> {
        let bind_addr = STATION_CONFIG.bind_addr.parse().map_err(|e| {
            StationError::Config(format!(
                "bad bind_addr {:?}: {e:}",
                STATION_CONFIG.bind_addr
            ))
        })?;

        if STATION_CONFIG.poll_interval_millis == 0 {
            return Err(StationError::Config(
                "poll_interval_millis must be non-zero".to_string(),
            ));
        }

        Ok(Self {
            log_path: PathBuf::from(STATION_CONFIG.log_path),
            log_interval: Duration::from_secs(STATION_CONFIG.log_interval_secs),
            poll_interval: Duration::from_millis(STATION_CONFIG.poll_interval_millis),
            bind_addr,
            trace_dir: PathBuf::from(STATION_CONFIG.trace_dir),
            master_address: link::master_address(),
            node_address: link::node_address(),
            ack_pipe: link::ack_pipe(),
        })
    }
}
