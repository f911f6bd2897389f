//! Stand-in for a sensor node: samples a fake capacitive probe and
//! sends each averaged reading to a running station over the UDP link.
//!
//! `CAPSENSE_STATION` overrides the station address (default
//! 127.0.0.1:4824), `CAPSENSE_ROUNDS` bounds the number of readings and
//! `CAPSENSE_MAX_SLEEP_MS` caps the delay between them.

use std::{convert::Infallible, net::SocketAddr, time::Duration};

use capsense_payload::{
    config::{master_address, node_address},
    measure::{AdcRead, CapSensor},
    node::SensorNode,
    AckPayload, SensorError,
};
use capsense_station::{link::UdpRadio, Radio};
use embedded_hal::digital::{ErrorType, OutputPin};

const ACK_TIMEOUT: Duration = Duration::from_millis(200);

struct FakePin;

impl ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Slowly drying soil: the raw count creeps down and wraps back up
struct FakeAdc {
    val: u16,
}

impl AdcRead for FakeAdc {
    fn read_adc(&mut self) -> Result<u16, SensorError> {
        self.val = if self.val <= 600 { 900 } else { self.val - 1 };
        Ok(self.val)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let station: SocketAddr = env_or("CAPSENSE_STATION", "127.0.0.1:4824".parse()?);
    let rounds: u64 = env_or("CAPSENSE_ROUNDS", u64::MAX);
    let max_sleep_ms: u32 = env_or("CAPSENSE_MAX_SLEEP_MS", 5_000);

    let mut radio = UdpRadio::new("127.0.0.1:0".parse()?);
    radio.begin().map_err(|e| {
        log::error!("Unable to start node radio {e:}");
        e
    })?;
    // the node listens on its own address and transmits to the master
    radio.open_reading_pipe(1, node_address())?;
    radio.open_writing_pipe(master_address())?;

    let mut sensor = CapSensor::new(FakePin, FakeAdc { val: 900 });
    sensor.setup()?;
    let mut node = SensorNode::new();
    let boot = std::time::Instant::now();
    let now_ms = || boot.elapsed().as_millis() as u32;

    log::info!("Sending readings to {station}");

    for round in 0..rounds {
        sensor.initiate_reading(now_ms());
        let measurement = loop {
            match sensor.reading_available(now_ms()) {
                Ok(true) => break sensor.measurement(),
                Ok(false) => tokio::time::sleep(Duration::from_millis(50)).await,
                Err(e) => {
                    log::error!("Sensor error {e:?}, retrying");
                    break None;
                }
            }
        };
        let Some(measurement) = measurement else {
            continue;
        };

        let payload = node.build_payload(&measurement);
        let ack = radio.write(station, &payload.to_bytes(), ACK_TIMEOUT)?;
        node.record_tx(ack.is_some());

        let delay = match ack {
            Some(bytes) => {
                let ack = AckPayload::decode(&bytes).record;
                node.apply_ack(&ack).unwrap_or_else(|e| {
                    log::warn!("Ignoring bad ACK {e:?}");
                    node.report_interval_ms()
                })
            }
            None => node.report_interval_ms(),
        };

        log::info!(
            "round {round}: {:.2} {} ok={} err={} next in {delay} ms",
            payload.capacitance,
            payload.units_str(),
            node.ct_success(),
            node.ct_errors()
        );
        tokio::time::sleep(Duration::from_millis(delay.min(max_sleep_ms) as u64)).await;
    }

    Ok(())
}
