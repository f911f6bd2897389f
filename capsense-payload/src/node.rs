//! Reporting state kept by the sensor node between transmissions:
//! the success / error counters that ride along in every payload and
//! the reporting interval driven by station commands.

use crate::{
    ack::{AckPayload, Command},
    measure::{Measurement, CAPACITANCE_UNITS},
    payload::SensorPayload,
    text::fixed_text,
    PayloadError,
};

/// Time between readings when the station sends no command, 10 minutes
pub const DEFAULT_SLEEP_TIME_MS: u32 = 600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorNode {
    ct_success: u32,
    ct_errors: u32,
    report_interval_ms: u32,
}

impl Default for SensorNode {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorNode {
    pub fn new() -> Self {
        Self {
            ct_success: 0,
            ct_errors: 0,
            report_interval_ms: DEFAULT_SLEEP_TIME_MS,
        }
    }

    pub fn ct_success(&self) -> u32 {
        self.ct_success
    }

    pub fn ct_errors(&self) -> u32 {
        self.ct_errors
    }

    pub fn report_interval_ms(&self) -> u32 {
        self.report_interval_ms
    }

    /// Fill the next payload from a finished measurement and the
    /// counters as they stand
    pub fn build_payload(&self, measurement: &Measurement) -> SensorPayload {
        let status = if measurement.rejected == 0 {
            "OK"
        } else {
            "ADC SATURATE"
        };

        SensorPayload {
            capacitance: measurement.capacitance,
            sensor_time: measurement.elapsed_ms,
            ct_success: self.ct_success,
            ct_errors: self.ct_errors,
            units: fixed_text(CAPACITANCE_UNITS),
            status_text: fixed_text(status),
        }
    }

    /// Account for the outcome of one transmission attempt. The error
    /// count only covers failures since the last delivered payload.
    pub fn record_tx(&mut self, delivered: bool) {
        if delivered {
            self.ct_success = self.ct_success.wrapping_add(1);
            self.ct_errors = 0;
        } else {
            self.ct_errors = self.ct_errors.saturating_add(1);
            log::debug!("transmit failed, {} errors since last success", self.ct_errors);
        }
    }

    /// Act on the ACK payload returned with a delivered reading.
    /// Returns the delay in milliseconds before the next reading, which
    /// is also kept as the node's reporting interval.
    pub fn apply_ack(&mut self, ack: &AckPayload) -> Result<u32, PayloadError> {
        match ack.command()? {
            Command::None => {
                self.report_interval_ms = DEFAULT_SLEEP_TIME_MS;
                Ok(self.report_interval_ms)
            }
            Command::SleepThenReport => {
                log::debug!("station asked for a reading in {} ms", ack.uli_cmd_data);
                self.report_interval_ms = ack.uli_cmd_data;
                Ok(self.report_interval_ms)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(rejected: u8) -> Measurement {
        Measurement {
            capacitance: 212.5,
            elapsed_ms: 2_700,
            rejected,
        }
    }

    #[test]
    fn counters_follow_tx_outcomes() {
        let mut node = SensorNode::new();
        node.record_tx(false);
        node.record_tx(false);
        assert_eq!((node.ct_success(), node.ct_errors()), (0, 2));

        node.record_tx(true);
        assert_eq!((node.ct_success(), node.ct_errors()), (1, 0));

        node.record_tx(false);
        let payload = node.build_payload(&measurement(0));
        assert_eq!(payload.ct_success, 1);
        assert_eq!(payload.ct_errors, 1);
    }

    #[test]
    fn payload_carries_measurement() {
        let node = SensorNode::new();
        let payload = node.build_payload(&measurement(0));
        assert_eq!(payload.capacitance, 212.5);
        assert_eq!(payload.sensor_time, 2_700);
        assert_eq!(payload.units_str(), "pF");
        assert_eq!(payload.status_str(), "OK");

        let partial = node.build_payload(&measurement(3));
        assert_eq!(partial.status_str(), "ADC SATURATE");
    }

    #[test]
    fn ack_commands_set_next_delay() {
        let mut node = SensorNode::new();
        assert_eq!(
            node.apply_ack(&AckPayload::sleep_then_report(5_000)),
            Ok(5_000)
        );
        // the commanded interval sticks until the station stops asking
        assert_eq!(node.report_interval_ms(), 5_000);

        assert_eq!(node.apply_ack(&AckPayload::none()), Ok(DEFAULT_SLEEP_TIME_MS));
        assert_eq!(node.report_interval_ms(), DEFAULT_SLEEP_TIME_MS);

        let bogus = AckPayload {
            command: 0x7f,
            ..AckPayload::none()
        };
        node.apply_ack(&AckPayload::sleep_then_report(45_000)).unwrap();
        assert_eq!(
            node.apply_ack(&bogus),
            Err(PayloadError::UnknownCommand(0x7f))
        );
        assert_eq!(node.report_interval_ms(), 45_000);
    }
}
