//! RC timing capacitance measurement for the sensor node.
//!
//! The sensing capacitor sits between a charge pin and an analog
//! input; the stray capacitance of the input to ground forms the other
//! half of a capacitive divider. Driving the charge pin high and
//! sampling the input right away gives
//!
//! ```text
//! C = val * C_stray / (MAX_ADC_VALUE - val)
//! ```
//!
//! A reading is the average of [`NUM_READINGS_TO_AVERAGE`] samples
//! taken at least [`INTER_MEASUREMENT_DELAY_MS`] apart. [`CapSensor`]
//! never blocks: the node's main loop calls
//! [`CapSensor::reading_available`] on every pass and the sensor takes
//! at most one sample per call.

use embedded_hal::digital::OutputPin;

use crate::SensorError;

/// Stray capacitance of the analog input to ground, in pF. Adjust to
/// calibrate.
pub const IN_STRAY_CAP_TO_GND: f32 = 24.48;
/// 10 bit ADC on the ATtiny84
pub const MAX_ADC_VALUE: u16 = 1023;
pub const NUM_READINGS_TO_AVERAGE: u8 = 10;
pub const INTER_MEASUREMENT_DELAY_MS: u32 = 300;
pub const CAPACITANCE_UNITS: &str = "pF";

/// Capacitance in pF for a raw ADC sample, `None` once the ADC
/// saturates
pub fn capacitance_from_adc(val: u16) -> Option<f32> {
    if val >= MAX_ADC_VALUE {
        return None;
    }
    Some(val as f32 * IN_STRAY_CAP_TO_GND / (MAX_ADC_VALUE - val) as f32)
}

/// embedded-hal 1.0 has no ADC trait; the node firmware implements
/// this for its analog input
pub trait AdcRead {
    fn read_adc(&mut self) -> Result<u16, SensorError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Average over the accepted samples, in pF
    pub capacitance: f32,
    /// Milliseconds from the start of the series to the last sample
    pub elapsed_ms: u32,
    /// Samples dropped because the ADC saturated
    pub rejected: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Sampling,
    Available,
}

pub struct CapSensor<P, A> {
    charge_pin: P,
    adc: A,
    phase: Phase,
    readings_remain: u8,
    accumulator: f32,
    rejected: u8,
    started_ms: u32,
    next_measure_ms: u32,
    last: Option<Measurement>,
}

// millis() rolls over after ~49 days
fn deadline_reached(now_ms: u32, deadline_ms: u32) -> bool {
    now_ms.wrapping_sub(deadline_ms) < u32::MAX / 2
}

impl<P: OutputPin, A: AdcRead> CapSensor<P, A> {
    pub fn new(charge_pin: P, adc: A) -> Self {
        Self {
            charge_pin,
            adc,
            phase: Phase::Idle,
            readings_remain: 0,
            accumulator: 0.0,
            rejected: 0,
            started_ms: 0,
            next_measure_ms: 0,
            last: None,
        }
    }

    /// Leave the capacitor discharged
    pub fn setup(&mut self) -> Result<(), SensorError> {
        self.charge_pin
            .set_low()
            .map_err(|_| SensorError::PinError)
    }

    /// Start a new averaged series; any previous result is dropped
    pub fn initiate_reading(&mut self, now_ms: u32) {
        self.phase = Phase::Sampling;
        self.readings_remain = NUM_READINGS_TO_AVERAGE;
        self.accumulator = 0.0;
        self.rejected = 0;
        self.started_ms = now_ms;
        self.next_measure_ms = now_ms;
        self.last = None;
    }

    /// Advance an ongoing series by at most one sample. Returns true
    /// once a finished [`Measurement`] is available.
    pub fn reading_available(&mut self, now_ms: u32) -> Result<bool, SensorError> {
        match self.phase {
            Phase::Idle => Ok(false),
            Phase::Available => Ok(true),
            Phase::Sampling => {
                if !deadline_reached(now_ms, self.next_measure_ms) {
                    return Ok(false);
                }

                let val = self.pulse_and_read().map_err(|e| {
                    self.phase = Phase::Idle;
                    e
                })?;

                match capacitance_from_adc(val) {
                    Some(c) => self.accumulator += c,
                    None => {
                        log::warn!("ADC saturated at {val}, dropping sample");
                        self.rejected += 1;
                    }
                }
                self.readings_remain -= 1;
                self.next_measure_ms = now_ms.wrapping_add(INTER_MEASUREMENT_DELAY_MS);

                if self.readings_remain > 0 {
                    return Ok(false);
                }

                let accepted = NUM_READINGS_TO_AVERAGE - self.rejected;
                if accepted == 0 {
                    self.phase = Phase::Idle;
                    return Err(SensorError::Saturated);
                }

                self.last = Some(Measurement {
                    capacitance: self.accumulator / accepted as f32,
                    elapsed_ms: now_ms.wrapping_sub(self.started_ms),
                    rejected: self.rejected,
                });
                self.phase = Phase::Available;
                Ok(true)
            }
        }
    }

    pub fn measurement(&self) -> Option<Measurement> {
        self.last
    }

    /// Give back the pin and ADC
    pub fn release(self) -> (P, A) {
        (self.charge_pin, self.adc)
    }

    fn pulse_and_read(&mut self) -> Result<u16, SensorError> {
        self.charge_pin
            .set_high()
            .map_err(|_| SensorError::PinError)?;
        let val = self.adc.read_adc();
        // always discharge, even if the read failed
        self.charge_pin
            .set_low()
            .map_err(|_| SensorError::PinError)?;
        val
    }
}
