use std::future::Future;

use capsense_payload::{AckPayload, SensorPayload, MAX_PAYLOAD_LEN, SENSOR_PAYLOAD_LEN};
use chrono::{DateTime, Local};
use tokio::time::MissedTickBehavior;

use crate::{
    logbook::{LogSchedule, ReadingLog},
    radio::{PaLevel, Radio},
    StationError, StationResult, StationSettings,
};

/// How [`run_station`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The radio failed to start; the receive loop never ran
    HardwareNotResponding,
    /// The shutdown signal fired after `received` readings
    Shutdown { received: u64 },
}

/// [`Station`] is the receiving end of the link. It owns the radio
/// and everything the receive loop touches: the raw receive buffer,
/// the last decoded reading, the command queued for the next ACK,
/// and the reading log with its schedule.
pub struct Station<R: Radio> {
    radio: R,
    settings: StationSettings,
    rx_bytes: [u8; MAX_PAYLOAD_LEN],
    last_payload: Option<SensorPayload>,
    queued: Option<AckPayload>,
    schedule: LogSchedule,
    log: ReadingLog,
    received: u64,
}

impl<R: Radio> Station<R> {
    /// Bring the radio up and start listening. A radio that fails to
    /// start yields [`StationError::HardwareNotResponding`].
    pub fn setup(
        mut radio: R,
        settings: StationSettings,
        now: DateTime<Local>,
    ) -> StationResult<Self> {
        radio.begin().map_err(|e| {
            log::error!("radio hardware is not responding!! {e:}");
            StationError::HardwareNotResponding
        })?;

        // ACK payloads are dynamically sized
        radio.enable_dynamic_payloads()?;
        radio.enable_ack_payload()?;
        // nodes sit close by; keep power draw down
        radio.set_pa_level(PaLevel::Low)?;

        radio.open_writing_pipe(settings.node_address)?;
        radio.open_reading_pipe(settings.ack_pipe, settings.master_address)?;

        // the first reading gets an empty ACK
        radio.write_ack_payload(settings.ack_pipe, &AckPayload::none().to_bytes())?;
        radio.start_listening()?;

        log::info!("Radio configured\n{}", radio.details());

        let schedule = LogSchedule::new(settings.log_interval, now);
        let log = ReadingLog::new(settings.log_path.clone());

        Ok(Self {
            radio,
            settings,
            rx_bytes: [0u8; MAX_PAYLOAD_LEN],
            last_payload: None,
            queued: None,
            schedule,
            log,
            received: 0,
        })
    }

    pub fn radio_details(&self) -> String {
        self.radio.details()
    }

    pub fn last_payload(&self) -> Option<&SensorPayload> {
        self.last_payload.as_ref()
    }

    pub fn received(&self) -> u64 {
        self.received
    }

    /// Queue a command for the node. It rides on the ACK payload
    /// loaded after the next reading, so the node sees it one reading
    /// later, and it is sent only once.
    pub fn queue_command(&mut self, ack: AckPayload) -> StationResult<()> {
        let command = ack.command()?;
        log::info!("Queued {command:?} for the node");
        self.queued = Some(ack);
        Ok(())
    }

    /// One pass of the receive loop. Returns the decoded reading when
    /// a payload was waiting.
    pub fn poll(&mut self, now: DateTime<Local>) -> StationResult<Option<SensorPayload>> {
        let Some(pipe) = self.radio.available()? else {
            return Ok(None);
        };

        let size = self.radio.dynamic_payload_size()?;
        // clear leftovers from a longer previous payload
        self.rx_bytes.fill(0);
        let len = self.radio.read(&mut self.rx_bytes)?;
        log::trace!(
            "pipe {pipe} received {len} bytes: {}",
            hex::encode(&self.rx_bytes[..len])
        );

        if size < SENSOR_PAYLOAD_LEN {
            log::warn!(
                "Short payload on pipe {pipe}: {size} of {SENSOR_PAYLOAD_LEN} bytes, \
                 trailing fields read as zero"
            );
        }

        let payload = SensorPayload::decode(&self.rx_bytes[..len]).record;
        self.received += 1;
        log::debug!(
            "Reading {}: capacitance {} {} sensorTime {} ms ctSuccess {} ctErrors {} status {:?}",
            self.received,
            payload.capacitance,
            payload.units_str(),
            payload.sensor_time,
            payload.ct_success,
            payload.ct_errors,
            payload.status_str(),
        );

        self.last_payload = Some(payload);

        if self.schedule.due(now) {
            if let Err(e) = self.log.append(&payload, now) {
                log::error!("Error logging reading, skipping: {e:?}");
            }
            self.schedule.mark(now);
        }

        // a queued command stays queued until its ACK is actually loaded
        let ack = self.queued.unwrap_or_default();
        match self
            .radio
            .write_ack_payload(self.settings.ack_pipe, &ack.to_bytes())
        {
            Ok(()) => self.queued = None,
            Err(e) => log::error!("Unable to reload ACK payload, retrying next reading: {e:}"),
        }

        Ok(Some(payload))
    }

    /// Poll the radio every `poll_interval` until `shutdown`
    /// resolves, then leave the radio idle. Radio errors inside the
    /// loop are logged and the loop carries on. Returns the number of
    /// readings received.
    pub async fn run<F: Future<Output = ()>>(mut self, shutdown: F) -> StationResult<u64> {
        let mut tick = tokio::time::interval(self.settings.poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    log::info!("Shutdown requested");
                    break;
                }
                _ = tick.tick() => {
                    // drain everything that arrived since the last tick
                    loop {
                        match self.poll(Local::now()) {
                            Ok(Some(_)) => continue,
                            Ok(None) => break,
                            Err(e) => {
                                log::error!("Error polling radio {e:}");
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.shutdown()?;
        Ok(self.received)
    }

    /// Stop receiving. The radio idles in TX mode, its lowest power
    /// state short of powering down.
    pub fn shutdown(&mut self) -> StationResult<()> {
        self.radio.stop_listening()?;
        Ok(())
    }
}

/// Set up a [`Station`] on `radio` and run it until `shutdown`. If the
/// radio does not come up, returns [`Exit::HardwareNotResponding`]
/// without entering the receive loop.
pub async fn run_station<R: Radio, F: Future<Output = ()>>(
    radio: R,
    settings: StationSettings,
    shutdown: F,
) -> StationResult<Exit> {
    let station = match Station::setup(radio, settings, Local::now()) {
        Ok(station) => station,
        Err(StationError::HardwareNotResponding) => return Ok(Exit::HardwareNotResponding),
        Err(e) => return Err(e),
    };

    let received = station.run(shutdown).await?;
    Ok(Exit::Shutdown { received })
}
