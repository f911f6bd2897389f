//! Runs a station and a node on localhost, sends a handful of
//! readings, and checks they all arrive and land in the reading log.

use std::time::Duration;

use capsense_payload::{
    config::{ack_pipe, master_address, node_address},
    text::fixed_text,
    AckPayload, Command, SensorPayload,
};
use capsense_station::{link::UdpRadio, Radio, Station, StationSettings};

const STATION_ADDR: &str = "127.0.0.1:48240";
const READINGS: u32 = 5;

fn send_readings() -> Result<Vec<Option<AckPayload>>, capsense_station::RadioError> {
    let mut node = UdpRadio::new("127.0.0.1:0".parse().expect("valid address"));
    node.begin()?;
    node.open_writing_pipe(master_address())?;

    let peer = STATION_ADDR.parse().expect("valid address");
    (0..READINGS)
        .map(|i| {
            let reading = SensorPayload {
                capacitance: 100.0 + i as f32,
                sensor_time: 2_700,
                ct_success: i,
                ct_errors: 0,
                units: fixed_text("pF"),
                status_text: fixed_text("OK"),
            };
            let ack = node.write(peer, &reading.to_bytes(), Duration::from_millis(500))?;
            Ok(ack.map(|b| AckPayload::decode(&b).record))
        })
        .collect()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let log_path = std::env::temp_dir().join("capsense-loopback.txt");
    let _ = std::fs::remove_file(&log_path);

    let settings = StationSettings {
        log_path: log_path.clone(),
        log_interval: Duration::ZERO,
        poll_interval: Duration::from_millis(5),
        bind_addr: STATION_ADDR.parse()?,
        trace_dir: std::env::temp_dir(),
        master_address: master_address(),
        node_address: node_address(),
        ack_pipe: ack_pipe(),
    };

    let mut station = Station::setup(UdpRadio::new(settings.bind_addr), settings, chrono::Local::now())?;
    station.queue_command(AckPayload::sleep_then_report(30_000))?;
    log::info!("Station up\n{}", station.radio_details());

    let (done_tx, done_rx) = tokio::sync::oneshot::channel();
    let node = tokio::task::spawn_blocking(move || {
        let res = send_readings();
        let _ = done_tx.send(());
        res
    });

    let received = station
        .run(async {
            let _ = done_rx.await;
            tokio::time::sleep(Duration::from_millis(50)).await;
        })
        .await?;
    let acks = node.await??;

    log::info!("station received {received} readings, node saw {acks:?}");
    assert_eq!(received, READINGS as u64);
    assert!(acks.iter().all(Option::is_some));
    // the preloaded empty ACK goes out first, the queued command second
    let commands = acks
        .iter()
        .flatten()
        .map(|a| a.command())
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(commands[0], Command::None);
    assert_eq!(commands[1], Command::SleepThenReport);
    assert!(commands[2..].iter().all(|c| *c == Command::None));

    let logged = std::fs::read_to_string(&log_path)?;
    assert!(logged.lines().count() >= 1);
    println!("loopback ok: {received} readings, log at {log_path:?}");
    Ok(())
}

