use capsense_station::{
    console::{file_and_console, startup_banner},
    link::UdpRadio,
    StationError, StationResult, StationSettings, Station,
};
use tracing_appender::rolling;
use tracing_subscriber::FmtSubscriber;

use tracing_log::LogTracer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> StationResult<()> {
    LogTracer::init().expect("Unable to set up log tracer");

    let settings = StationSettings::from_build_config()?;

    let log = rolling::daily(&settings.trace_dir, "station");
    let (nb, _guard) = tracing_appender::non_blocking(log);

    let sub = FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(file_and_console(nb, std::io::stderr))
        .finish();

    tracing::subscriber::set_global_default(sub).expect("Unable to set up tracing subscriber");

    let argv0 = std::env::args()
        .next()
        .unwrap_or_else(|| "capsense-station".to_string());

    let radio = UdpRadio::new(settings.bind_addr);
    log::info!(
        "Listening on {} logging to {:?}",
        settings.bind_addr,
        settings.log_path
    );

    let station = match Station::setup(radio, settings, chrono::Local::now()) {
        Ok(station) => station,
        Err(StationError::HardwareNotResponding) => {
            println!("radio hardware is not responding!!");
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    println!("{}", startup_banner(&argv0, &station.radio_details()));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for ctrl-c {e:}");
            std::future::pending::<()>().await;
        }
    };

    let received = station.run(shutdown).await?;
    println!("received {received} readings, exiting");

    Ok(())
}
