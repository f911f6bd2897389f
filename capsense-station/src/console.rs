//! What the station binary shows on its terminal. Everything goes to
//! the rolling trace file; errors (such as a reading log that cannot
//! be opened) are copied to stderr as well.

use tracing::Level;
use tracing_subscriber::fmt::{
    writer::{MakeWriterExt, Tee, WithMaxLevel},
    MakeWriter,
};

use crate::VERSION;

/// Tee `file` with `console`, letting only ERROR events through to
/// `console`
pub fn file_and_console<F, C>(file: F, console: C) -> Tee<F, WithMaxLevel<C>>
where
    F: for<'a> MakeWriter<'a>,
    C: for<'a> MakeWriter<'a>,
{
    file.and(console.with_max_level(Level::ERROR))
}

/// Startup text: program name, version and the radio's configuration
pub fn startup_banner(argv0: &str, radio_details: &str) -> String {
    format!("\n{argv0} [{VERSION}]\n{radio_details}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        io,
        sync::{Arc, Mutex},
    };
    use tracing_subscriber::FmtSubscriber;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn log_errors_reach_console() {
        // `log` records are what the station emits
        let _ = tracing_log::LogTracer::init();

        let file = Captured::default();
        let console = Captured::default();
        let (f, c) = (file.clone(), console.clone());
        let sub = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(file_and_console(move || f.clone(), move || c.clone()))
            .finish();

        tracing::subscriber::with_default(sub, || {
            log::info!("reading 1 received");
            log::error!("Error logging reading, skipping: Open");
        });

        let file = file.text();
        assert!(file.contains("reading 1 received"));
        assert!(file.contains("Error logging reading"));

        let console = console.text();
        assert!(console.contains("Error logging reading"));
        assert!(!console.contains("reading 1 received"));
    }

    #[test]
    fn banner_has_version_and_details() {
        let banner = startup_banner("capsense-station", "Channel\t= 76");
        assert!(banner.contains(&format!("capsense-station [{VERSION}]")));
        assert!(banner.ends_with("Channel\t= 76"));
    }
}
