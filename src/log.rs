// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Log module, built on log4rs, reference
//! https://docs.rs/log4rs
//!
//! Records go to the host's log interface when the host offers one, and to
//! stderr otherwise. A log file can be added through the core config.

use log::{Level, LevelFilter, Record};
use log4rs::{
    append::{file::FileAppender, Append},
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Handle,
};
use std::sync::{OnceLock, RwLock};

/// Host log channel. The libretro binding installs one wrapping the host's
/// printf-style callback.
pub type HostSink = Box<dyn Fn(Level, &str) + Send + Sync>;

static HOST_SINK: RwLock<Option<HostSink>> = RwLock::new(None);
static LOG_HANDLE: OnceLock<Handle> = OnceLock::new();

/// Install or remove the host log channel.
pub fn set_host_sink(sink: Option<HostSink>) {
    if let Ok(mut guard) = HOST_SINK.write() {
        *guard = sink;
    }
}

pub fn has_host_sink() -> bool {
    HOST_SINK.read().map(|g| g.is_some()).unwrap_or(false)
}

/// Send one message to the host channel, or to stderr without one.
pub fn forward(level: Level, msg: &str) {
    match HOST_SINK.read() {
        Ok(guard) => match guard.as_ref() {
            Some(sink) => sink(level, msg),
            None => eprintln!("[pixel_retro] {} {}", level, msg),
        },
        Err(_) => eprintln!("[pixel_retro] {} {}", level, msg),
    }
}

#[derive(Debug)]
struct HostAppender;

impl Append for HostAppender {
    fn append(&self, record: &Record) -> anyhow::Result<()> {
        forward(record.level(), &record.args().to_string());
        Ok(())
    }

    fn flush(&self) {}
}

fn build_config(level: LevelFilter, file_path: Option<&str>) -> anyhow::Result<Config> {
    let mut builder = Config::builder().appender(Appender::builder().build("host", Box::new(HostAppender)));
    let mut root = Root::builder().appender("host");
    if let Some(fp) = file_path {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(
                "{d(%Y-%m-%d %H:%M:%S)} {l} {t} {m}{n}",
            )))
            .build(fp)?;
        builder = builder.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(level)))
                .build("logfile", Box::new(logfile)),
        );
        root = root.appender("logfile");
    }
    Ok(builder.build(root.build(level))?)
}

/// init logs system
///
/// The first call installs the logger, later calls replace its configuration.
pub fn init_log(level: LevelFilter, file_path: Option<&str>) {
    let config = match build_config(level, file_path) {
        Ok(c) => c,
        Err(e) => {
            forward(Level::Warn, &format!("log file unavailable: {}", e));
            match build_config(level, None) {
                Ok(c) => c,
                Err(_) => return,
            }
        }
    };
    if let Some(handle) = LOG_HANDLE.get() {
        handle.set_config(config);
        return;
    }
    match log4rs::init_config(config) {
        Ok(handle) => {
            let _ = LOG_HANDLE.set(handle);
        }
        Err(e) => forward(Level::Warn, &format!("logger already installed: {}", e)),
    }
}
