//! Stderr logger for the detector crates.
//!
//! Records from `xiangqi_vision*` targets pass at the configured level, records
//! from dependencies only at `warn` and above. Lines read
//! `[elapsed LEVEL stage] message`, where `stage` is the last module of the
//! target (`locator`, `grid`, `cell`, ...).

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

const OWN_TARGET_PREFIX: &str = "xiangqi_vision";

#[cfg(feature = "tracing")]
const DEFAULT_TRACING_FILTER: &str = "warn,xiangqi_vision=info,xiangqi_vision_core=info";

struct StageLogger {
    level: LevelFilter,
    started: Instant,
}

impl StageLogger {
    fn threshold(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_TARGET_PREFIX) {
            self.level
        } else {
            self.level.min(LevelFilter::Warn)
        }
    }
}

impl Log for StageLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.threshold(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            *record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn stage_of(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn format_line(elapsed: f64, level: Level, target: &str, args: fmt::Arguments<'_>) -> String {
    format!("[{elapsed:7.3}s {level:>5} {}] {args}", stage_of(target))
}

static LOGGER: OnceLock<StageLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| StageLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install a `tracing` subscriber. `RUST_LOG` wins over the default filter,
/// which keeps detector spans at `info` and dependencies at `warn`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACING_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder.compact().finish().try_init()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logger(level: LevelFilter) -> StageLogger {
        StageLogger {
            level,
            started: Instant::now(),
        }
    }

    fn meta(level: Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn line_names_the_stage_module() {
        let line = format_line(
            1.5,
            Level::Warn,
            "xiangqi_vision::cell",
            format_args!("cell ({}, {}) unresolved", 3, 4),
        );
        assert_eq!(line, "[  1.500s  WARN cell] cell (3, 4) unresolved");
        assert_eq!(stage_of("xiangqi_vision::detector::pipeline"), "pipeline");
        assert_eq!(stage_of("imageproc"), "imageproc");
    }

    #[test]
    fn dependencies_are_held_to_warn() {
        let l = logger(LevelFilter::Debug);
        assert!(l.enabled(&meta(Level::Debug, "xiangqi_vision::grid")));
        assert!(l.enabled(&meta(Level::Debug, "xiangqi_vision_core::cluster1d")));
        assert!(!l.enabled(&meta(Level::Trace, "xiangqi_vision::grid")));
        assert!(!l.enabled(&meta(Level::Info, "imageproc::edges")));
        assert!(l.enabled(&meta(Level::Warn, "imageproc::edges")));

        let quiet = logger(LevelFilter::Error);
        assert!(!quiet.enabled(&meta(Level::Warn, "xiangqi_vision::cell")));
        assert!(!quiet.enabled(&meta(Level::Warn, "image")));
    }

    #[test]
    fn repeated_init_is_a_no_op() {
        init_with_level(LevelFilter::Debug).unwrap();
        init_with_level(LevelFilter::Error).unwrap();
        assert_eq!(log::max_level(), LevelFilter::Debug);
        log::debug!("logger installed");
    }
}
