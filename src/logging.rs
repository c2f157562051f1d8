use std::{path::PathBuf, sync::Once};

use tracing::{debug, metadata::LevelFilter, Level};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{prelude::*, EnvFilter};

static INIT: Once = Once::new();

fn do_init(stdout_level: Level, file_level: Option<(Level, PathBuf)>) {
    let mut message = String::from("Logging with:");

    // stdout
    message += " stdout";

    // `RUST_LOG` wins over the level given, when set.
    let stdout_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from(stdout_level).into())
    });

    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(stdout_filter);

    let registry = tracing_subscriber::registry().with(stdout_layer);

    let maybe_file_layer = if let Some((level, output_dir)) = file_level {
        message += &format!(", file (in dir {output_dir:?})");

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, output_dir, "sdk-bridge.log");

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_filter(LevelFilter::from(level));
        Some(file_layer)
    } else {
        None
    };

    // Someone else (a test harness, say) got there first.
    if let Err(e) = registry.with(maybe_file_layer).try_init() {
        debug!(%e, "Keeping the existing subscriber");
        return;
    }

    debug!(message);
}

/// Install the global subscriber: stdout at `stdout_level`, plus a daily
/// rolling file in the given directory when `file_logging` is set.
///
/// Only the first call has any effect.
pub fn init(stdout_level: Level, file_logging: Option<(Level, PathBuf)>) {
    INIT.call_once(|| do_init(stdout_level, file_logging));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init(Level::DEBUG, None);
        init(Level::TRACE, None);

        assert!(INIT.is_completed());
    }
}
