use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialise logging. With `debug` the default level is `debug` and can be
/// overridden via the `RUST_LOG` environment variable; otherwise `info` is
/// forced. When `log_file` is given output is written to that file instead of
/// stdout.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Ignore `RUST_LOG` unless debug logging was requested so a stray variable
    // in the user's environment cannot make the bridge verbose.
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let file = log_file.and_then(|path| {
        let dir = path.parent().map(PathBuf::from).unwrap_or_default();
        let name = path.file_name()?.to_owned();
        Some(tracing_appender::rolling::never(dir, name))
    });

    match file {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let installed = builder.with_writer(writer).with_ansi(false).try_init();
            if installed.is_ok() {
                let _ = LOG_GUARD.set(guard);
            }
        }
        None => {
            let _ = builder.try_init();
        }
    }
}
