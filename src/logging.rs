use std::sync::Mutex;

use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter, Registry};

lazy_static! {
    static ref LOGGING_INITIALIZED: Mutex<bool> = Mutex::new(false);
}

/// Filter used when `RUST_LOG` is unset or empty.  The per-node trace lines
/// are emitted at info, so this shows them.
pub const DEFAULT_LOG_FILTER: &str = "swbf2_hierarchy=info";

/// Initialize logging.  If you set the environment variable `RUST_LOG` to a
/// non-empty value it is interpreted as the filter, otherwise we fall back to
/// `DEFAULT_LOG_FILTER`.  Safe to call more than once; only the first call
/// installs the subscriber.
pub fn init_logging() {
    let mut initialized = match LOGGING_INITIALIZED.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *initialized {
        return;
    }

    // An empty RUST_LOG means "use the default", not "log nothing".
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(rustlog) if !rustlog.is_empty() => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
        }
        _ => EnvFilter::new(DEFAULT_LOG_FILTER),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NONE)
        .compact()
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_filter(env_filter);

    // Another subscriber may already be installed (e.g. by a test harness);
    // that is fine, we just don't get ours.
    let _ = Registry::default().with(layer).try_init();

    *initialized = true;
}
