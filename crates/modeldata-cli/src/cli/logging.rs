use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "MODELDATA_LOG";

/// Install the stderr subscriber. `MODELDATA_LOG` wins when set; otherwise
/// only errors are shown, or debug output for `--verbose`.
pub fn init(verbose: bool) {
    let fallback = if verbose { "modeldata=debug" } else { "error" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let console_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(verbose)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
        .ok();
}
