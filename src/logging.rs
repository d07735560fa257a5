use once_cell::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::new();

/// One time logging init, safe to call from every constructor.
pub fn init() {
    INIT.get_or_init(|| {
        use tracing_subscriber::EnvFilter;

        let _ = tracing_log::LogTracer::init();

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::debug!("global tracing subscriber was already set");
        }
    });
}
