use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, registry};

/// Initializes the global tracing subscriber. Safe to call once per process;
/// tests use `test-log` instead.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("quilt_wm=info,warn"));
    let tree = tracing_tree::HierarchicalLayer::new(2)
        .with_targets(true)
        .with_indent_lines(true);
    registry().with(filter).with(tree).init();
}
