//! Common logging initializer
//!

use eyre::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_tree::HierarchicalLayer;

/// Initialise logging early
///
/// Filters are loaded from the environment (`RUST_LOG`).  The optional
/// hierarchical layer gives per-span tree output, useful when following a
/// decode through its blocks and records.
///
pub fn init_logging(use_tree: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env();

    // Do we want hierarchical output?
    //
    let tree = if use_tree {
        Some(
            HierarchicalLayer::new(2)
                .with_ansi(true)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
    } else {
        None
    };

    // Combine filters & layers
    //
    tracing_subscriber::registry().with(filter).with(tree).init();

    Ok(())
}
