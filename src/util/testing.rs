use std::sync::Once;
use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::interval::Interval;
use crate::tag::Tag;

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    // RUST_LOG wins, otherwise the crate logs at debug
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("finter=debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Raw tags from `(begin, end, description)` triples.
pub fn raw_tags(specs: &[(u64, u64, &str)]) -> Vec<Tag> {
    specs
        .iter()
        .map(|&(begin, end, description)| Tag::raw(begin, end, description))
        .collect()
}

/// `(begin, end)` of every leaf, the shape coverage assertions compare against.
pub fn leaf_spans(tree: &crate::coverage::CoverageTree) -> Vec<(u64, u64)> {
    tree.leaves()
        .iter()
        .map(|leaf| {
            let Interval { begin, end } = leaf.span();
            (begin, end)
        })
        .collect()
}
