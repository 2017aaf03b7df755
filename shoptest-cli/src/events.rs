//! Tracing setup for `shoptest`.

use std::{collections::HashSet, fmt::Display};

use shoptest_library::trace_categories;
use tracing_subscriber::{Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt};

/// Type of event to trace.
#[derive(Clone, Debug, Eq, Hash, PartialEq, clap::ValueEnum)]
pub enum TraceEvent {
    /// Traces loading of the test configuration and resolution of its values.
    #[clap(name = "config")]
    Config,
    /// Traces reading and clearing of exception logs.
    #[clap(name = "exceptions")]
    Exceptions,
}

impl Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config => write!(f, "config"),
            Self::Exceptions => write!(f, "exceptions"),
        }
    }
}

/// Tracing configuration for a single invocation.
#[derive(Default)]
pub struct TraceEventConfig {
    enabled_trace_events: HashSet<TraceEvent>,
}

impl TraceEventConfig {
    /// Installs a global subscriber writing to stderr with the given events enabled at
    /// debug level.
    pub fn init(enabled_log_events: &[TraceEvent]) -> Self {
        let config = Self {
            enabled_trace_events: enabled_log_events.iter().cloned().collect(),
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(false)
            .with_filter(config.compose_filter());

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            // Something went wrong; proceed on anyway but complain audibly.
            eprintln!("warning: failed to initialize tracing.");
        }

        config
    }

    fn compose_filter(&self) -> Targets {
        let mut filter =
            Targets::new().with_default(tracing_subscriber::filter::LevelFilter::INFO);

        for event in &self.enabled_trace_events {
            let target = match event {
                TraceEvent::Config => trace_categories::CONFIG,
                TraceEvent::Exceptions => trace_categories::EXCEPTIONS,
            };

            filter = filter.with_target(target, tracing::Level::DEBUG);
        }

        filter
    }
}
