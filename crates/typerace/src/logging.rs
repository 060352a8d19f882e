//! Tracing subscriber setup for the server binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events are shown at `default_level` when `RUST_LOG` is
/// unset.
const CRATES: [&str; 6] = [
    "typerace",
    "typerace_transport",
    "typerace_protocol",
    "typerace_deadline",
    "typerace_room",
    "typerace_solo",
];

/// Builds the fallback filter directive, e.g. `typerace=info,typerace_room=info,...`.
pub fn default_directives(binary_name: &str, default_level: &str) -> String {
    CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={default_level}", target.replace('-', "_")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` wins if set; otherwise every Typerace crate logs at
/// `default_level`.
pub fn setup_logger(binary_name: &str, default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let directives = default_directives("typerace-server", "debug");
        assert!(directives.starts_with("typerace=debug,"));
        assert!(directives.contains("typerace_room=debug"));
        assert!(directives.ends_with("typerace_server=debug"));
    }
}
