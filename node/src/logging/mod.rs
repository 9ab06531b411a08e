//! Logger setup for node binaries and tests. Filtering follows the usual
//! `RUST_LOG` directives; absent that, warnings and above are shown.

pub fn init() {
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    init_with_directives(&directives);
}

pub fn init_with_directives(directives: &str) {
    pretty_env_logger::formatted_timed_builder()
        .parse_filters(directives)
        .format_timestamp_millis()
        .init();
}
