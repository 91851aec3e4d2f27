use std::time::Duration;

/// Default TCP port shared by both ends.
pub const DEFAULT_PORT: u16 = 4900;

/// Default host the server binds and the client dials.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default log filter expression for the server.
pub const SERVER_LOG_FILTER: &str = "info";

/// Default log filter expression for the client.
///
/// Kept quiet so diagnostics do not interleave with the interactive prompt.
pub const CLIENT_LOG_FILTER: &str = "warn";

/// Number of ingested lines retained for search.
pub const HISTORY_CAPACITY: usize = 99_000;

/// Maximum lines carried by a single search response page.
pub const RESULT_PAGE_LINES: usize = 1_000;

/// Fixed delay before the client retries a lost connection.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Time a reconnect attempt has to succeed before the client gives up.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(1);

/// Budget for a signal-initiated graceful close.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Ingested lines that may wait for the queue worker before the reader blocks.
pub const INGEST_BACKLOG: usize = 1_024;
