/// Logs a line tagged with the emitting component.
///
/// The component becomes the `log` target, so the `fern` formatter set up in
/// `main.rs` prints it in the `[target]` slot:
/// ```ignore
/// okra_log!(Level::Info, "flusher", "mission '{}' flushed {} row(s)", name, rows);
/// ```
/// Logs like:
/// [2026-10-19T16:32:10+02:00][INFO ][flusher][pid=4568][tid=ThreadId(3)] mission 'login' flushed 12 row(s)
#[macro_export]
macro_rules! okra_log {
    ($level:expr, $component:expr, $fmt:expr $(, $($arg:tt)+)?) => {
        log::log!(target: $component, $level, $fmt $(, $($arg)+)?)
    };
}
