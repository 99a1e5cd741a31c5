//! Log macros shared by the subsystems.

/// Emit a lock lifecycle event at `$level`.
///
/// `chain` and `lock_id` are always recorded with `Display`, so ids show up
/// as hex rather than byte arrays. Extra `tracing` fields may follow.
#[macro_export]
macro_rules! log_lock_event {
    ($level:ident, $msg:expr, $chain:expr, $lock_id:expr $(, $($field:tt)*)?) => {
        ::tracing::$level!(
            subsystem = "sc-02",
            chain = %$chain,
            lock_id = %$lock_id,
            $($($field)*,)?
            $msg
        )
    };
}
