//! Per-severity logging macros.
//!
//! Every macro takes the logger first, then an optional `tag = ...`, then
//! the message and any number of arguments. Arguments may be of any type
//! that converts into [`Value`](crate::Value); the call site's module path
//! is passed along for tag derivation.
//!
//! ```
//! let log = taglog::Logger::builder().without_sinks().build().unwrap();
//! taglog::d!(log, "connected", "10.0.0.1", 8080);
//! taglog::w!(log, tag = "Net", "retrying in %ds", 5);
//! ```

#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, tag = $tag:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $logger.log(
            $level,
            $crate::Caller::new(::core::module_path!()).with_tag(&$tag),
            &$crate::Value::from($msg),
            &[$($crate::Value::from($arg)),*],
        )
    };
    ($logger:expr, $level:expr, $msg:expr $(, $arg:expr)* $(,)?) => {
        $logger.log(
            $level,
            $crate::Caller::new(::core::module_path!()),
            &$crate::Value::from($msg),
            &[$($crate::Value::from($arg)),*],
        )
    };
}

#[macro_export]
macro_rules! v {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Verbose, $($rest)+)
    };
}

#[macro_export]
macro_rules! d {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Debug, $($rest)+)
    };
}

#[macro_export]
macro_rules! i {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Info, $($rest)+)
    };
}

#[macro_export]
macro_rules! w {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Warn, $($rest)+)
    };
}

#[macro_export]
macro_rules! e {
    ($logger:expr, $($rest:tt)+) => {
        $crate::log_at!($logger, $crate::Level::Error, $($rest)+)
    };
}
