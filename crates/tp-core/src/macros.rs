/// Return early with an invariant violation
#[macro_export]
macro_rules! invariant {
    ($($arg:tt)*) => {
        return Err($crate::error::Error::InvariantViolation(format!($($arg)*)))
    };
}

/// Return early with an invariant violation unless the condition holds
#[macro_export]
macro_rules! ensure_invariant {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::invariant!($($arg)*);
        }
    };
}

/// Log a warning message
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!($($arg)*)
    };
}

/// Log a debug message
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::tracing::debug!($($arg)*)
    };
}

/// Log a trace message
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::tracing::trace!($($arg)*)
    };
}

