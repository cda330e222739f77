//! Utility macros for the transpiler.
//!
//! - `MK_UNSUPPORTED!` - Creates an UnsupportedConstruct error
//! - `MK_UNKNOWN_TYPE!` - Creates an UnknownTypeFallthrough error
//!
//! Both take `format!` style arguments and evaluate to an `Error`, so call
//! sites read `return Err(MK_UNSUPPORTED!(...))`.

/// Creates an UnsupportedConstruct error.
///
/// # Example
///
/// ```ignore
/// return Err(MK_UNSUPPORTED!("augmented assignment with operator `{}`", op));
/// ```
#[macro_export]
macro_rules! MK_UNSUPPORTED {
    ($($arg:tt)*) => {
        $crate::errors::errors::Error::new(
            $crate::errors::errors::ErrorImpl::UnsupportedConstruct {
                construct: format!($($arg)*),
            },
        )
    };
}

/// Creates an UnknownTypeFallthrough error.
///
/// # Example
///
/// ```ignore
/// return Err(MK_UNKNOWN_TYPE!("element type of `{}`", name));
/// ```
#[macro_export]
macro_rules! MK_UNKNOWN_TYPE {
    ($($arg:tt)*) => {
        $crate::errors::errors::Error::new(
            $crate::errors::errors::ErrorImpl::UnknownTypeFallthrough {
                context: format!($($arg)*),
            },
        )
    };
}
