//! Macros for building and returning [`crate::error::DwhError`] values.

/// Creates a [`crate::error::DwhError`] from an error kind and a static description.
///
/// Optional dynamic detail can be passed positionally (it is formatted with `to_string`) or with
/// `detail =` to move an owned [`String`]. A source error can be attached with `source:`.
#[macro_export]
macro_rules! dwh_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::DwhError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::DwhError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        $crate::error::DwhError::from(($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr, source: $source:expr) => {
        $crate::error::DwhError::from(($kind, $desc, $detail)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::DwhError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::DwhError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates a [`crate::error::DwhError`] and returns it from the current function.
///
/// Accepts the same arguments as [`dwh_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::dwh_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::dwh_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        return ::core::result::Result::Err($crate::dwh_error!($kind, $desc, detail = $detail))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::dwh_error!(
            $kind,
            $desc,
            detail = $detail,
            source: $source
        ))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::dwh_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::dwh_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
