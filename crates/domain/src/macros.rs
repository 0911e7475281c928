//! Macro for implementing Display and FromStr for wire-facing enums
//!
//! Enums that cross the persistence or logging boundary share a single
//! string representation. The macro keeps `Display` and `FromStr` in sync and
//! parses case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use socialpub_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum UploadPhase {
//!     Queued,
//!     Sending,
//!     Done,
//! }
//!
//! impl_domain_status_conversions!(UploadPhase {
//!     Queued => "queued",
//!     Sending => "sending",
//!     Done => "done",
//! });
//!
//! assert_eq!(UploadPhase::Sending.to_string(), "sending");
//! assert_eq!("DONE".parse::<UploadPhase>().unwrap(), UploadPhase::Done);
//! ```

/// Implements Display and FromStr traits for status-like enums
///
/// String representations must be lowercase; parsing lowercases its input
/// before matching.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
