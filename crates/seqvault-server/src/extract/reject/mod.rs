//! Request body extractors with improved error handling and validation.
//!
//! Drop-in replacements for their Axum counterparts that reject with the
//! crate's [`Error`] type.
//!
//! [`Error`]: crate::handler::Error

pub mod enhanced_json;
pub mod validated_json;

pub use self::enhanced_json::Json;
pub use self::validated_json::ValidateJson;
