#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
pub mod laboratory;
pub mod listing;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use laboratory::{Capability, Laboratory};
pub use listing::{
    AggregatedListing, DEFAULT_DELIMITER, DEFAULT_MAX_KEYS, ListingRequest, MAX_PAGE_SIZE, ObjectEntry,
    PrefixEntry, ResponseMetadata,
};
