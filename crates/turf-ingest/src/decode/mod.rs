//! Record stream decoding
//!
//! Two layers: [`fields`] holds the pure fixed-offset accessors over raw
//! bytes, [`records`] dispatches on the record-type tag and applies each
//! kind's offset table to produce a [`DecodedRecord`].

pub mod fields;
pub mod models;
pub mod records;

pub use models::DecodedRecord;
pub use records::{decode, DecodeError};
