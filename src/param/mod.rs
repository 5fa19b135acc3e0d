//! Immutable typed parameter containers handed in by the loader: envelopes,
//! samples, and number lists/maps.

pub mod envelope;
pub mod numlist;
pub mod sample;

pub use envelope::Envelope;
pub use numlist::{Map, MapEntry, NumList};
pub use sample::Sample;
