//! Cursor wire encoding, backpressure, and pagination for the three
//! streaming dispatch calls (C7): `ReachableResources`, `LookupResources`,
//! `LookupSubjects`. `rebac-engine`'s resolvers for these already return a
//! materialized `Vec<T>`; this crate is what turns one of those into pages
//! a client can resume across, and what bounds how many pages a node will
//! hold in flight at once.

pub mod error;
pub mod paginate;
pub mod window;
pub mod wire;

pub use error::{Result, StreamError};
pub use paginate::{dedup_by_key, paginate, Page};
pub use window::InFlightWindow;
pub use wire::{decode as decode_cursor, encode as encode_cursor};
