//! Bit-level sequential I/O over byte buffers and byte streams.
//!
//! Bits are packed most significant first. A [`Writer`] appends bits, bytes
//! and fixed-width unsigned fields to a [`Sink`](store::Sink); a [`Reader`]
//! takes them back out of a [`Source`](store::Source). The [`bitfield`]
//! functions convert single values without a cursor.

pub mod bitfield;
pub mod error;
pub mod reader;
pub mod store;
pub mod writer;

pub use bitfield::{bit_field, pack, put_bit_field, unpack};
pub use error::{Error, Result};
pub use reader::Reader;
pub use store::{FixedBuffer, GrowableBuffer, Grower, Sink, Source};
pub use writer::Writer;
