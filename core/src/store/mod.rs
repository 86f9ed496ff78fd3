//! Byte media a bit cursor runs over.
//!
//! A [`Reader`](crate::Reader) takes a [`Source`], a [`Writer`](crate::Writer)
//! takes a [`Sink`]. Buffers are random access and know their size up front,
//! so cursor operations over them either fit or fail without side effects.
//! Streams only move one byte at a time and may run dry or fill up halfway
//! through a request.

use std::io::{Read, Write};

pub mod buffer;
pub(crate) mod stream;

pub use buffer::{FixedBuffer, GrowableBuffer, Grower};

pub enum Source<'a> {
    /// Bytes already in memory, e.g. the contents of a [`Grower`].
    Fixed(&'a [u8]),
    Stream(&'a mut dyn Read),
}

pub enum Sink<'a> {
    /// A caller-provided allocation that never grows.
    Fixed(FixedBuffer<'a>),
    Growable(&'a mut dyn Grower),
    Stream(&'a mut dyn Write),
}

impl<'a> Sink<'a> {
    pub(crate) fn grower(&mut self) -> Option<&mut (dyn Grower + 'a)> {
        match self {
            Sink::Fixed(buf) => Some(buf as &mut (dyn Grower + 'a)),
            Sink::Growable(g) => Some(&mut **g),
            Sink::Stream(_) => None,
        }
    }

    pub(crate) fn is_stream(&self) -> bool {
        matches!(self, Sink::Stream(_))
    }
}
