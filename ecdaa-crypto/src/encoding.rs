//! Fixed-width, big-endian byte encodings for ECDAA wire types.
//!
//! Every serialized object is a plain concatenation of its fields: group elements in the curve's
//! compressed encoding, scalars as [`PairingCurve::SCALAR_LENGTH`] big-endian bytes, and counts or
//! lengths as big-endian `u32`s. There are no headers or version tags, so the length of an
//! encoding is fully determined by its type (plus any counted or length-prefixed contents).
//!
//! Decoding checks the available length before every field, then the validity of the field
//! itself (subgroup membership for points, canonical range for scalars), and finally that no bytes
//! are left over. Any failure is [`Error::MalformedInput`].

use crate::{curve::PairingCurve, Error};
use group::GroupEncoding;
use std::convert::TryFrom;

/// A type with a fixed-width byte encoding.
pub trait Encode {
    /// Append the encoding of `self` to the writer.
    fn encode(&self, writer: &mut Writer);

    /// Encode `self` into a fresh byte vector.
    fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.encode(&mut writer);
        writer.into_bytes()
    }
}

/// A type that can be decoded from its fixed-width byte encoding.
pub trait Decode: Sized {
    /// Read one value from the reader, leaving it positioned after the value.
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error>;

    /// Decode a value that must span `bytes` exactly.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut reader = Reader::new(bytes);
        let value = Self::decode(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

/// Accumulates an encoding.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    /// Start an empty encoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group element in its compressed encoding.
    pub fn point<G: GroupEncoding>(&mut self, point: &G) {
        self.bytes.extend_from_slice(point.to_bytes().as_ref());
    }

    /// Append a scalar as big-endian bytes.
    pub fn scalar<C: PairingCurve>(&mut self, scalar: &C::Scalar) {
        self.bytes.extend_from_slice(&C::scalar_to_bytes(scalar));
    }

    /// Append a big-endian `u32`.
    pub fn u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Append raw bytes with a `u32` length prefix.
    ///
    /// Callers guarantee `bytes.len()` fits in a `u32`.
    pub fn length_prefixed(&mut self, bytes: &[u8]) {
        self.u32(bytes.len() as u32);
        self.bytes.extend_from_slice(bytes);
    }

    /// Append raw bytes.
    pub fn raw(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Finish the encoding.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A cursor over an encoding being decoded.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }

    /// Whether every byte has been read.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read exactly `len` raw bytes.
    pub fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], Error> {
        if self.bytes.len() < len {
            return Err(Error::MalformedInput(format!(
                "{} needs {} bytes, only {} remain",
                what,
                len,
                self.bytes.len()
            )));
        }
        let (taken, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Ok(taken)
    }

    /// Read a compressed group element, checking that it is a valid element of the group.
    pub fn point<G: GroupEncoding>(&mut self, what: &str) -> Result<G, Error> {
        let mut repr = G::Repr::default();
        let len = repr.as_ref().len();
        repr.as_mut().copy_from_slice(self.take(len, what)?);
        Option::<G>::from(G::from_bytes(&repr))
            .ok_or_else(|| Error::MalformedInput(format!("{} is not a valid group element", what)))
    }

    /// Read a big-endian scalar, rejecting values outside the canonical range.
    pub fn scalar<C: PairingCurve>(&mut self, what: &str) -> Result<C::Scalar, Error> {
        let bytes = self.take(C::SCALAR_LENGTH, what)?;
        C::scalar_from_bytes(bytes)
            .ok_or_else(|| Error::MalformedInput(format!("{} is not a canonical scalar", what)))
    }

    /// Read a big-endian `u32`.
    pub fn u32(&mut self, what: &str) -> Result<u32, Error> {
        let bytes = self.take(4, what)?;
        let array = <[u8; 4]>::try_from(bytes)
            .map_err(|_| Error::MalformedInput(format!("{} is not a u32", what)))?;
        Ok(u32::from_be_bytes(array))
    }

    /// Read bytes preceded by a `u32` length.
    pub fn length_prefixed(&mut self, what: &str) -> Result<&'a [u8], Error> {
        let len = self.u32(what)? as usize;
        self.take(len, what)
    }

    /// Check that the whole input has been consumed.
    pub fn finish(self) -> Result<(), Error> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(Error::MalformedInput(format!(
                "{} trailing bytes",
                self.bytes.len()
            )))
        }
    }
}
