//! Revocation lists consulted by verifiers.
//!
//! A [`SecretKeyRevocationList`] holds leaked member secret keys; any signature made with one of
//! them is rejected. A [`BasenameRevocationList`] holds pseudonyms that are revoked under a
//! particular basename only.
//!
//! Both lists check every entry before answering, so the time taken does not reveal which entry
//! matched.

use crate::{member::MemberSecretKey, types::*};
use ecdaa_crypto::impl_serde_via_encoding;
use std::{convert::TryFrom, iter::FromIterator};

/// A list of revoked member secret keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKeyRevocationList<C: PairingCurve> {
    keys: Vec<MemberSecretKey<C>>,
}

impl<C: PairingCurve> Default for SecretKeyRevocationList<C> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<C: PairingCurve> SecretKeyRevocationList<C> {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `key`.
    pub fn insert(&mut self, key: MemberSecretKey<C>) {
        self.keys.push(key);
    }

    /// Number of revoked keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether `w = sk·s` for some revoked `sk`.
    pub fn is_revoked(&self, s: &C::G1, w: &C::G1) -> bool {
        self.keys
            .iter()
            .fold(false, |revoked, key| revoked | (*s * key.as_scalar() == *w))
    }
}

impl<C: PairingCurve> FromIterator<MemberSecretKey<C>> for SecretKeyRevocationList<C> {
    fn from_iter<I: IntoIterator<Item = MemberSecretKey<C>>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<C: PairingCurve> Encode for SecretKeyRevocationList<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.u32(self.keys.len() as u32);
        for key in &self.keys {
            key.encode(writer);
        }
    }
}

impl<C: PairingCurve> Decode for SecretKeyRevocationList<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        let count = reader.u32("secret key revocation list count")? as usize;
        let mut keys = Vec::with_capacity(count.min(reader.remaining() / C::SCALAR_LENGTH));
        for _ in 0..count {
            keys.push(MemberSecretKey::decode(reader)?);
        }
        Ok(Self { keys })
    }
}

/// A revoked pseudonym and the basename it is revoked under.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BasenameEntry<C: PairingCurve> {
    basename: Vec<u8>,
    pseudonym: C::G1,
}

/// A list of pseudonyms revoked under particular basenames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasenameRevocationList<C: PairingCurve> {
    entries: Vec<BasenameEntry<C>>,
}

impl<C: PairingCurve> Default for BasenameRevocationList<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C: PairingCurve> BasenameRevocationList<C> {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Revoke `pseudonym` under `basename`, typically taken from
    /// [`Signature::pseudonym`](crate::signature::Signature::pseudonym).
    ///
    /// Fails with [`Error::MalformedInput`] if the basename is too long to encode.
    pub fn insert(&mut self, basename: &[u8], pseudonym: C::G1) -> Result<(), Error> {
        if u32::try_from(basename.len()).is_err() {
            return Err(Error::MalformedInput(format!(
                "basename of {} bytes is too long",
                basename.len()
            )));
        }
        self.entries.push(BasenameEntry {
            basename: basename.to_vec(),
            pseudonym,
        });
        Ok(())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `pseudonym` is revoked under `basename`.
    pub fn is_revoked(&self, basename: &[u8], pseudonym: &C::G1) -> bool {
        self.entries.iter().fold(false, |revoked, entry| {
            revoked | (entry.basename == basename && entry.pseudonym == *pseudonym)
        })
    }
}

impl<C: PairingCurve> Encode for BasenameRevocationList<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.u32(self.entries.len() as u32);
        for entry in &self.entries {
            writer.length_prefixed(&entry.basename);
            writer.point(&entry.pseudonym);
        }
    }
}

impl<C: PairingCurve> Decode for BasenameRevocationList<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        let count = reader.u32("basename revocation list count")? as usize;
        let min_entry = 4 + C::g1_length();
        let mut entries = Vec::with_capacity(count.min(reader.remaining() / min_entry));
        for _ in 0..count {
            let basename = reader.length_prefixed("revoked basename")?.to_vec();
            let pseudonym = reader.point("revoked pseudonym")?;
            entries.push(BasenameEntry {
                basename,
                pseudonym,
            });
        }
        Ok(Self { entries })
    }
}

impl_serde_via_encoding!(SecretKeyRevocationList, BasenameRevocationList);
