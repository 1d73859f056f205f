//! Functionality for building challenge scalars.
//!
//! A [`ChallengeBuilder`] absorbs a domain separation tag followed by the public data of a proof.
//! Points and scalars have fixed widths; variable-length data must go through
//! [`ChallengeBuilder::consume_length_prefixed`] so that no two different inputs absorb the same
//! byte string.

use crate::common::*;
use std::fmt;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

/// A trait implemented by types which can feed their public components into a
/// [`ChallengeBuilder`].
pub trait ChallengeInput {
    /// Incorporate public components of this type into a [`ChallengeBuilder`].
    fn consume(&self, builder: &mut ChallengeBuilder);
}

impl<'a, T: ChallengeInput> ChallengeInput for &'a T {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        (**self).consume(builder);
    }
}

/// A challenge scalar for use in a Schnorr-style proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge<C: PairingCurve>(C::Scalar);

impl<C: PairingCurve> Challenge<C> {
    /// Retrieve the internal scalar value.
    pub fn to_scalar(self) -> C::Scalar {
        self.0
    }
}

/// The digest of a Schnorr commitment together with everything it is bound to.
///
/// This is the value a TPM signs: the signer's nonce is bound to it with
/// [`bind_nonce`](super::bind_nonce) to give the final challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitmentDigest([u8; 32]);

impl CommitmentDigest {
    /// Length of the digest in bytes.
    pub const LENGTH: usize = 32;

    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Holds state used when building a [`Challenge`] using the Fiat-Shamir heuristic, as in a
/// non-interactive Schnorr proof.
#[derive(Clone)]
#[allow(missing_copy_implementations)]
pub struct ChallengeBuilder {
    hasher: Shake256,
}

impl fmt::Debug for ChallengeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChallengeBuilder").finish_non_exhaustive()
    }
}

impl ChallengeBuilder {
    /// Initialize a new challenge under the given domain separation tag.
    pub fn new(domain: &[u8]) -> Self {
        let mut builder = Self {
            hasher: Shake256::default(),
        };
        builder.consume_length_prefixed(domain);
        builder
    }

    /// Incorporate public data from some given type into the challenge.
    pub fn consume<T: ChallengeInput>(&mut self, object: &T) {
        object.consume(self);
    }

    /// Incorporate a group element, in its compressed encoding.
    pub fn consume_point<G: GroupEncoding>(&mut self, point: &G) {
        self.consume_bytes(point.to_bytes());
    }

    /// A conveniently chainable variant of [`ChallengeBuilder::consume_point`].
    pub fn with_point<G: GroupEncoding>(mut self, point: &G) -> Self {
        self.consume_point(point);
        self
    }

    /// Incorporate fixed-length bytes into the challenge.
    pub fn consume_bytes(&mut self, bytes: impl AsRef<[u8]>) {
        self.hasher.update(bytes.as_ref());
    }

    /// A conveniently chainable variant of [`ChallengeBuilder::consume_bytes`].
    pub fn with_bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.consume_bytes(bytes);
        self
    }

    /// Incorporate variable-length bytes, preceded by their length.
    pub fn consume_length_prefixed(&mut self, bytes: &[u8]) {
        self.consume_bytes((bytes.len() as u64).to_be_bytes());
        self.consume_bytes(bytes);
    }

    /// A conveniently chainable variant of [`ChallengeBuilder::consume_length_prefixed`].
    pub fn with_length_prefixed(mut self, bytes: &[u8]) -> Self {
        self.consume_length_prefixed(bytes);
        self
    }

    /// Consume the builder and generate a [`Challenge`] from the accumulated data.
    pub fn finish<C: PairingCurve>(self) -> Challenge<C> {
        let mut wide = [0; 64];
        self.hasher.finalize_xof().read(&mut wide);
        Challenge(C::scalar_from_uniform_bytes(&wide))
    }

    /// Consume the builder and produce a [`CommitmentDigest`] of the accumulated data.
    pub fn finish_digest(self) -> CommitmentDigest {
        let mut digest = [0; 32];
        self.hasher.finalize_xof().read(&mut digest);
        CommitmentDigest(digest)
    }
}
