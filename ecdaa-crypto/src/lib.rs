//! This crate includes the cryptographic building blocks of elliptic-curve Direct Anonymous
//! Attestation (ECDAA), generic over a pairing-friendly curve:
//! - the [`PairingCurve`](curve::PairingCurve) abstraction and its BLS12-381 instantiation;
//! - fixed-width, big-endian encodings for every wire type;
//! - Schnorr-style zero-knowledge proofs: the issuer key proof, the credential proof, and the
//!   member signature of knowledge, including its split commit/respond form for hardware keys.

#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]

pub mod curve;
pub mod encoding;
pub mod proofs;
pub mod serde;

pub use crate::curve::{Bls12381, PairingCurve};

use thiserror::Error;

/// Error types that may arise from ECDAA operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The random number generator could not produce output.
    #[error("the random number generator failed")]
    RandomnessFailure,
    /// A zero-knowledge proof or signature of knowledge did not verify.
    #[error("proof did not verify")]
    InvalidProof,
    /// A credential (or the randomized credential inside a signature) failed its pairing checks.
    #[error("credential is not valid under the group public key")]
    InvalidCredential,
    /// A signature was produced by a revoked member.
    #[error("signer has been revoked")]
    Revoked,
    /// Input bytes could not be decoded.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// The TPM or its transport reported a failure.
    #[error("TPM failure: {0}")]
    HardwareError(String),
    /// A join request referenced a nonce that is unknown or was already consumed.
    #[error("issuer nonce is unknown or already used")]
    NonceReplay,
}

impl Error {
    /// Whether the error is a definitive rejection of well-formed input, as opposed to a failure
    /// to evaluate it at all.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidProof | Error::InvalidCredential | Error::Revoked | Error::NonceReplay
        )
    }
}

/// Trait synonym for a cryptographically secure random number generator. This trait is
/// blanket-implemented for all valid types and will never need to be implemented by-hand.
pub trait Rng: rand::CryptoRng + rand::RngCore {}
impl<T: rand::CryptoRng + rand::RngCore> Rng for T {}

mod common {
    //! Common types used internally.

    pub use crate::{
        curve::PairingCurve,
        encoding::{Decode, Encode, Reader, Writer},
        Error, Rng,
    };
    pub use ff::Field;
    pub use group::{Group, GroupEncoding};
}
