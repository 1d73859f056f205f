//! Schnorr-style zero-knowledge proofs used by ECDAA.
//!
//! All proofs are made non-interactive with the Fiat-Shamir heuristic, and follow the same
//! two-phase shape: a builder runs the commitment phase (`generate_proof_commitments`), a
//! [`Challenge`] is derived from the commitments and the public inputs, and the builder is consumed
//! by the response phase (`generate_proof_response`).
//!
//! - [`IssuerKeyProof`]: the issuer knows the discrete logarithms `x`, `y` of its public key
//!   `X = x·P2`, `Y = y·P2`.
//! - [`CredentialProof`]: the issuer used one scalar `l·y` for both `B = (l·y)·P1` and
//!   `D = (l·y)·Q`, so a credential's `D` is bound to the member key `Q`.
//! - [`SchnorrProof`]: a signature of knowledge of a member secret key `sk` over a message,
//!   optionally with a basename pseudonym. Producing it goes through the [`SchnorrSigner`]
//!   capability so that the secret may live in software or inside a TPM.

mod challenge;
mod credential;
mod issuer;
mod schnorr;

pub use challenge::{Challenge, ChallengeBuilder, ChallengeInput, CommitmentDigest};
pub use credential::{CredentialProof, CredentialProofBuilder};
pub use issuer::{IssuerKeyProof, IssuerKeyProofBuilder};
pub use schnorr::{
    bind_nonce, commit_with_secret, respond_with_secret, BasenameCommitment, SchnorrCommitment,
    SchnorrProof, SchnorrProofBuilder, SchnorrResponse, SchnorrSigner, SchnorrStatement,
    SoftwareEphemeral, SCHNORR_NONCE_LENGTH,
};

/// Domain separation tag for the issuer key proof challenge.
pub const ISSUER_KEY_PROOF_TAG: &[u8] = b"ECDAA issuer key proof";

/// Domain separation tag for the credential proof challenge.
pub const CREDENTIAL_PROOF_TAG: &[u8] = b"ECDAA credential proof";

/// Domain separation tag for the digest over a Schnorr commitment and its public inputs.
pub const SCHNORR_COMMITMENT_TAG: &[u8] = b"ECDAA schnorr commitment";

/// Domain separation tag for binding the signer's nonce to a commitment digest.
pub const NONCE_BINDING_TAG: &[u8] = b"ECDAA nonce binding";
