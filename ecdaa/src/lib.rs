/*!
This crate implements ECDAA, elliptic-curve Direct Anonymous Attestation \[1\], on top of the
primitives in `ecdaa-crypto`.

An *issuer* certifies *members* of a group through a nonce-based join exchange. A member can then
sign messages so that a verifier learns only that *some* non-revoked member of the group signed.
Signatures by the same member are unlinkable, unless they are made under the same *basename*, in
which case they carry the same pseudonym.

Member keys may be held in software ([`MemberKeyPair`]) or inside a TPM ([`tpm::TpmMemberKey`]);
every member-side operation is generic over the
[`SchnorrSigner`](ecdaa_crypto::proofs::SchnorrSigner) capability and works with either.

All types are generic over the pairing-friendly curve; [`Bls12381`] is provided.

 # References

 1: FIDO ECDAA Algorithm, FIDO Alliance Implementation Draft.
 URL: https://fidoalliance.org/specs/fido-v2.0-id-20180227/fido-ecdaa-algorithm-v2.0-id-20180227.html
 */
#![warn(missing_docs)]
#![warn(missing_copy_implementations, missing_debug_implementations)]
#![warn(unused_qualifications, unused_results)]
#![warn(future_incompatible)]
#![warn(unused)]
#![forbid(rustdoc::broken_intra_doc_links)]
pub mod credential;
pub mod issuer;
pub mod member;
pub mod revocation;
pub mod signature;
pub mod tpm;

pub use credential::{Credential, JoinRequest, JoinResponse};
pub use ecdaa_crypto::{
    encoding::{Decode, Encode},
    Bls12381, Error, PairingCurve, Rng,
};
pub use issuer::{GroupPublicKey, Issuer, IssuerKeyPair, IssuerPublicKey, IssuerSecretKey};
pub use member::{AwaitingNonce, Member, MemberKey, MemberKeyPair, MemberSecretKey, RequestBuilt};
pub use nonce::{IssuerNonce, NONCE_LENGTH};
pub use revocation::{BasenameRevocationList, SecretKeyRevocationList};
pub use signature::Signature;

mod nonce;

#[allow(unused)]
mod types {
    pub use ecdaa_crypto::{
        encoding::{Decode, Encode, Reader, Writer},
        proofs::{SchnorrSigner, SchnorrStatement},
        Error, PairingCurve, Rng,
    };
    pub use ff::Field;
    pub use group::{Group, GroupEncoding};
}
