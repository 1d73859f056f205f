//! Proof that a credential's `D` was computed with the same scalar as its `B`.
//!
//! The issuer computes `B = (l·y)·P1` and `D = (l·y)·Q` for the member public key `Q`, and proves
//! equality of the discrete logarithms `log_P1(B) = log_Q(D)`. A member that holds its secret key
//! in software can check `D = sk·B` directly; a member whose key lives in a TPM cannot, and relies
//! on this proof instead.

use crate::{
    common::*,
    proofs::{Challenge, ChallengeBuilder, CREDENTIAL_PROOF_TAG},
};
use zeroize::Zeroize;

/// Fully constructed proof that `log_P1(B) = log_Q(D)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialProof<C: PairingCurve> {
    c: C::Scalar,
    s: C::Scalar,
}

/// A partially-built [`CredentialProof`].
#[derive(Debug)]
pub struct CredentialProofBuilder<C: PairingCurve> {
    r: C::Scalar,
    u: C::G1,
    v: C::G1,
}

impl<C: PairingCurve> Drop for CredentialProofBuilder<C> {
    fn drop(&mut self) {
        self.r.zeroize();
    }
}

fn credential_challenge<C: PairingCurve>(
    u: &C::G1,
    v: &C::G1,
    b: &C::G1,
    member_public_key: &C::G1,
    d: &C::G1,
) -> Challenge<C> {
    ChallengeBuilder::new(CREDENTIAL_PROOF_TAG)
        .with_point(u)
        .with_point(v)
        .with_point(&C::G1::generator())
        .with_point(b)
        .with_point(member_public_key)
        .with_point(d)
        .finish()
}

impl<C: PairingCurve> CredentialProofBuilder<C> {
    /// Run the commitment phase against the member public key `Q`.
    pub fn generate_proof_commitments(
        member_public_key: &C::G1,
        rng: &mut impl Rng,
    ) -> Result<Self, Error> {
        let r = C::random_scalar(rng)?;
        Ok(Self {
            r,
            u: C::G1::generator() * r,
            v: *member_public_key * r,
        })
    }

    /// Run the response phase for the witness `l·y`.
    pub fn generate_proof_response(
        self,
        witness: &C::Scalar,
        b: &C::G1,
        member_public_key: &C::G1,
        d: &C::G1,
    ) -> CredentialProof<C> {
        let c = credential_challenge::<C>(&self.u, &self.v, b, member_public_key, d).to_scalar();
        CredentialProof {
            c,
            s: self.r + c * witness,
        }
    }
}

impl<C: PairingCurve> CredentialProof<C> {
    /// Check the proof for `B`, `D` and the member public key `Q`.
    pub fn verify(&self, b: &C::G1, member_public_key: &C::G1, d: &C::G1) -> bool {
        let u = C::G1::generator() * self.s - *b * self.c;
        let v = *member_public_key * self.s - *d * self.c;
        credential_challenge::<C>(&u, &v, b, member_public_key, d).to_scalar() == self.c
    }
}

impl<C: PairingCurve> Encode for CredentialProof<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.scalar::<C>(&self.c);
        writer.scalar::<C>(&self.s);
    }
}

impl<C: PairingCurve> Decode for CredentialProof<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            c: reader.scalar::<C>("credential proof challenge")?,
            s: reader.scalar::<C>("credential proof response")?,
        })
    }
}
