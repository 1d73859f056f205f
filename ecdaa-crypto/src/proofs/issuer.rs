//! Proof that an issuer public key is well formed.
//!
//! Proves knowledge of `x` and `y` such that `X = x·P2` and `Y = y·P2`, where `P2` is the fixed
//! generator of G2. Without this proof a verifier cannot rule out a public key with `X` or `Y`
//! chosen so that arbitrary credentials pass the pairing checks.

use crate::{
    common::*,
    proofs::{Challenge, ChallengeBuilder, ISSUER_KEY_PROOF_TAG},
};
use zeroize::Zeroize;

/// Fully constructed proof of knowledge of the issuer secret key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerKeyProof<C: PairingCurve> {
    c: C::Scalar,
    sx: C::Scalar,
    sy: C::Scalar,
}

/// A partially-built [`IssuerKeyProof`].
///
/// Built up to (but not including) the challenge phase of a Schnorr proof.
#[derive(Debug)]
pub struct IssuerKeyProofBuilder<C: PairingCurve> {
    rx: C::Scalar,
    ry: C::Scalar,
    ux: C::G2,
    uy: C::G2,
}

impl<C: PairingCurve> Drop for IssuerKeyProofBuilder<C> {
    fn drop(&mut self) {
        self.rx.zeroize();
        self.ry.zeroize();
    }
}

fn issuer_challenge<C: PairingCurve>(ux: &C::G2, uy: &C::G2, x: &C::G2, y: &C::G2) -> Challenge<C> {
    ChallengeBuilder::new(ISSUER_KEY_PROOF_TAG)
        .with_point(ux)
        .with_point(uy)
        .with_point(&C::G2::generator())
        .with_point(x)
        .with_point(y)
        .finish()
}

impl<C: PairingCurve> IssuerKeyProofBuilder<C> {
    /// Run the commitment phase: choose `rx`, `ry` and commit to `rx·P2`, `ry·P2`.
    pub fn generate_proof_commitments(rng: &mut impl Rng) -> Result<Self, Error> {
        let rx = C::random_scalar(rng)?;
        let ry = C::random_scalar(rng)?;
        let p2 = C::G2::generator();
        Ok(Self {
            rx,
            ry,
            ux: p2 * rx,
            uy: p2 * ry,
        })
    }

    /// Compute the challenge for the public key `(X, Y)` and run the response phase.
    pub fn generate_proof_response(
        self,
        x: &C::Scalar,
        y: &C::Scalar,
        public_x: &C::G2,
        public_y: &C::G2,
    ) -> IssuerKeyProof<C> {
        let c = issuer_challenge::<C>(&self.ux, &self.uy, public_x, public_y).to_scalar();
        IssuerKeyProof {
            c,
            sx: self.rx + c * x,
            sy: self.ry + c * y,
        }
    }
}

impl<C: PairingCurve> IssuerKeyProof<C> {
    /// Prove knowledge of `x` and `y` for the public key `(X, Y) = (x·P2, y·P2)`.
    pub fn new(
        x: &C::Scalar,
        y: &C::Scalar,
        public_x: &C::G2,
        public_y: &C::G2,
        rng: &mut impl Rng,
    ) -> Result<Self, Error> {
        Ok(IssuerKeyProofBuilder::generate_proof_commitments(rng)?
            .generate_proof_response(x, y, public_x, public_y))
    }

    /// Check the proof against the public key `(X, Y)`.
    ///
    /// Recomputes the commitments as `sx·P2 - c·X` and `sy·P2 - c·Y` and compares challenges.
    pub fn verify(&self, public_x: &C::G2, public_y: &C::G2) -> bool {
        let p2 = C::G2::generator();
        let ux = p2 * self.sx - *public_x * self.c;
        let uy = p2 * self.sy - *public_y * self.c;
        issuer_challenge::<C>(&ux, &uy, public_x, public_y).to_scalar() == self.c
    }
}

impl<C: PairingCurve> Encode for IssuerKeyProof<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.scalar::<C>(&self.c);
        writer.scalar::<C>(&self.sx);
        writer.scalar::<C>(&self.sy);
    }
}

impl<C: PairingCurve> Decode for IssuerKeyProof<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            c: reader.scalar::<C>("issuer key proof challenge")?,
            sx: reader.scalar::<C>("issuer key proof response sx")?,
            sy: reader.scalar::<C>("issuer key proof response sy")?,
        })
    }
}
