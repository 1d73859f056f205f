//! Join requests, credentials and join responses.
//!
//! A [`Credential`] `(A, B, C, D)` satisfies
//!
//! - `e(A, Y) = e(B, P2)`, i.e. `B = y·A`;
//! - `e(C, P2) = e(A + D, X)`, i.e. `C = x·(A + D)`;
//! - `D = sk·B` for the member secret key `sk`.
//!
//! It is issued in a [`JoinResponse`] together with a
//! [`CredentialProof`](ecdaa_crypto::proofs::CredentialProof) tying `D` to the member public key.

use crate::{issuer::GroupPublicKey, issuer::IssuerSecretKey, nonce::IssuerNonce, types::*};
use ecdaa_crypto::{
    impl_serde_via_encoding,
    proofs::{CredentialProof, CredentialProofBuilder, SchnorrProof},
};
use log::{debug, trace};
use zeroize::Zeroize;

/// A member's credential from the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential<C: PairingCurve> {
    a: C::G1,
    b: C::G1,
    c: C::G1,
    d: C::G1,
}

impl<C: PairingCurve> Credential<C> {
    /// Issue a credential for the member public key `Q`, with a proof that `D` is bound to `Q`.
    pub(crate) fn issue(
        secret: &IssuerSecretKey<C>,
        member_public_key: &C::G1,
        rng: &mut impl Rng,
    ) -> Result<JoinResponse<C>, Error> {
        let p1 = C::G1::generator();
        let mut l = C::random_nonzero_scalar(rng)?;
        let mut ly = l * secret.y();

        let a = p1 * l;
        let b = p1 * ly;
        let d = *member_public_key * ly;
        let c = (a + d) * *secret.x();

        let proof = CredentialProofBuilder::generate_proof_commitments(member_public_key, rng)?
            .generate_proof_response(&ly, &b, member_public_key, &d);

        l.zeroize();
        ly.zeroize();

        Ok(JoinResponse {
            credential: Credential { a, b, c, d },
            proof,
        })
    }

    /// The element `A`.
    pub fn a(&self) -> &C::G1 {
        &self.a
    }

    /// The element `B = y·A`.
    pub fn b(&self) -> &C::G1 {
        &self.b
    }

    /// The element `C = x·(A + D)`.
    pub fn c(&self) -> &C::G1 {
        &self.c
    }

    /// The element `D = sk·B`.
    pub fn d(&self) -> &C::G1 {
        &self.d
    }

    /// Check the two pairing equations of the credential under the group public key. This does
    /// not check that `D` belongs to any particular member.
    pub fn is_valid(&self, gpk: &GroupPublicKey<C>) -> bool {
        credential_equations_hold(gpk, &self.a, &self.b, &self.c, &self.d)
    }

    /// Multiply every element by `l`, giving `(R, S, T, W) = (l·A, l·B, l·C, l·D)`.
    pub(crate) fn randomize(&self, l: &C::Scalar) -> [C::G1; 4] {
        [self.a * *l, self.b * *l, self.c * *l, self.d * *l]
    }
}

/// Check `e(a, Y) = e(b, P2)` and `e(c, P2) = e(a + d, X)` with `a` not the identity.
pub(crate) fn credential_equations_hold<C: PairingCurve>(
    gpk: &GroupPublicKey<C>,
    a: &C::G1,
    b: &C::G1,
    c: &C::G1,
    d: &C::G1,
) -> bool {
    let p2 = C::G2::generator();
    !bool::from(a.is_identity())
        && C::pairings_match(a, gpk.y(), b, &p2)
        && C::pairings_match(c, &p2, &(*a + *d), gpk.x())
}

impl<C: PairingCurve> Encode for Credential<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.point(&self.a);
        writer.point(&self.b);
        writer.point(&self.c);
        writer.point(&self.d);
    }
}

impl<C: PairingCurve> Decode for Credential<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            a: reader.point("credential A")?,
            b: reader.point("credential B")?,
            c: reader.point("credential C")?,
            d: reader.point("credential D")?,
        })
    }
}

/// A member's request to join: its public key `Q` and a signature of knowledge of `sk` over the
/// issuer's nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinRequest<C: PairingCurve> {
    public_key: C::G1,
    proof: SchnorrProof<C>,
}

fn join_statement<'a, C: PairingCurve>(
    public_key: C::G1,
    nonce: &'a IssuerNonce,
) -> SchnorrStatement<'a, C> {
    SchnorrStatement {
        basepoint: C::G1::generator(),
        public_value: public_key,
        context: &[],
        basename: None,
        message: nonce.as_bytes(),
    }
}

impl<C: PairingCurve> JoinRequest<C> {
    /// Build a join request for `nonce`, proving possession of the key behind `key`.
    ///
    /// Works for any [`SchnorrSigner`], so the key may live in software or in a TPM.
    pub fn new<K: SchnorrSigner<C>>(
        key: &K,
        nonce: &IssuerNonce,
        rng: &mut impl Rng,
    ) -> Result<Self, Error> {
        let public_key = key.public_key();
        let (proof, _) = SchnorrProof::new(key, &join_statement(public_key, nonce), rng)?;
        Ok(Self { public_key, proof })
    }

    /// The member public key `Q`.
    pub fn public_key(&self) -> &C::G1 {
        &self.public_key
    }

    /// Check the proof of possession against `nonce`.
    ///
    /// Fails with [`Error::InvalidProof`] if the proof does not verify or `Q` is the identity.
    pub fn verify(&self, nonce: &IssuerNonce) -> Result<(), Error> {
        if bool::from(self.public_key.is_identity()) {
            debug!("JoinRequest::verify: member public key is the identity");
            return Err(Error::InvalidProof);
        }
        if !self
            .proof
            .verify(&join_statement(self.public_key, nonce), None)
        {
            debug!("JoinRequest::verify: proof of possession did not verify");
            return Err(Error::InvalidProof);
        }
        Ok(())
    }
}

impl<C: PairingCurve> Encode for JoinRequest<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.point(&self.public_key);
        self.proof.encode(writer);
    }
}

impl<C: PairingCurve> Decode for JoinRequest<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            public_key: reader.point("member public key")?,
            proof: SchnorrProof::decode(reader)?,
        })
    }
}

/// The issuer's answer to a [`JoinRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinResponse<C: PairingCurve> {
    credential: Credential<C>,
    proof: CredentialProof<C>,
}

impl<C: PairingCurve> JoinResponse<C> {
    /// Validate the issued credential for the member public key `Q`.
    ///
    /// Fails with [`Error::InvalidProof`] if the credential proof does not verify (that is, `D`
    /// is not bound to `Q`), and with [`Error::InvalidCredential`] if `A` is the identity or a
    /// pairing equation fails.
    pub fn validate(&self, member_public_key: &C::G1, gpk: &GroupPublicKey<C>) -> Result<(), Error> {
        trace!("JoinResponse::validate: curve {}", C::NAME);
        let credential = &self.credential;
        if bool::from(credential.a.is_identity()) {
            debug!("JoinResponse::validate: credential A is the identity");
            return Err(Error::InvalidCredential);
        }
        if !self
            .proof
            .verify(&credential.b, member_public_key, &credential.d)
        {
            debug!("JoinResponse::validate: credential proof did not verify");
            return Err(Error::InvalidProof);
        }
        if !credential.is_valid(gpk) {
            debug!("JoinResponse::validate: credential pairing equations do not hold");
            return Err(Error::InvalidCredential);
        }
        Ok(())
    }

    /// The issued credential.
    pub fn credential(&self) -> &Credential<C> {
        &self.credential
    }

    /// The proof that `D` is bound to the member public key.
    pub fn proof(&self) -> &CredentialProof<C> {
        &self.proof
    }
}

impl<C: PairingCurve> Encode for JoinResponse<C> {
    fn encode(&self, writer: &mut Writer) {
        self.credential.encode(writer);
        self.proof.encode(writer);
    }
}

impl<C: PairingCurve> Decode for JoinResponse<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        Ok(Self {
            credential: Credential::decode(reader)?,
            proof: CredentialProof::decode(reader)?,
        })
    }
}

impl_serde_via_encoding!(Credential, JoinRequest, JoinResponse);
