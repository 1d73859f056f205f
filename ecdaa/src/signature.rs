//! Anonymous signatures by group members.
//!
//! A member signs by randomizing its credential `(A, B, C, D)` to `(R, S, T, W) = l·(A, B, C, D)`
//! and proving knowledge of `sk` with `W = sk·S`. Randomized credentials from the same member
//! share no element, so signatures are unlinkable unless they use the same basename, in which
//! case they carry the same pseudonym `K = sk·hash_to_G1(basename)`.

use crate::{
    credential::{credential_equations_hold, Credential},
    issuer::GroupPublicKey,
    revocation::{BasenameRevocationList, SecretKeyRevocationList},
    types::*,
};
use ecdaa_crypto::{
    impl_serde_via_encoding,
    proofs::{SchnorrProof, SCHNORR_NONCE_LENGTH},
};
use log::{debug, trace};
use zeroize::Zeroize;

/// An ECDAA signature `(R, S, T, W, c, s, n, K?)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature<C: PairingCurve> {
    r: C::G1,
    s: C::G1,
    t: C::G1,
    w: C::G1,
    proof: SchnorrProof<C>,
    pseudonym: Option<C::G1>,
}

fn signature_statement<'a, C: PairingCurve>(
    s: C::G1,
    w: C::G1,
    context: &'a [C::G1; 2],
    basename: Option<&'a [u8]>,
    message: &'a [u8],
) -> SchnorrStatement<'a, C> {
    SchnorrStatement {
        basepoint: s,
        public_value: w,
        context,
        basename,
        message,
    }
}

impl<C: PairingCurve> Signature<C> {
    /// Sign `message` with `key` under its `credential`. With a `basename`, the signature carries
    /// the member's pseudonym for that basename.
    ///
    /// Fails with [`Error::RandomnessFailure`], or with [`Error::HardwareError`] if `key` lives
    /// in a TPM that fails.
    pub fn sign<K: SchnorrSigner<C>>(
        message: &[u8],
        basename: Option<&[u8]>,
        key: &K,
        credential: &Credential<C>,
        rng: &mut impl Rng,
    ) -> Result<Self, Error> {
        trace!(
            "Signature::sign: >>> basename: {}",
            if basename.is_some() { "yes" } else { "no" }
        );
        let mut l = C::random_nonzero_scalar(rng)?;
        let [r, s, t, w] = credential.randomize(&l);
        l.zeroize();

        let context = [r, t];
        let (proof, pseudonym) = SchnorrProof::new(
            key,
            &signature_statement(s, w, &context, basename, message),
            rng,
        )?;
        trace!("Signature::sign: <<<");
        Ok(Self {
            r,
            s,
            t,
            w,
            proof,
            pseudonym,
        })
    }

    /// Verify the signature on `message` for the group `gpk`.
    ///
    /// Checks, in order:
    ///
    /// 1. the signature of knowledge, including that a pseudonym is present exactly when a
    ///    `basename` is given ([`Error::InvalidProof`]);
    /// 2. the randomized credential against `gpk` ([`Error::InvalidCredential`]);
    /// 3. that no key in `sk_revocation_list` made the signature ([`Error::Revoked`]);
    /// 4. that the pseudonym is not revoked for `basename` in `bsn_revocation_list`
    ///    ([`Error::Revoked`]).
    pub fn verify(
        &self,
        gpk: &GroupPublicKey<C>,
        sk_revocation_list: &SecretKeyRevocationList<C>,
        bsn_revocation_list: &BasenameRevocationList<C>,
        message: &[u8],
        basename: Option<&[u8]>,
    ) -> Result<(), Error> {
        trace!(
            "Signature::verify: >>> sk_rl: {}, bsn_rl: {}",
            sk_revocation_list.len(),
            bsn_revocation_list.len()
        );
        if bool::from(self.r.is_identity()) || bool::from(self.s.is_identity()) {
            debug!("Signature::verify: R or S is the identity");
            return Err(Error::InvalidProof);
        }
        if self.pseudonym.is_some() != basename.is_some() {
            debug!("Signature::verify: pseudonym presence does not match the basename");
            return Err(Error::InvalidProof);
        }
        let context = [self.r, self.t];
        let statement = signature_statement(self.s, self.w, &context, basename, message);
        if !self.proof.verify(&statement, self.pseudonym.as_ref()) {
            debug!("Signature::verify: signature of knowledge did not verify");
            return Err(Error::InvalidProof);
        }

        if !credential_equations_hold(gpk, &self.r, &self.s, &self.t, &self.w) {
            debug!("Signature::verify: randomized credential does not verify");
            return Err(Error::InvalidCredential);
        }

        if sk_revocation_list.is_revoked(&self.s, &self.w) {
            debug!("Signature::verify: signed by a revoked secret key");
            return Err(Error::Revoked);
        }
        if let (Some(basename), Some(pseudonym)) = (basename, self.pseudonym.as_ref()) {
            if bsn_revocation_list.is_revoked(basename, pseudonym) {
                debug!("Signature::verify: pseudonym is revoked for this basename");
                return Err(Error::Revoked);
            }
        }
        trace!("Signature::verify: <<<");
        Ok(())
    }

    /// The pseudonym `K`, present when the signature was made with a basename.
    pub fn pseudonym(&self) -> Option<&C::G1> {
        self.pseudonym.as_ref()
    }

    /// The randomized credential `(R, S, T, W)`.
    pub fn randomized_credential(&self) -> [&C::G1; 4] {
        [&self.r, &self.s, &self.t, &self.w]
    }

    /// The signature of knowledge `(c, s, n)`.
    pub fn proof(&self) -> &SchnorrProof<C> {
        &self.proof
    }
}

impl<C: PairingCurve> Encode for Signature<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.scalar::<C>(&self.proof.challenge());
        writer.scalar::<C>(&self.proof.response());
        writer.point(&self.r);
        writer.point(&self.s);
        writer.point(&self.t);
        writer.point(&self.w);
        writer.raw(self.proof.nonce());
        if let Some(pseudonym) = &self.pseudonym {
            writer.point(pseudonym);
        }
    }
}

impl<C: PairingCurve> Decode for Signature<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        let c = reader.scalar::<C>("signature challenge")?;
        let response = reader.scalar::<C>("signature response")?;
        let r = reader.point("signature R")?;
        let s = reader.point("signature S")?;
        let t = reader.point("signature T")?;
        let w = reader.point("signature W")?;
        let mut nonce = [0; SCHNORR_NONCE_LENGTH];
        nonce.copy_from_slice(reader.take(SCHNORR_NONCE_LENGTH, "signature nonce")?);
        let pseudonym = if reader.is_empty() {
            None
        } else {
            Some(reader.point("signature pseudonym")?)
        };
        Ok(Self {
            r,
            s,
            t,
            w,
            proof: SchnorrProof::from_parts(c, response, nonce),
            pseudonym,
        })
    }
}

impl_serde_via_encoding!(Signature);
