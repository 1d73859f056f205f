//! Schnorr signature of knowledge of a member secret key.
//!
//! For a basepoint `B` and public value `W = sk·B`, the signer proves knowledge of `sk` while
//! signing a message. When a basename is given, it also outputs the pseudonym `K = sk·P_bsn` for
//! `P_bsn = hash_to_G1(basename)` and proves it uses the same `sk`.
//!
//! The proof is split the way a TPM splits `TPM2_Commit` and `TPM2_Sign`:
//!
//! 1. commit: the signer picks a fresh `k` and returns `E = k·B` and, with a basename,
//!    `K = sk·P_bsn` and `L = k·P_bsn`;
//! 2. the host hashes the commitments and all public inputs into a [`CommitmentDigest`] `c'`;
//! 3. respond: the signer picks a fresh nonce `n`, sets `c = H(n ‖ c')` and returns
//!    `s = k + c·sk` together with `n`.
//!
//! The proof is `(c, s, n)`. Both phases go through the [`SchnorrSigner`] trait, which is
//! implemented by software keys and by TPM-resident keys alike.

use crate::{
    common::*,
    proofs::{
        ChallengeBuilder, ChallengeInput, CommitmentDigest, NONCE_BINDING_TAG,
        SCHNORR_COMMITMENT_TAG,
    },
};
use log::debug;
use std::fmt;
use zeroize::Zeroize;

/// Length in bytes of the signer's nonce `n`.
pub const SCHNORR_NONCE_LENGTH: usize = 32;

/// The public inputs of a Schnorr signature of knowledge.
#[derive(Debug, Clone, Copy)]
pub struct SchnorrStatement<'a, C: PairingCurve> {
    /// The basepoint `B`.
    pub basepoint: C::G1,
    /// The public value `W = sk·B`.
    pub public_value: C::G1,
    /// Further public points the proof is bound to.
    pub context: &'a [C::G1],
    /// The basename, if a pseudonym is part of the proof.
    pub basename: Option<&'a [u8]>,
    /// The signed message.
    pub message: &'a [u8],
}

/// Absorbs the points of the statement: `B`, `W`, then the context in order.
impl<'a, C: PairingCurve> ChallengeInput for SchnorrStatement<'a, C> {
    fn consume(&self, builder: &mut ChallengeBuilder) {
        builder.consume_point(&self.basepoint);
        builder.consume_point(&self.public_value);
        for point in self.context {
            builder.consume_point(point);
        }
    }
}

/// The basename part of a [`SchnorrCommitment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasenameCommitment<C: PairingCurve> {
    /// The pseudonym `K = sk·P_bsn`.
    pub pseudonym: C::G1,
    /// The commitment `L = k·P_bsn`.
    pub l: C::G1,
}

/// Output of the commit phase of a [`SchnorrSigner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrCommitment<C: PairingCurve> {
    /// The commitment `E = k·B`.
    pub e: C::G1,
    /// Present exactly when a basename point was given to the commit phase.
    pub basename: Option<BasenameCommitment<C>>,
}

/// Output of the respond phase of a [`SchnorrSigner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrResponse<C: PairingCurve> {
    /// The signer's fresh nonce `n`.
    pub nonce: [u8; SCHNORR_NONCE_LENGTH],
    /// The response `s = k + c·sk` for `c = H(n ‖ c')`.
    pub s: C::Scalar,
}

/// Capability to produce Schnorr signatures of knowledge under a member secret key.
///
/// The secret key itself is never exposed through this trait, which lets a TPM keep it.
pub trait SchnorrSigner<C: PairingCurve> {
    /// State carried from [`commit`](SchnorrSigner::commit) to
    /// [`respond`](SchnorrSigner::respond). It must be used at most once.
    type Ephemeral: fmt::Debug;

    /// The member public key `Q = sk·P1`.
    fn public_key(&self) -> C::G1;

    /// Commit phase. Chooses a fresh `k` and returns `E = k·basepoint`, plus `K = sk·P_bsn` and
    /// `L = k·P_bsn` when `basename_point` is given.
    fn commit(
        &self,
        basepoint: &C::G1,
        basename_point: Option<&C::G1>,
        rng: &mut impl Rng,
    ) -> Result<(Self::Ephemeral, SchnorrCommitment<C>), Error>;

    /// Respond phase. Chooses a fresh nonce `n` and returns `(n, s = k + H(n ‖ digest)·sk)`.
    fn respond(
        &self,
        ephemeral: Self::Ephemeral,
        digest: &CommitmentDigest,
        rng: &mut impl Rng,
    ) -> Result<SchnorrResponse<C>, Error>;
}

impl<'a, C: PairingCurve, K: SchnorrSigner<C>> SchnorrSigner<C> for &'a K {
    type Ephemeral = K::Ephemeral;

    fn public_key(&self) -> C::G1 {
        (**self).public_key()
    }

    fn commit(
        &self,
        basepoint: &C::G1,
        basename_point: Option<&C::G1>,
        rng: &mut impl Rng,
    ) -> Result<(Self::Ephemeral, SchnorrCommitment<C>), Error> {
        (**self).commit(basepoint, basename_point, rng)
    }

    fn respond(
        &self,
        ephemeral: Self::Ephemeral,
        digest: &CommitmentDigest,
        rng: &mut impl Rng,
    ) -> Result<SchnorrResponse<C>, Error> {
        (**self).respond(ephemeral, digest, rng)
    }
}

/// Bind the signer's nonce to a commitment digest, giving the challenge `c = H(n ‖ c')`.
pub fn bind_nonce<C: PairingCurve>(
    nonce: &[u8; SCHNORR_NONCE_LENGTH],
    digest: &CommitmentDigest,
) -> C::Scalar {
    ChallengeBuilder::new(NONCE_BINDING_TAG)
        .with_bytes(nonce)
        .with_bytes(digest.as_bytes())
        .finish::<C>()
        .to_scalar()
}

/// The ephemeral scalar `k` of a signer that holds its secret key in memory.
pub struct SoftwareEphemeral<C: PairingCurve>(C::Scalar);

impl<C: PairingCurve> fmt::Debug for SoftwareEphemeral<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SoftwareEphemeral(..)")
    }
}

impl<C: PairingCurve> Drop for SoftwareEphemeral<C> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Commit phase for a signer holding `secret` in memory.
pub fn commit_with_secret<C: PairingCurve>(
    secret: &C::Scalar,
    basepoint: &C::G1,
    basename_point: Option<&C::G1>,
    rng: &mut impl Rng,
) -> Result<(SoftwareEphemeral<C>, SchnorrCommitment<C>), Error> {
    let k = C::random_nonzero_scalar(rng)?;
    let basename = basename_point.map(|point| BasenameCommitment {
        pseudonym: *point * *secret,
        l: *point * k,
    });
    Ok((
        SoftwareEphemeral(k),
        SchnorrCommitment {
            e: *basepoint * k,
            basename,
        },
    ))
}

/// Respond phase for a signer holding `secret` in memory.
pub fn respond_with_secret<C: PairingCurve>(
    secret: &C::Scalar,
    ephemeral: SoftwareEphemeral<C>,
    digest: &CommitmentDigest,
    rng: &mut impl Rng,
) -> Result<SchnorrResponse<C>, Error> {
    let mut nonce = [0; SCHNORR_NONCE_LENGTH];
    rng.try_fill_bytes(&mut nonce)
        .map_err(|_| Error::RandomnessFailure)?;
    let c = bind_nonce::<C>(&nonce, digest);
    Ok(SchnorrResponse {
        nonce,
        s: ephemeral.0 + c * secret,
    })
}

/// Everything the commitment digest covers beyond `E` when a basename is used.
struct BasenameInputs<'a, C: PairingCurve> {
    basename: &'a [u8],
    point: C::G1,
    commitment: BasenameCommitment<C>,
}

fn commitment_digest<C: PairingCurve>(
    statement: &SchnorrStatement<'_, C>,
    e: &C::G1,
    basename: Option<BasenameInputs<'_, C>>,
) -> CommitmentDigest {
    let mut builder = ChallengeBuilder::new(SCHNORR_COMMITMENT_TAG);
    builder.consume_point(e);
    builder.consume(statement);
    match basename {
        Some(inputs) => {
            builder.consume_bytes([1u8]);
            builder.consume_point(&inputs.commitment.l);
            builder.consume_point(&inputs.point);
            builder.consume_point(&inputs.commitment.pseudonym);
            builder.consume_length_prefixed(inputs.basename);
        }
        None => builder.consume_bytes([0u8]),
    }
    builder.consume_length_prefixed(statement.message);
    builder.finish_digest()
}

/// A [`SchnorrProof`] after the commit phase, holding the signer's ephemeral state.
#[derive(Debug)]
pub struct SchnorrProofBuilder<'a, C: PairingCurve, S: SchnorrSigner<C>> {
    signer: &'a S,
    ephemeral: S::Ephemeral,
    commitment: SchnorrCommitment<C>,
    digest: CommitmentDigest,
}

impl<'a, C: PairingCurve, S: SchnorrSigner<C>> SchnorrProofBuilder<'a, C, S> {
    /// Run the commit phase on `signer` and digest the commitment with the statement.
    ///
    /// Fails with [`Error::HardwareError`] if the signer's commitment does not match the
    /// statement's use of a basename.
    pub fn generate_proof_commitments(
        signer: &'a S,
        statement: &SchnorrStatement<'_, C>,
        rng: &mut impl Rng,
    ) -> Result<Self, Error> {
        let basename_point = statement.basename.map(C::hash_to_g1);
        let (ephemeral, commitment) =
            signer.commit(&statement.basepoint, basename_point.as_ref(), rng)?;

        let basename = match (statement.basename, basename_point, commitment.basename) {
            (Some(basename), Some(point), Some(commitment)) => Some(BasenameInputs {
                basename,
                point,
                commitment,
            }),
            (None, None, None) => None,
            _ => {
                debug!(
                    "SchnorrProofBuilder::generate_proof_commitments: signer ignored the basename"
                );
                return Err(Error::HardwareError(
                    "signer commitment does not match the basename".into(),
                ));
            }
        };
        let digest = commitment_digest(statement, &commitment.e, basename);

        Ok(Self {
            signer,
            ephemeral,
            commitment,
            digest,
        })
    }

    /// The pseudonym `K`, if the statement has a basename.
    pub fn pseudonym(&self) -> Option<C::G1> {
        self.commitment.basename.map(|basename| basename.pseudonym)
    }

    /// The digest `c'` the signer will respond to.
    pub fn digest(&self) -> &CommitmentDigest {
        &self.digest
    }

    /// Run the respond phase on the signer and complete the proof.
    pub fn generate_proof_response(self, rng: &mut impl Rng) -> Result<SchnorrProof<C>, Error> {
        let response = self.signer.respond(self.ephemeral, &self.digest, rng)?;
        Ok(SchnorrProof {
            c: bind_nonce::<C>(&response.nonce, &self.digest),
            s: response.s,
            nonce: response.nonce,
        })
    }
}

/// Fully constructed Schnorr signature of knowledge `(c, s, n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrProof<C: PairingCurve> {
    c: C::Scalar,
    s: C::Scalar,
    nonce: [u8; SCHNORR_NONCE_LENGTH],
}

impl<C: PairingCurve> SchnorrProof<C> {
    /// Produce a proof for `statement` with `signer`, returning it with the pseudonym if the
    /// statement has a basename.
    pub fn new<S: SchnorrSigner<C>>(
        signer: &S,
        statement: &SchnorrStatement<'_, C>,
        rng: &mut impl Rng,
    ) -> Result<(Self, Option<C::G1>), Error> {
        let builder = SchnorrProofBuilder::generate_proof_commitments(signer, statement, rng)?;
        let pseudonym = builder.pseudonym();
        Ok((builder.generate_proof_response(rng)?, pseudonym))
    }

    /// Reassemble a proof from its parts.
    pub fn from_parts(c: C::Scalar, s: C::Scalar, nonce: [u8; SCHNORR_NONCE_LENGTH]) -> Self {
        Self { c, s, nonce }
    }

    /// The challenge `c`.
    pub fn challenge(&self) -> C::Scalar {
        self.c
    }

    /// The response `s`.
    pub fn response(&self) -> C::Scalar {
        self.s
    }

    /// The signer's nonce `n`.
    pub fn nonce(&self) -> &[u8; SCHNORR_NONCE_LENGTH] {
        &self.nonce
    }

    /// Check the proof against `statement`. `pseudonym` must be present exactly when the
    /// statement has a basename.
    pub fn verify(&self, statement: &SchnorrStatement<'_, C>, pseudonym: Option<&C::G1>) -> bool {
        let e = statement.basepoint * self.s - statement.public_value * self.c;
        let basename = match (statement.basename, pseudonym) {
            (Some(basename), Some(pseudonym)) => {
                let point = C::hash_to_g1(basename);
                Some(BasenameInputs {
                    basename,
                    point,
                    commitment: BasenameCommitment {
                        pseudonym: *pseudonym,
                        l: point * self.s - *pseudonym * self.c,
                    },
                })
            }
            (None, None) => None,
            _ => return false,
        };
        let digest = commitment_digest(statement, &e, basename);
        bind_nonce::<C>(&self.nonce, &digest) == self.c
    }
}

impl<C: PairingCurve> Encode for SchnorrProof<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.scalar::<C>(&self.c);
        writer.scalar::<C>(&self.s);
        writer.raw(&self.nonce);
    }
}

impl<C: PairingCurve> Decode for SchnorrProof<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        let c = reader.scalar::<C>("schnorr challenge")?;
        let s = reader.scalar::<C>("schnorr response")?;
        let mut nonce = [0; SCHNORR_NONCE_LENGTH];
        nonce.copy_from_slice(reader.take(SCHNORR_NONCE_LENGTH, "schnorr nonce")?);
        Ok(Self { c, s, nonce })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{curve::Bls12381, test::rng};
    use bls12_381::{G1Projective, Scalar};

    #[derive(Debug)]
    struct TestKey(Scalar);

    impl SchnorrSigner<Bls12381> for TestKey {
        type Ephemeral = SoftwareEphemeral<Bls12381>;

        fn public_key(&self) -> G1Projective {
            G1Projective::generator() * self.0
        }

        fn commit(
            &self,
            basepoint: &G1Projective,
            basename_point: Option<&G1Projective>,
            rng: &mut impl Rng,
        ) -> Result<(Self::Ephemeral, SchnorrCommitment<Bls12381>), Error> {
            commit_with_secret::<Bls12381>(&self.0, basepoint, basename_point, rng)
        }

        fn respond(
            &self,
            ephemeral: Self::Ephemeral,
            digest: &CommitmentDigest,
            rng: &mut impl Rng,
        ) -> Result<SchnorrResponse<Bls12381>, Error> {
            respond_with_secret::<Bls12381>(&self.0, ephemeral, digest, rng)
        }
    }

    fn key(rng: &mut impl Rng) -> TestKey {
        TestKey(Bls12381::random_nonzero_scalar(rng).unwrap())
    }

    #[test]
    fn proof_verifies_without_basename() {
        let mut rng = rng();
        let key = key(&mut rng);
        let basepoint = Bls12381::hash_to_g1(b"basepoint");
        let context = [Bls12381::hash_to_g1(b"context")];
        let statement = SchnorrStatement::<Bls12381> {
            basepoint,
            public_value: basepoint * key.0,
            context: &context,
            basename: None,
            message: b"message",
        };

        let (proof, pseudonym) = SchnorrProof::new(&key, &statement, &mut rng).unwrap();
        assert!(pseudonym.is_none());
        assert!(proof.verify(&statement, None));

        let other_message = SchnorrStatement {
            message: b"other message",
            ..statement
        };
        assert!(!proof.verify(&other_message, None));

        let points = [Bls12381::hash_to_g1(b"other context")];
        let other_context = SchnorrStatement {
            context: &points,
            ..statement
        };
        assert!(!proof.verify(&other_context, None));
    }

    #[test]
    fn proof_verifies_with_basename() {
        let mut rng = rng();
        let key = key(&mut rng);
        let statement = SchnorrStatement::<Bls12381> {
            basepoint: G1Projective::generator(),
            public_value: key.public_key(),
            context: &[],
            basename: Some(&b"basename"[..]),
            message: b"message",
        };

        let (proof, pseudonym) = SchnorrProof::new(&key, &statement, &mut rng).unwrap();
        let pseudonym = pseudonym.unwrap();
        assert_eq!(pseudonym, Bls12381::hash_to_g1(b"basename") * key.0);
        assert!(proof.verify(&statement, Some(&pseudonym)));

        // Missing or wrong pseudonyms are rejected.
        assert!(!proof.verify(&statement, None));
        assert!(!proof.verify(&statement, Some(&G1Projective::generator())));

        let other_basename = SchnorrStatement {
            basename: Some(&b"other basename"[..]),
            ..statement
        };
        assert!(!proof.verify(&other_basename, Some(&pseudonym)));

        let no_basename = SchnorrStatement {
            basename: None,
            ..statement
        };
        assert!(!proof.verify(&no_basename, Some(&pseudonym)));
    }

    #[test]
    fn proof_with_wrong_key_fails() {
        let mut rng = rng();
        let key1 = key(&mut rng);
        let key2 = key(&mut rng);
        let statement = SchnorrStatement::<Bls12381> {
            basepoint: G1Projective::generator(),
            public_value: key1.public_key(),
            context: &[],
            basename: None,
            message: b"message",
        };

        let (proof, _) = SchnorrProof::new(&key2, &statement, &mut rng).unwrap();
        assert!(!proof.verify(&statement, None));
    }

    #[test]
    fn challenge_is_bound_to_nonce() {
        let mut rng = rng();
        let key = key(&mut rng);
        let statement = SchnorrStatement::<Bls12381> {
            basepoint: G1Projective::generator(),
            public_value: key.public_key(),
            context: &[],
            basename: None,
            message: b"message",
        };

        let (proof, _) = SchnorrProof::new(&key, &statement, &mut rng).unwrap();
        let mut nonce = *proof.nonce();
        nonce[0] ^= 1;
        let tampered = SchnorrProof::from_parts(proof.challenge(), proof.response(), nonce);
        assert!(!tampered.verify(&statement, None));
    }

    #[test]
    fn proof_encoding_round_trips() {
        let mut rng = rng();
        let key = key(&mut rng);
        let statement = SchnorrStatement::<Bls12381> {
            basepoint: G1Projective::generator(),
            public_value: key.public_key(),
            context: &[],
            basename: None,
            message: b"message",
        };

        let (proof, _) = SchnorrProof::new(&key, &statement, &mut rng).unwrap();
        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), 32 + 32 + SCHNORR_NONCE_LENGTH);
        assert_eq!(SchnorrProof::<Bls12381>::from_bytes(&bytes).unwrap(), proof);
    }

    /// Ignores the basename point it is asked to commit to.
    #[derive(Debug)]
    struct ForgetfulKey(TestKey);

    impl SchnorrSigner<Bls12381> for ForgetfulKey {
        type Ephemeral = SoftwareEphemeral<Bls12381>;

        fn public_key(&self) -> G1Projective {
            self.0.public_key()
        }

        fn commit(
            &self,
            basepoint: &G1Projective,
            _basename_point: Option<&G1Projective>,
            rng: &mut impl Rng,
        ) -> Result<(Self::Ephemeral, SchnorrCommitment<Bls12381>), Error> {
            self.0.commit(basepoint, None, rng)
        }

        fn respond(
            &self,
            ephemeral: Self::Ephemeral,
            digest: &CommitmentDigest,
            rng: &mut impl Rng,
        ) -> Result<SchnorrResponse<Bls12381>, Error> {
            self.0.respond(ephemeral, digest, rng)
        }
    }

    #[test]
    fn signer_ignoring_basename_is_a_hardware_error() {
        let mut rng = rng();
        let key = ForgetfulKey(key(&mut rng));
        let statement = SchnorrStatement::<Bls12381> {
            basepoint: G1Projective::generator(),
            public_value: key.public_key(),
            context: &[],
            basename: Some(&b"basename"[..]),
            message: b"message",
        };
        assert!(matches!(
            SchnorrProof::new(&key, &statement, &mut rng),
            Err(Error::HardwareError(_))
        ));
    }
}
