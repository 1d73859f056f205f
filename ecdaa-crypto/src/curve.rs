//! The algebraic interface ECDAA is written against.
//!
//! Protocol code never names a concrete curve; it is generic over a [`PairingCurve`], which
//! bundles the scalar field, the two source groups, the pairing, hashing to G1, and the fixed-width
//! scalar encoding. [`Bls12381`] is the instantiation shipped with this crate.

use crate::{Error, Rng};
use bls12_381::{
    hash_to_curve::{ExpandMsgXmd, HashToCurve},
    multi_miller_loop, G1Affine, G1Projective, G2Affine, G2Prepared, G2Projective, Gt, Scalar,
};
use ff::{Field, PrimeField};
use group::{Group, GroupEncoding};
use std::{convert::TryFrom, fmt::Debug};
use zeroize::Zeroize;

/// A pairing-friendly curve, `e: G1 x G2 -> Gt`, with everything ECDAA needs from it.
pub trait PairingCurve: Copy + Clone + Debug + Default + PartialEq + Eq + Send + Sync + 'static {
    /// The scalar field shared by G1 and G2.
    type Scalar: PrimeField + Zeroize;
    /// The first source group. Credentials, signatures and member keys live here.
    type G1: Group<Scalar = Self::Scalar> + GroupEncoding;
    /// The second source group. Issuer keys live here.
    type G2: Group<Scalar = Self::Scalar> + GroupEncoding;
    /// The target group of the pairing.
    type Gt: PartialEq + Debug;

    /// Human-readable curve name, used in log output.
    const NAME: &'static str;

    /// Length in bytes of an encoded scalar.
    const SCALAR_LENGTH: usize;

    /// Compute the pairing `e(p, q)`.
    fn pairing(p: &Self::G1, q: &Self::G2) -> Self::Gt;

    /// Test whether `e(a, b) = e(c, d)`.
    fn pairings_match(a: &Self::G1, b: &Self::G2, c: &Self::G1, d: &Self::G2) -> bool {
        Self::pairing(a, b) == Self::pairing(c, d)
    }

    /// Hash arbitrary bytes to an element of G1 whose discrete logarithm is unknown.
    fn hash_to_g1(bytes: &[u8]) -> Self::G1;

    /// Reduce 64 uniformly random bytes to a scalar with negligible bias.
    fn scalar_from_uniform_bytes(bytes: &[u8; 64]) -> Self::Scalar;

    /// Encode a scalar as [`Self::SCALAR_LENGTH`] big-endian bytes.
    fn scalar_to_bytes(scalar: &Self::Scalar) -> Vec<u8>;

    /// Decode a big-endian scalar. Returns `None` on a wrong length or a non-canonical value.
    fn scalar_from_bytes(bytes: &[u8]) -> Option<Self::Scalar>;

    /// Draw a scalar uniformly at random.
    ///
    /// Uses [`rand::RngCore::try_fill_bytes`] so that a failing generator is reported rather than
    /// silently producing a predictable value.
    fn random_scalar(rng: &mut impl Rng) -> Result<Self::Scalar, Error> {
        let mut wide = [0u8; 64];
        rng.try_fill_bytes(&mut wide)
            .map_err(|_| Error::RandomnessFailure)?;
        let scalar = Self::scalar_from_uniform_bytes(&wide);
        wide.zeroize();
        Ok(scalar)
    }

    /// Draw a non-zero scalar uniformly at random.
    ///
    /// A generator that yields zero [`MAX_ZERO_SCALAR_DRAWS`] times in a row is reported as
    /// [`Error::RandomnessFailure`].
    fn random_nonzero_scalar(rng: &mut impl Rng) -> Result<Self::Scalar, Error> {
        for _ in 0..MAX_ZERO_SCALAR_DRAWS {
            let scalar = Self::random_scalar(rng)?;
            if !bool::from(scalar.is_zero()) {
                return Ok(scalar);
            }
        }
        Err(Error::RandomnessFailure)
    }

    /// Length in bytes of an encoded element of G1.
    fn g1_length() -> usize {
        <Self::G1 as GroupEncoding>::Repr::default().as_ref().len()
    }

    /// Length in bytes of an encoded element of G2.
    fn g2_length() -> usize {
        <Self::G2 as GroupEncoding>::Repr::default().as_ref().len()
    }
}

/// Number of draws [`PairingCurve::random_nonzero_scalar`] makes before giving up.
pub const MAX_ZERO_SCALAR_DRAWS: usize = 64;

/// Domain separation tag for hashing basenames onto G1.
pub const BLS12381_HASH_TO_G1_DST: &[u8] = b"ECDAA-V01-CS01-with-BLS12381G1_XMD:SHA3-256_SSWU_RO_";

/// The BLS12-381 curve, as implemented by the `bls12_381` crate.
///
/// Points use the crate's compressed encoding (48 bytes in G1, 96 bytes in G2); decoding checks
/// subgroup membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bls12381;

impl PairingCurve for Bls12381 {
    type Scalar = Scalar;
    type G1 = G1Projective;
    type G2 = G2Projective;
    type Gt = Gt;

    const NAME: &'static str = "BLS12-381";
    const SCALAR_LENGTH: usize = 32;

    fn pairing(p: &G1Projective, q: &G2Projective) -> Gt {
        bls12_381::pairing(&G1Affine::from(p), &G2Affine::from(q))
    }

    fn pairings_match(a: &G1Projective, b: &G2Projective, c: &G1Projective, d: &G2Projective) -> bool {
        // e(a, b) * e(-c, d) == 1, sharing one final exponentiation.
        let b = G2Prepared::from(G2Affine::from(b));
        let d = G2Prepared::from(G2Affine::from(d));
        multi_miller_loop(&[
            (&G1Affine::from(a), &b),
            (&G1Affine::from(-c), &d),
        ])
        .final_exponentiation()
            == Gt::identity()
    }

    fn hash_to_g1(bytes: &[u8]) -> G1Projective {
        <G1Projective as HashToCurve<ExpandMsgXmd<sha3::Sha3_256>>>::hash_to_curve(
            bytes,
            BLS12381_HASH_TO_G1_DST,
        )
    }

    fn scalar_from_uniform_bytes(bytes: &[u8; 64]) -> Scalar {
        Scalar::from_bytes_wide(bytes)
    }

    fn scalar_to_bytes(scalar: &Scalar) -> Vec<u8> {
        let mut bytes = scalar.to_bytes();
        bytes.reverse();
        bytes.to_vec()
    }

    fn scalar_from_bytes(bytes: &[u8]) -> Option<Scalar> {
        let mut le = <[u8; 32]>::try_from(bytes).ok()?;
        le.reverse();
        Scalar::from_bytes(&le).into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::rng;
    use ff::Field;

    #[test]
    fn encoded_lengths() {
        assert_eq!(Bls12381::g1_length(), 48);
        assert_eq!(Bls12381::g2_length(), 96);
        assert_eq!(Bls12381::SCALAR_LENGTH, 32);
    }

    #[test]
    fn scalar_encoding_is_big_endian() {
        let bytes = Bls12381::scalar_to_bytes(&Scalar::one());
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[31], 1);
        assert!(bytes[..31].iter().all(|b| *b == 0));

        let mut rng = rng();
        let scalar = Bls12381::random_scalar(&mut rng).unwrap();
        let decoded = Bls12381::scalar_from_bytes(&Bls12381::scalar_to_bytes(&scalar)).unwrap();
        assert_eq!(scalar, decoded);
    }

    #[test]
    fn non_canonical_scalars_are_rejected() {
        assert!(Bls12381::scalar_from_bytes(&[0xff; 32]).is_none());
        assert!(Bls12381::scalar_from_bytes(&[0x01; 31]).is_none());
    }

    #[test]
    fn pairings_match_agrees_with_pairing() {
        let mut rng = rng();
        let a = Bls12381::random_scalar(&mut rng).unwrap();
        let b = Bls12381::random_scalar(&mut rng).unwrap();
        let g1 = G1Projective::generator();
        let g2 = G2Projective::generator();

        // e(a*g1, b*g2) == e(ab*g1, g2)
        assert!(Bls12381::pairings_match(&(g1 * a), &(g2 * b), &(g1 * (a * b)), &g2));
        assert!(!Bls12381::pairings_match(&(g1 * a), &(g2 * b), &(g1 * a), &g2));
        assert_eq!(
            Bls12381::pairing(&(g1 * a), &(g2 * b)),
            Bls12381::pairing(&(g1 * (a * b)), &g2)
        );
    }

    #[test]
    fn hash_to_g1_is_deterministic_and_separating() {
        let p = Bls12381::hash_to_g1(b"basename");
        assert_eq!(p, Bls12381::hash_to_g1(b"basename"));
        assert_ne!(p, Bls12381::hash_to_g1(b"other basename"));
        assert!(!bool::from(p.is_identity()));
    }

    #[derive(Debug)]
    struct FailingRng;

    impl rand::RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.iter_mut().for_each(|b| *b = 0)
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl rand::CryptoRng for FailingRng {}

    #[test]
    fn failing_rng_is_reported() {
        assert_eq!(
            Bls12381::random_scalar(&mut FailingRng),
            Err(Error::RandomnessFailure)
        );
        assert_eq!(
            Bls12381::random_nonzero_scalar(&mut FailingRng),
            Err(Error::RandomnessFailure)
        );
    }

    /// Succeeds, but only ever produces zero bytes.
    #[derive(Debug)]
    struct StuckRng;

    impl rand::RngCore for StuckRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.iter_mut().for_each(|b| *b = 0)
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl rand::CryptoRng for StuckRng {}

    #[test]
    fn stuck_rng_gives_up_on_nonzero_scalar() {
        assert!(bool::from(Bls12381::random_scalar(&mut StuckRng).unwrap().is_zero()));
        assert_eq!(
            Bls12381::random_nonzero_scalar(&mut StuckRng),
            Err(Error::RandomnessFailure)
        );
    }
}
