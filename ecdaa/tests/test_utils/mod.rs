#![allow(dead_code)]

use ecdaa::{
    AwaitingNonce, BasenameRevocationList, Bls12381, Error, GroupPublicKey, Issuer, IssuerKeyPair,
    Member, MemberKeyPair, SecretKeyRevocationList, Signature,
};
use rand::SeedableRng;

pub type Rng = rand::rngs::StdRng;

// Seeded rngs for replicable tests: issuer, member and signing randomness.
pub fn issuer_rng() -> Rng {
    Rng::from_seed(*b"NEVER USE THIS FOR ANYTHING REAL")
}

pub fn member_rng() -> Rng {
    Rng::from_seed(*b"DON'T USE THIS FOR ANYTHING REAL")
}

pub fn signing_rng() -> Rng {
    Rng::from_seed(*b"SIGNING SEED, NOT FOR REAL USES.")
}

pub fn issuer() -> Issuer<Bls12381> {
    Issuer::new(IssuerKeyPair::generate(&mut issuer_rng()).unwrap())
}

/// Run the join protocol for a fresh software member.
pub fn join(
    issuer: &mut Issuer<Bls12381>,
    rng: &mut Rng,
) -> Member<Bls12381, MemberKeyPair<Bls12381>> {
    let key = MemberKeyPair::generate(rng).unwrap();
    let nonce = issuer.issue_nonce(rng).unwrap();
    let (pending, request) = AwaitingNonce::new(key).request(nonce, rng).unwrap();
    let response = issuer.process_join_request(&request, &nonce, rng).unwrap();
    pending
        .complete(&response, issuer.keypair().group_public_key())
        .unwrap()
}

/// Verify with empty revocation lists.
pub fn verify(
    signature: &Signature<Bls12381>,
    gpk: &GroupPublicKey<Bls12381>,
    message: &[u8],
    basename: Option<&[u8]>,
) -> Result<(), Error> {
    signature.verify(
        gpk,
        &SecretKeyRevocationList::new(),
        &BasenameRevocationList::new(),
        message,
        basename,
    )
}

/// An entropy source that is always unavailable.
#[derive(Debug)]
pub struct FailingRng;

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
