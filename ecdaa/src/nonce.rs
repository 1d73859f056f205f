//! Cryptographically random issuer nonces.
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length in bytes of an [`IssuerNonce`].
pub const NONCE_LENGTH: usize = 32;

/// A fresh random challenge from the issuer that a join request must be bound to.
///
/// A nonce should be used for at most one join; [`Issuer`](crate::issuer::Issuer) enforces this.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssuerNonce([u8; NONCE_LENGTH]);

impl IssuerNonce {
    /// Generate a new cryptographically random nonce with the given random number generator.
    pub fn new(rng: &mut impl Rng) -> Result<Self, Error> {
        let mut bytes = [0; NONCE_LENGTH];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|_| Error::RandomnessFailure)?;
        Ok(Self(bytes))
    }

    /// Wrap nonce bytes received from the issuer.
    pub fn from_bytes(bytes: [u8; NONCE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// The nonce bytes, as signed by a join request.
    pub fn as_bytes(&self) -> &[u8; NONCE_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for IssuerNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssuerNonce(")?;
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "..)")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::rng;

    #[test]
    fn nonces_are_fresh() {
        let mut rng = rng();
        let first = IssuerNonce::new(&mut rng).unwrap();
        let second = IssuerNonce::new(&mut rng).unwrap();
        assert_ne!(first, second);
        assert_eq!(IssuerNonce::from_bytes(*first.as_bytes()), first);
    }

    #[test]
    fn nonce_serializes_as_its_bytes() {
        let mut rng = rng();
        let nonce = IssuerNonce::new(&mut rng).unwrap();
        let bytes = bincode::serialize(&nonce).unwrap();
        assert_eq!(bytes, nonce.as_bytes().to_vec());
        assert_eq!(bincode::deserialize::<IssuerNonce>(&bytes).unwrap(), nonce);
    }
}
