/*!
The issuer: key generation, the public key proof, and credential issuance.

The issuer secret key is a pair of scalars `(x, y)`; the [`GroupPublicKey`] is `(X, Y) = (x·P2,
y·P2)`. The full [`IssuerPublicKey`] additionally carries an
[`IssuerKeyProof`](ecdaa_crypto::proofs::IssuerKeyProof) of knowledge of `x` and `y`, which any
party can check before trusting the group public key.

Nothing in this module ever sees a member secret key: credentials are issued against a
[`JoinRequest`], which carries only the member public key and a proof of possession.
*/
use crate::{
    credential::{Credential, JoinRequest, JoinResponse},
    nonce::IssuerNonce,
    types::*,
};
use ecdaa_crypto::{impl_serde_via_encoding, proofs::IssuerKeyProof};
use log::{debug, trace};
use std::{collections::HashSet, fmt};
use zeroize::Zeroize;

/// The issuer's secret key `(x, y)`.
pub struct IssuerSecretKey<C: PairingCurve> {
    x: C::Scalar,
    y: C::Scalar,
}

impl<C: PairingCurve> IssuerSecretKey<C> {
    fn generate(rng: &mut impl Rng) -> Result<Self, Error> {
        Ok(Self {
            x: C::random_nonzero_scalar(rng)?,
            y: C::random_nonzero_scalar(rng)?,
        })
    }

    pub(crate) fn x(&self) -> &C::Scalar {
        &self.x
    }

    pub(crate) fn y(&self) -> &C::Scalar {
        &self.y
    }
}

impl<C: PairingCurve> Drop for IssuerSecretKey<C> {
    fn drop(&mut self) {
        self.x.zeroize();
        self.y.zeroize();
    }
}

impl<C: PairingCurve> fmt::Debug for IssuerSecretKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IssuerSecretKey(..)")
    }
}

impl<C: PairingCurve> Encode for IssuerSecretKey<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.scalar::<C>(&self.x);
        writer.scalar::<C>(&self.y);
    }
}

impl<C: PairingCurve> Decode for IssuerSecretKey<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        let key = Self {
            x: reader.scalar::<C>("issuer secret x")?,
            y: reader.scalar::<C>("issuer secret y")?,
        };
        if bool::from(key.x.is_zero()) || bool::from(key.y.is_zero()) {
            return Err(Error::MalformedInput(
                "issuer secret key scalar is zero".into(),
            ));
        }
        Ok(key)
    }
}

/// The part of the issuer public key that verifiers need: `(X, Y) = (x·P2, y·P2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupPublicKey<C: PairingCurve> {
    x: C::G2,
    y: C::G2,
}

impl<C: PairingCurve> GroupPublicKey<C> {
    /// The element `X = x·P2`.
    pub fn x(&self) -> &C::G2 {
        &self.x
    }

    /// The element `Y = y·P2`.
    pub fn y(&self) -> &C::G2 {
        &self.y
    }
}

impl<C: PairingCurve> Encode for GroupPublicKey<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.point(&self.x);
        writer.point(&self.y);
    }
}

impl<C: PairingCurve> Decode for GroupPublicKey<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        let gpk = Self {
            x: reader.point("group public key X")?,
            y: reader.point("group public key Y")?,
        };
        if bool::from(gpk.x.is_identity()) || bool::from(gpk.y.is_identity()) {
            return Err(Error::MalformedInput(
                "group public key element is the identity".into(),
            ));
        }
        Ok(gpk)
    }
}

/// The issuer public key: the [`GroupPublicKey`] and a proof that it is well formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerPublicKey<C: PairingCurve> {
    gpk: GroupPublicKey<C>,
    proof: IssuerKeyProof<C>,
}

impl<C: PairingCurve> IssuerPublicKey<C> {
    /// Check the proof of knowledge of the secret key behind the group public key.
    pub fn verify(&self) -> bool {
        self.proof.verify(&self.gpk.x, &self.gpk.y)
    }

    /// Extract the group public key.
    pub fn group_public_key(&self) -> &GroupPublicKey<C> {
        &self.gpk
    }
}

impl<C: PairingCurve> Encode for IssuerPublicKey<C> {
    fn encode(&self, writer: &mut Writer) {
        self.gpk.encode(writer);
        self.proof.encode(writer);
    }
}

impl<C: PairingCurve> Decode for IssuerPublicKey<C> {
    /// Decodes and verifies an issuer public key. A key whose proof does not verify is rejected
    /// with [`Error::InvalidProof`].
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        let public_key = Self {
            gpk: GroupPublicKey::decode(reader)?,
            proof: IssuerKeyProof::decode(reader)?,
        };
        if !public_key.verify() {
            debug!("IssuerPublicKey::decode: proof of the issuer key did not verify");
            return Err(Error::InvalidProof);
        }
        Ok(public_key)
    }
}

impl_serde_via_encoding!(IssuerSecretKey, GroupPublicKey, IssuerPublicKey);

/// An issuer key pair.
#[derive(Debug)]
pub struct IssuerKeyPair<C: PairingCurve> {
    public: IssuerPublicKey<C>,
    secret: IssuerSecretKey<C>,
}

impl<C: PairingCurve> IssuerKeyPair<C> {
    /// Generate a fresh issuer key pair, including the proof of its public key.
    pub fn generate(rng: &mut impl Rng) -> Result<Self, Error> {
        trace!("IssuerKeyPair::generate: curve {}", C::NAME);
        Self::from_secret_key(IssuerSecretKey::generate(rng)?, rng)
    }

    /// Rebuild a key pair from a stored secret key, with a freshly generated public key proof.
    pub fn from_secret_key(secret: IssuerSecretKey<C>, rng: &mut impl Rng) -> Result<Self, Error> {
        let p2 = C::G2::generator();
        let gpk = GroupPublicKey {
            x: p2 * secret.x,
            y: p2 * secret.y,
        };
        let proof = IssuerKeyProof::new(&secret.x, &secret.y, &gpk.x, &gpk.y, rng)?;
        Ok(Self {
            public: IssuerPublicKey { gpk, proof },
            secret,
        })
    }

    /// The issuer public key.
    pub fn public_key(&self) -> &IssuerPublicKey<C> {
        &self.public
    }

    /// The group public key.
    pub fn group_public_key(&self) -> &GroupPublicKey<C> {
        &self.public.gpk
    }

    /// The issuer secret key, for storage.
    pub fn secret_key(&self) -> &IssuerSecretKey<C> {
        &self.secret
    }

    /// Process a join request made for `nonce` and issue a credential to the requesting member.
    ///
    /// Fails with [`Error::InvalidProof`] if the request's proof of possession does not verify for
    /// `nonce`. Tracking which nonces were handed out is left to the caller; see [`Issuer`].
    pub fn issue_credential(
        &self,
        request: &JoinRequest<C>,
        nonce: &IssuerNonce,
        rng: &mut impl Rng,
    ) -> Result<JoinResponse<C>, Error> {
        trace!("IssuerKeyPair::issue_credential: >>>");
        request.verify(nonce)?;
        let response = Credential::issue(&self.secret, request.public_key(), rng)?;
        trace!("IssuerKeyPair::issue_credential: <<< credential issued");
        Ok(response)
    }
}

/// An issuer that hands out nonces and accepts each of them for exactly one join request.
#[derive(Debug)]
pub struct Issuer<C: PairingCurve> {
    keypair: IssuerKeyPair<C>,
    outstanding: HashSet<IssuerNonce>,
}

impl<C: PairingCurve> Issuer<C> {
    /// Start issuing under the given key pair.
    pub fn new(keypair: IssuerKeyPair<C>) -> Self {
        Self {
            keypair,
            outstanding: HashSet::new(),
        }
    }

    /// The issuer key pair.
    pub fn keypair(&self) -> &IssuerKeyPair<C> {
        &self.keypair
    }

    /// Generate a fresh nonce for a prospective member and remember it.
    pub fn issue_nonce(&mut self, rng: &mut impl Rng) -> Result<IssuerNonce, Error> {
        let nonce = IssuerNonce::new(rng)?;
        let _ = self.outstanding.insert(nonce);
        Ok(nonce)
    }

    /// Number of nonces handed out but not yet used.
    pub fn outstanding_nonces(&self) -> usize {
        self.outstanding.len()
    }

    /// Process a join request for a nonce previously returned by [`Issuer::issue_nonce`].
    ///
    /// The nonce is consumed whether or not the request is accepted. An unknown or already
    /// consumed nonce fails with [`Error::NonceReplay`].
    pub fn process_join_request(
        &mut self,
        request: &JoinRequest<C>,
        nonce: &IssuerNonce,
        rng: &mut impl Rng,
    ) -> Result<JoinResponse<C>, Error> {
        if !self.outstanding.remove(nonce) {
            debug!("Issuer::process_join_request: nonce is unknown or already used");
            return Err(Error::NonceReplay);
        }
        self.keypair.issue_credential(request, nonce, rng)
    }
}
