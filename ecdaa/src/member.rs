/*!
Members: software member keys and the member side of the join protocol.

The join protocol moves a member through three states:

1. [`AwaitingNonce`]: the member holds a key and waits for the issuer's nonce.
2. [`RequestBuilt`]: the member has sent a [`JoinRequest`] bound to that nonce.
3. [`Member`]: the issuer's [`JoinResponse`] validated and the member holds a credential.

Each transition consumes the previous state. A rejected transition returns an error and the
state is gone; the member starts over from a fresh nonce.

The states are generic over any [`MemberKey`], so the same code drives software keys
([`MemberKeyPair`]) and TPM-resident keys ([`TpmMemberKey`](crate::tpm::TpmMemberKey)).
*/
use crate::{
    credential::{Credential, JoinRequest, JoinResponse},
    issuer::GroupPublicKey,
    nonce::IssuerNonce,
    signature::Signature,
    types::*,
};
use ecdaa_crypto::{
    impl_serde_via_encoding,
    proofs::{
        commit_with_secret, respond_with_secret, CommitmentDigest, SchnorrCommitment,
        SchnorrResponse, SoftwareEphemeral,
    },
};
use log::{debug, trace};
use std::{fmt, marker::PhantomData};
use zeroize::Zeroize;

/// A member secret key `sk`.
pub struct MemberSecretKey<C: PairingCurve>(C::Scalar);

impl<C: PairingCurve> MemberSecretKey<C> {
    /// Generate a fresh, non-zero member secret key.
    pub fn generate(rng: &mut impl Rng) -> Result<Self, Error> {
        Ok(Self(C::random_nonzero_scalar(rng)?))
    }

    pub(crate) fn as_scalar(&self) -> &C::Scalar {
        &self.0
    }
}

impl<C: PairingCurve> Clone for MemberSecretKey<C> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}

impl<C: PairingCurve> PartialEq for MemberSecretKey<C> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<C: PairingCurve> Eq for MemberSecretKey<C> {}

impl<C: PairingCurve> Drop for MemberSecretKey<C> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<C: PairingCurve> fmt::Debug for MemberSecretKey<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MemberSecretKey(..)")
    }
}

impl<C: PairingCurve> Encode for MemberSecretKey<C> {
    fn encode(&self, writer: &mut Writer) {
        writer.scalar::<C>(&self.0);
    }
}

impl<C: PairingCurve> Decode for MemberSecretKey<C> {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, Error> {
        let key = Self(reader.scalar::<C>("member secret key")?);
        if bool::from(key.0.is_zero()) {
            return Err(Error::MalformedInput("member secret key is zero".into()));
        }
        Ok(key)
    }
}

impl_serde_via_encoding!(MemberSecretKey);

impl<C: PairingCurve> SchnorrSigner<C> for MemberSecretKey<C> {
    type Ephemeral = SoftwareEphemeral<C>;

    fn public_key(&self) -> C::G1 {
        C::G1::generator() * self.0
    }

    fn commit(
        &self,
        basepoint: &C::G1,
        basename_point: Option<&C::G1>,
        rng: &mut impl Rng,
    ) -> Result<(Self::Ephemeral, SchnorrCommitment<C>), Error> {
        commit_with_secret::<C>(&self.0, basepoint, basename_point, rng)
    }

    fn respond(
        &self,
        ephemeral: Self::Ephemeral,
        digest: &CommitmentDigest,
        rng: &mut impl Rng,
    ) -> Result<SchnorrResponse<C>, Error> {
        respond_with_secret::<C>(&self.0, ephemeral, digest, rng)
    }
}

/// A member key that can take part in the join protocol and sign.
pub trait MemberKey<C: PairingCurve>: SchnorrSigner<C> {
    /// Checks on a freshly issued credential that only the key holder can make, beyond
    /// [`JoinResponse::validate`]. Keys that cannot compute with their secret (such as TPM keys)
    /// rely on the credential proof alone.
    fn owns_credential(&self, credential: &Credential<C>) -> bool {
        let _ = credential;
        true
    }
}

impl<C: PairingCurve> MemberKey<C> for MemberSecretKey<C> {
    fn owns_credential(&self, credential: &Credential<C>) -> bool {
        *credential.d() == *credential.b() * self.0
    }
}

impl<'a, C: PairingCurve, K: MemberKey<C>> MemberKey<C> for &'a K {
    fn owns_credential(&self, credential: &Credential<C>) -> bool {
        (**self).owns_credential(credential)
    }
}

/// A software member key pair `(Q, sk)` with `Q = sk·P1`.
#[derive(Debug, Clone)]
pub struct MemberKeyPair<C: PairingCurve> {
    public: C::G1,
    secret: MemberSecretKey<C>,
}

impl<C: PairingCurve> MemberKeyPair<C> {
    /// Generate a fresh member key pair.
    pub fn generate(rng: &mut impl Rng) -> Result<Self, Error> {
        Ok(Self::from_secret_key(MemberSecretKey::generate(rng)?))
    }

    /// Rebuild a key pair from a stored secret key.
    pub fn from_secret_key(secret: MemberSecretKey<C>) -> Self {
        Self {
            public: secret.public_key(),
            secret,
        }
    }

    /// The member public key `Q`.
    pub fn public_key(&self) -> C::G1 {
        self.public
    }

    /// The member secret key, for storage or for adding to a revocation list.
    pub fn secret_key(&self) -> &MemberSecretKey<C> {
        &self.secret
    }
}

impl<C: PairingCurve> SchnorrSigner<C> for MemberKeyPair<C> {
    type Ephemeral = SoftwareEphemeral<C>;

    fn public_key(&self) -> C::G1 {
        self.public
    }

    fn commit(
        &self,
        basepoint: &C::G1,
        basename_point: Option<&C::G1>,
        rng: &mut impl Rng,
    ) -> Result<(Self::Ephemeral, SchnorrCommitment<C>), Error> {
        self.secret.commit(basepoint, basename_point, rng)
    }

    fn respond(
        &self,
        ephemeral: Self::Ephemeral,
        digest: &CommitmentDigest,
        rng: &mut impl Rng,
    ) -> Result<SchnorrResponse<C>, Error> {
        self.secret.respond(ephemeral, digest, rng)
    }
}

impl<C: PairingCurve> MemberKey<C> for MemberKeyPair<C> {
    fn owns_credential(&self, credential: &Credential<C>) -> bool {
        self.secret.owns_credential(credential)
    }
}

/// A prospective member that has a key and is waiting for the issuer's nonce.
#[derive(Debug)]
pub struct AwaitingNonce<C: PairingCurve, K: MemberKey<C>> {
    key: K,
    _curve: PhantomData<C>,
}

impl<C: PairingCurve, K: MemberKey<C>> AwaitingNonce<C, K> {
    /// Start joining with `key`.
    pub fn new(key: K) -> Self {
        Self {
            key,
            _curve: PhantomData,
        }
    }

    /// Build the join request for the issuer's `nonce`.
    pub fn request(
        self,
        nonce: IssuerNonce,
        rng: &mut impl Rng,
    ) -> Result<(RequestBuilt<C, K>, JoinRequest<C>), Error> {
        let request = JoinRequest::new(&self.key, &nonce, rng)?;
        Ok((
            RequestBuilt {
                key: self.key,
                nonce,
                _curve: PhantomData,
            },
            request,
        ))
    }
}

/// A prospective member that has sent its join request and waits for the issuer's response.
#[derive(Debug)]
pub struct RequestBuilt<C: PairingCurve, K: MemberKey<C>> {
    key: K,
    nonce: IssuerNonce,
    _curve: PhantomData<C>,
}

impl<C: PairingCurve, K: MemberKey<C>> RequestBuilt<C, K> {
    /// The nonce the request was bound to.
    pub fn nonce(&self) -> &IssuerNonce {
        &self.nonce
    }

    /// Validate the issuer's response and become a member.
    ///
    /// Fails as [`JoinResponse::validate`] does, and with [`Error::InvalidCredential`] if the key
    /// can tell that the credential was not issued for it.
    pub fn complete(
        self,
        response: &JoinResponse<C>,
        gpk: &GroupPublicKey<C>,
    ) -> Result<Member<C, K>, Error> {
        response.validate(&self.key.public_key(), gpk)?;
        if !self.key.owns_credential(response.credential()) {
            debug!("RequestBuilt::complete: credential D does not match the member secret key");
            return Err(Error::InvalidCredential);
        }
        trace!("RequestBuilt::complete: joined");
        Ok(Member {
            key: self.key,
            credential: *response.credential(),
        })
    }
}

/// A member of the group: a key together with its validated credential.
#[derive(Debug)]
pub struct Member<C: PairingCurve, K: MemberKey<C>> {
    key: K,
    credential: Credential<C>,
}

impl<C: PairingCurve, K: MemberKey<C>> Member<C, K> {
    /// Assemble a member from a key and a credential that was validated for it earlier.
    pub fn from_parts(key: K, credential: Credential<C>) -> Self {
        Self { key, credential }
    }

    /// The member key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The member's credential.
    pub fn credential(&self) -> &Credential<C> {
        &self.credential
    }

    /// Sign `message`, with a pseudonym for `basename` if one is given.
    pub fn sign(
        &self,
        message: &[u8],
        basename: Option<&[u8]>,
        rng: &mut impl Rng,
    ) -> Result<Signature<C>, Error> {
        Signature::sign(message, basename, &self.key, &self.credential, rng)
    }
}
