/*!
Member keys held in a TPM.

A TPM keeps the member secret key `sk` in the device and only exposes the two halves of the ECDAA
Schnorr protocol: `TPM2_Commit`, which returns the commitments `E`, `K` and `L` under a fresh
counter, and `TPM2_Sign`, which answers a digest with `(n, s)` and retires the counter. The
[`TpmSession`] trait describes that command set; [`TpmContext`] shares one session between
threads, and [`TpmMemberKey`] turns a key loaded in the session into a
[`SchnorrSigner`](ecdaa_crypto::proofs::SchnorrSigner), so the join protocol and signing work
unchanged with keys that never leave the TPM.

A software simulator (`tpm::simulator`) is available for tests, and to other crates with the
`simulator` feature.
*/
use crate::{credential::JoinRequest, member::MemberKey, nonce::IssuerNonce, types::*};
use ecdaa_crypto::proofs::{CommitmentDigest, SchnorrCommitment, SchnorrResponse};
use log::{debug, trace};
use std::{fmt, marker::PhantomData, sync::Mutex};
use thiserror::Error;

#[cfg(any(test, feature = "simulator"))]
pub mod simulator;

/// Failure reported by a [`TpmSession`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TpmError {
    /// The device is not reachable.
    #[error("TPM is not connected")]
    Disconnected,
    /// A command needs a key that is not loaded.
    #[error("no key is loaded in the TPM")]
    NoKeyLoaded,
    /// The requested key does not exist in the TPM.
    #[error("TPM holds no key with the given public key")]
    UnknownKey,
    /// A sign command named a commit counter that is unknown or already used.
    #[error("TPM commit counter {0} is unknown or already used")]
    UnknownCounter(u16),
    /// Any other command failure.
    #[error("TPM command failed: {0}")]
    Command(String),
}

impl From<TpmError> for Error {
    fn from(error: TpmError) -> Self {
        Error::HardwareError(error.to_string())
    }
}

/// The TPM commands used for ECDAA, addressed by the member public key `Q` of the key they use.
pub trait TpmSession<C: PairingCurve> {
    /// Create a fresh ECDAA key in the device and return its public key `Q = sk·P1`.
    fn create_key(&mut self) -> Result<C::G1, TpmError>;

    /// Load the key with public key `Q` so that it can be used by [`commit`](Self::commit).
    fn load_key(&mut self, public_key: &C::G1) -> Result<(), TpmError>;

    /// `TPM2_Commit`: commit to a fresh `k` for the key `Q`, returning the counter that
    /// identifies it together with `E = k·basepoint` and, with a basename point, `K` and `L`.
    fn commit(
        &mut self,
        public_key: &C::G1,
        basepoint: &C::G1,
        basename_point: Option<&C::G1>,
    ) -> Result<(u16, SchnorrCommitment<C>), TpmError>;

    /// `TPM2_Sign`: answer `digest` for the commitment `counter` of key `Q`. The counter can be
    /// used once.
    fn sign(
        &mut self,
        public_key: &C::G1,
        counter: u16,
        digest: &CommitmentDigest,
    ) -> Result<SchnorrResponse<C>, TpmError>;
}

/// A [`TpmSession`] shared between threads. Each command holds the session exclusively for its
/// duration.
pub struct TpmContext<C: PairingCurve, S: TpmSession<C>> {
    session: Mutex<S>,
    _curve: PhantomData<C>,
}

impl<C: PairingCurve, S: TpmSession<C>> fmt::Debug for TpmContext<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TpmContext").field("curve", &C::NAME).finish()
    }
}

impl<C: PairingCurve, S: TpmSession<C>> TpmContext<C, S> {
    /// Wrap an open session.
    pub fn new(session: S) -> Self {
        Self {
            session: Mutex::new(session),
            _curve: PhantomData,
        }
    }

    /// Run `command` with exclusive access to the session. Session errors and a poisoned lock
    /// become [`Error::HardwareError`].
    pub fn with_session<T>(
        &self,
        command: impl FnOnce(&mut S) -> Result<T, TpmError>,
    ) -> Result<T, Error> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::HardwareError("TPM session lock poisoned".into()))?;
        command(&mut *session).map_err(|error| {
            debug!("TpmContext::with_session: {}", error);
            Error::from(error)
        })
    }

    /// Set up a member key in the TPM and build its join request for `nonce`.
    ///
    /// With `serialized_public_key`, the existing key with that (compressed) public key is
    /// loaded; otherwise a fresh key is created.
    pub fn generate_member_keypair(
        &self,
        serialized_public_key: Option<&[u8]>,
        nonce: &IssuerNonce,
        rng: &mut impl Rng,
    ) -> Result<(TpmMemberKey<'_, C, S>, JoinRequest<C>), Error> {
        let public_key = match serialized_public_key {
            Some(bytes) => {
                let mut reader = Reader::new(bytes);
                let public_key = reader.point::<C::G1>("TPM public key")?;
                reader.finish()?;
                self.with_session(|session| session.load_key(&public_key))?;
                public_key
            }
            None => self.with_session(|session| {
                let public_key = session.create_key()?;
                session.load_key(&public_key)?;
                Ok(public_key)
            })?,
        };
        trace!("TpmContext::generate_member_keypair: key ready");
        let key = self.member_key(public_key);
        let request = JoinRequest::new(&key, nonce, rng)?;
        Ok((key, request))
    }

    /// A handle to the loaded key with public key `Q`.
    pub fn member_key(&self, public_key: C::G1) -> TpmMemberKey<'_, C, S> {
        TpmMemberKey {
            context: self,
            public_key,
        }
    }
}

/// A member key that lives in a TPM. It holds only the public key `Q` and a reference to the
/// session.
pub struct TpmMemberKey<'a, C: PairingCurve, S: TpmSession<C>> {
    context: &'a TpmContext<C, S>,
    public_key: C::G1,
}

impl<'a, C: PairingCurve, S: TpmSession<C>> fmt::Debug for TpmMemberKey<'a, C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TpmMemberKey")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// A commit counter handed out by the TPM, to be answered once by `TPM2_Sign`.
#[derive(Debug)]
#[allow(missing_copy_implementations)]
pub struct TpmCommit(u16);

impl<'a, C: PairingCurve, S: TpmSession<C>> SchnorrSigner<C> for TpmMemberKey<'a, C, S> {
    type Ephemeral = TpmCommit;

    fn public_key(&self) -> C::G1 {
        self.public_key
    }

    // The device draws its own randomness.
    fn commit(
        &self,
        basepoint: &C::G1,
        basename_point: Option<&C::G1>,
        _rng: &mut impl Rng,
    ) -> Result<(Self::Ephemeral, SchnorrCommitment<C>), Error> {
        let (counter, commitment) = self.context.with_session(|session| {
            session.commit(&self.public_key, basepoint, basename_point)
        })?;
        Ok((TpmCommit(counter), commitment))
    }

    fn respond(
        &self,
        ephemeral: Self::Ephemeral,
        digest: &CommitmentDigest,
        _rng: &mut impl Rng,
    ) -> Result<SchnorrResponse<C>, Error> {
        self.context
            .with_session(|session| session.sign(&self.public_key, ephemeral.0, digest))
    }
}

impl<'a, C: PairingCurve, S: TpmSession<C>> MemberKey<C> for TpmMemberKey<'a, C, S> {}

#[cfg(test)]
mod test {
    use super::{simulator::SimulatedTpm, *};
    use crate::{
        issuer::IssuerKeyPair,
        member::AwaitingNonce,
        revocation::{BasenameRevocationList, SecretKeyRevocationList},
        signature::Signature,
        test::rng,
    };
    use ecdaa_crypto::Bls12381;

    type Context = TpmContext<Bls12381, SimulatedTpm<Bls12381, rand::rngs::StdRng>>;

    fn context() -> Context {
        use rand::SeedableRng;
        TpmContext::new(SimulatedTpm::new(rand::rngs::StdRng::from_seed(
            *b"A SIMULATED TPM, NOT A REAL ONE.",
        )))
    }

    fn verify(signature: &Signature<Bls12381>, issuer: &IssuerKeyPair<Bls12381>, message: &[u8]) {
        signature
            .verify(
                issuer.group_public_key(),
                &SecretKeyRevocationList::new(),
                &BasenameRevocationList::new(),
                message,
                None,
            )
            .unwrap();
    }

    #[test]
    fn tpm_member_joins_and_signs() {
        let mut rng = rng();
        let context = context();
        let issuer = IssuerKeyPair::<Bls12381>::generate(&mut rng).unwrap();
        let nonce = IssuerNonce::new(&mut rng).unwrap();

        let (key, request) = context
            .generate_member_keypair(None, &nonce, &mut rng)
            .unwrap();
        assert_eq!(request.public_key(), &key.public_key());
        let response = issuer.issue_credential(&request, &nonce, &mut rng).unwrap();
        response
            .validate(&key.public_key(), issuer.group_public_key())
            .unwrap();

        let signature =
            Signature::sign(b"message", None, &key, response.credential(), &mut rng).unwrap();
        verify(&signature, &issuer, b"message");
    }

    #[test]
    fn tpm_key_drives_join_state_machine() {
        let mut rng = rng();
        let context = context();
        let issuer = IssuerKeyPair::<Bls12381>::generate(&mut rng).unwrap();
        let public_key = context
            .with_session(|session| {
                let public_key = session.create_key()?;
                session.load_key(&public_key)?;
                Ok(public_key)
            })
            .unwrap();

        let nonce = IssuerNonce::new(&mut rng).unwrap();
        let (pending, request) = AwaitingNonce::new(context.member_key(public_key))
            .request(nonce, &mut rng)
            .unwrap();
        let response = issuer.issue_credential(&request, &nonce, &mut rng).unwrap();
        let member = pending
            .complete(&response, issuer.group_public_key())
            .unwrap();

        let basename = &b"basename"[..];
        let first = member.sign(b"one", Some(basename), &mut rng).unwrap();
        let second = member.sign(b"two", Some(basename), &mut rng).unwrap();
        assert_eq!(first.pseudonym(), second.pseudonym());
    }

    #[test]
    fn existing_key_is_loaded_from_its_encoding() {
        let mut rng = rng();
        let context = context();
        let nonce = IssuerNonce::new(&mut rng).unwrap();
        let (key, _) = context
            .generate_member_keypair(None, &nonce, &mut rng)
            .unwrap();
        let encoded = key.public_key().to_bytes();

        let (again, request) = context
            .generate_member_keypair(Some(encoded.as_ref()), &nonce, &mut rng)
            .unwrap();
        assert_eq!(again.public_key(), key.public_key());
        request.verify(&nonce).unwrap();

        let unknown = <Bls12381 as PairingCurve>::G1::random(&mut rng).to_bytes();
        assert!(matches!(
            context.generate_member_keypair(Some(unknown.as_ref()), &nonce, &mut rng),
            Err(Error::HardwareError(_))
        ));
        assert!(matches!(
            context.generate_member_keypair(Some(&[1u8, 2, 3][..]), &nonce, &mut rng),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn disconnected_tpm_is_a_hardware_error() {
        let mut rng = rng();
        let context = context();
        let issuer = IssuerKeyPair::<Bls12381>::generate(&mut rng).unwrap();
        let nonce = IssuerNonce::new(&mut rng).unwrap();
        let (key, request) = context
            .generate_member_keypair(None, &nonce, &mut rng)
            .unwrap();
        let response = issuer.issue_credential(&request, &nonce, &mut rng).unwrap();

        context
            .with_session(|session| {
                session.disconnect();
                Ok(())
            })
            .unwrap();
        let result = Signature::sign(b"message", None, &key, response.credential(), &mut rng);
        assert_eq!(
            result.unwrap_err(),
            Error::HardwareError(TpmError::Disconnected.to_string())
        );
        assert!(!Error::from(TpmError::Disconnected).is_rejection());

        context
            .with_session(|session| {
                session.reconnect();
                Ok(())
            })
            .unwrap();
        let signature =
            Signature::sign(b"message", None, &key, response.credential(), &mut rng).unwrap();
        verify(&signature, &issuer, b"message");
    }

    #[test]
    fn commit_counters_are_single_use() {
        let mut rng = rng();
        let context = context();
        let nonce = IssuerNonce::new(&mut rng).unwrap();
        let (key, _) = context
            .generate_member_keypair(None, &nonce, &mut rng)
            .unwrap();
        let q = key.public_key();
        let p1 = <Bls12381 as PairingCurve>::G1::generator();
        let digest = CommitmentDigest::from_bytes([7; CommitmentDigest::LENGTH]);

        let mut used = None;
        let result = context.with_session(|session| {
            let (counter, _) = session.commit(&q, &p1, None)?;
            used = Some(counter);
            let _ = session.sign(&q, counter, &digest)?;
            session.sign(&q, counter, &digest)
        });
        assert_eq!(
            result.unwrap_err(),
            Error::from(TpmError::UnknownCounter(used.unwrap()))
        );
    }

    #[test]
    fn poisoned_session_is_a_hardware_error() {
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let mut rng = rng();
        let context = context();
        let nonce = IssuerNonce::new(&mut rng).unwrap();

        let crashed = catch_unwind(AssertUnwindSafe(|| {
            context.with_session::<()>(|_| panic!("transport crashed mid-command"))
        }));
        assert!(crashed.is_err());

        let error = context
            .with_session(|session| session.create_key())
            .unwrap_err();
        assert!(matches!(error, Error::HardwareError(_)));
        assert!(!error.is_rejection());
        assert!(matches!(
            context.generate_member_keypair(None, &nonce, &mut rng),
            Err(Error::HardwareError(_))
        ));
    }

    #[test]
    fn threads_share_one_tpm() {
        let mut rng = rng();
        let context = context();
        let issuer = IssuerKeyPair::<Bls12381>::generate(&mut rng).unwrap();
        let nonce = IssuerNonce::new(&mut rng).unwrap();
        let (key, request) = context
            .generate_member_keypair(None, &nonce, &mut rng)
            .unwrap();
        let response = issuer.issue_credential(&request, &nonce, &mut rng).unwrap();
        let credential = response.credential();

        let signatures = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4u8)
                .map(|i| {
                    let key = &key;
                    scope.spawn(move || {
                        use rand::SeedableRng;
                        let mut rng = rand::rngs::StdRng::from_seed([i; 32]);
                        (0..3)
                            .map(|_| {
                                Signature::sign(&[i], None, key, credential, &mut rng).unwrap()
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        for (i, signatures) in signatures.iter().enumerate() {
            for signature in signatures {
                verify(signature, &issuer, &[i as u8]);
            }
        }
    }
}
