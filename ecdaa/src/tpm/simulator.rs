//! A TPM simulated in software.
//!
//! Keys live inside the [`SimulatedTpm`] and are never returned. Commit counters are handed out
//! in order and can each be signed once. [`SimulatedTpm::disconnect`] makes every command fail,
//! for exercising hardware error paths.

use super::{TpmError, TpmSession};
use crate::{member::MemberSecretKey, types::*};
use ecdaa_crypto::proofs::{
    commit_with_secret, respond_with_secret, CommitmentDigest, SchnorrCommitment,
    SchnorrResponse, SoftwareEphemeral,
};
use log::trace;
use std::{collections::HashMap, fmt};

struct SimulatedKey<C: PairingCurve> {
    public_key: C::G1,
    secret: MemberSecretKey<C>,
    loaded: bool,
}

struct PendingCommit<C: PairingCurve> {
    public_key: C::G1,
    ephemeral: SoftwareEphemeral<C>,
}

/// A software [`TpmSession`] drawing its randomness from `R`.
pub struct SimulatedTpm<C: PairingCurve, R: Rng> {
    keys: Vec<SimulatedKey<C>>,
    commits: HashMap<u16, PendingCommit<C>>,
    next_counter: u16,
    connected: bool,
    rng: R,
}

impl<C: PairingCurve, R: Rng> fmt::Debug for SimulatedTpm<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedTpm")
            .field("keys", &self.keys.len())
            .field("pending_commits", &self.commits.len())
            .field("connected", &self.connected)
            .finish()
    }
}

impl<C: PairingCurve, R: Rng> SimulatedTpm<C, R> {
    /// A connected simulator with no keys.
    pub fn new(rng: R) -> Self {
        Self {
            keys: Vec::new(),
            commits: HashMap::new(),
            next_counter: 0,
            connected: true,
            rng,
        }
    }

    /// Make every following command fail with [`TpmError::Disconnected`].
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Undo [`disconnect`](Self::disconnect). Pending commits are lost, as on a device reset.
    pub fn reconnect(&mut self) {
        self.commits.clear();
        self.connected = true;
    }

    fn ensure_connected(&self) -> Result<(), TpmError> {
        if self.connected {
            Ok(())
        } else {
            Err(TpmError::Disconnected)
        }
    }
}

fn loaded_key<'a, C: PairingCurve>(
    keys: &'a [SimulatedKey<C>],
    public_key: &C::G1,
) -> Result<&'a SimulatedKey<C>, TpmError> {
    keys.iter()
        .find(|key| key.public_key == *public_key && key.loaded)
        .ok_or(TpmError::NoKeyLoaded)
}

fn command_error(error: Error) -> TpmError {
    TpmError::Command(error.to_string())
}

impl<C: PairingCurve, R: Rng> TpmSession<C> for SimulatedTpm<C, R> {
    fn create_key(&mut self) -> Result<C::G1, TpmError> {
        self.ensure_connected()?;
        let secret = MemberSecretKey::generate(&mut self.rng).map_err(command_error)?;
        let public_key = secret.public_key();
        self.keys.push(SimulatedKey {
            public_key,
            secret,
            loaded: false,
        });
        trace!("SimulatedTpm::create_key: {} keys", self.keys.len());
        Ok(public_key)
    }

    fn load_key(&mut self, public_key: &C::G1) -> Result<(), TpmError> {
        self.ensure_connected()?;
        let key = self
            .keys
            .iter_mut()
            .find(|key| key.public_key == *public_key)
            .ok_or(TpmError::UnknownKey)?;
        key.loaded = true;
        Ok(())
    }

    fn commit(
        &mut self,
        public_key: &C::G1,
        basepoint: &C::G1,
        basename_point: Option<&C::G1>,
    ) -> Result<(u16, SchnorrCommitment<C>), TpmError> {
        self.ensure_connected()?;
        if self.commits.contains_key(&self.next_counter) {
            return Err(TpmError::Command("no free commit counter".into()));
        }
        let secret = loaded_key(&self.keys, public_key)?.secret.as_scalar();
        let (ephemeral, commitment) =
            commit_with_secret::<C>(secret, basepoint, basename_point, &mut self.rng)
                .map_err(command_error)?;

        let counter = self.next_counter;
        self.next_counter = self.next_counter.wrapping_add(1);
        let _ = self.commits.insert(
            counter,
            PendingCommit {
                public_key: *public_key,
                ephemeral,
            },
        );
        Ok((counter, commitment))
    }

    fn sign(
        &mut self,
        public_key: &C::G1,
        counter: u16,
        digest: &CommitmentDigest,
    ) -> Result<SchnorrResponse<C>, TpmError> {
        self.ensure_connected()?;
        match self.commits.get(&counter) {
            Some(pending) if pending.public_key == *public_key => {}
            _ => return Err(TpmError::UnknownCounter(counter)),
        }
        let pending = self
            .commits
            .remove(&counter)
            .ok_or(TpmError::UnknownCounter(counter))?;
        let secret = loaded_key(&self.keys, public_key)?.secret.as_scalar();
        respond_with_secret::<C>(secret, pending.ephemeral, digest, &mut self.rng)
            .map_err(command_error)
    }
}
