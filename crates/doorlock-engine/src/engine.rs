//! Credential resolution.
//!
//! Every presentation runs the same five steps:
//!
//! 1. Resolve the rank from the store (unknown when absent) and stamp
//!    `last_used` on a hit.
//! 2. A programming card toggles learning unless deleting; a delete card
//!    toggles deleting unless learning.
//! 3. At most one action, first match wins: enroll an unknown card while
//!    learning, remove a known non-initiator card while deleting, wipe on a
//!    wipe card, provision on a master card.
//! 4. Append the presentation to the usage ledger.
//! 5. Build the outbound response.
//!
//! A store failure in steps 1-3 skips the rest of them. The ledger entry is
//! still attempted with whatever rank was resolved, the staged mode change
//! is dropped and the error is returned.

use chrono::{DateTime, Utc};
use doorlock_core::{CardId, MonotonicClock, Rank};
use doorlock_protocol::Response;
use doorlock_storage::{CredentialStore, ProvisionReport, provision};
use tracing::{error, info, instrument, warn};

use crate::config::{EngineConfig, ModeExitPolicy};
use crate::error::{EngineError, Result};
use crate::mode::{AdminMode, ModeController};

/// Store mutation performed by a presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    /// Unknown card enrolled as a user.
    Enrolled,
    /// Enrollment raced with an existing record and was skipped.
    DuplicateIgnored,
    /// Removal attempted; `removed` is false if the row was already gone.
    Removed { removed: bool },
    /// Credential table wiped.
    Wiped { count: u64 },
    /// Default provisioning ran.
    Provisioned { created: usize },
}

/// Result of one successful presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub card_id: CardId,
    /// Rank resolved in step 1. An enrollment does not change it.
    pub rank: Rank,
    pub action: Action,
    /// Mode after the presentation.
    pub mode: AdminMode,
    /// Ledger timestamp.
    pub at: DateTime<Utc>,
    pub response: Response,
}

struct Resolved {
    action: Action,
    name: Option<String>,
}

/// A failure in steps 1-3, with the rank resolved before it.
struct Aborted {
    rank: Rank,
    error: EngineError,
}

/// Resolves presentations against a [`CredentialStore`].
///
/// The engine owns the store, the mode state and the ledger clock.
pub struct ResolutionEngine<S> {
    store: S,
    config: EngineConfig,
    modes: ModeController,
    clock: MonotonicClock,
}

impl<S: CredentialStore> ResolutionEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            modes: ModeController::new(),
            clock: MonotonicClock::new(),
        }
    }

    /// Build an engine ready to serve: seed the ledger clock and run default
    /// provisioning.
    pub async fn start(store: S, config: EngineConfig) -> Result<Self> {
        let mut engine = Self::new(store, config);
        engine.seed_clock().await?;
        let report = engine.provision_defaults().await?;
        info!(
            created = report.created_count(),
            present = report.already_present,
            "bootstrap provisioning complete"
        );
        Ok(engine)
    }

    /// Continue the ledger clock after the newest persisted entry.
    pub async fn seed_clock(&mut self) -> Result<()> {
        let latest = self
            .store
            .latest_usage_time()
            .await
            .map_err(EngineError::read("latest_usage_time"))?;
        self.clock = MonotonicClock::seeded(latest);
        Ok(())
    }

    /// Create any missing bootstrap credentials.
    pub async fn provision_defaults(&self) -> Result<ProvisionReport> {
        provision(&self.store, &self.config.bootstrap)
            .await
            .map_err(EngineError::write("provision"))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process one card presentation.
    ///
    /// # Errors
    ///
    /// `StoreRead` / `StoreWrite` when the store fails. The usage ledger has
    /// been appended to (or an append attempted) in every case, and mode
    /// state is unchanged.
    #[instrument(level = "info", skip_all, fields(card_id = %id))]
    pub async fn present(&mut self, id: CardId) -> Result<Presentation> {
        let at = self.clock.now();
        let mut staged = self.modes.clone();
        let mut rank = Rank::Unknown;

        let resolved = match self.resolve(id, at, &mut staged, &mut rank).await {
            Ok(resolved) => resolved,
            Err(Aborted { rank, error }) => {
                error!(error = %error, %rank, "presentation aborted");
                if let Err(ledger) = self.store.append_usage(at, id, rank).await {
                    error!(error = %ledger, %rank, "usage ledger append failed after abort");
                }
                return Err(error);
            }
        };

        self.modes = staged;

        self.store
            .append_usage(at, id, rank)
            .await
            .map_err(EngineError::write("append_usage"))?;

        info!(%rank, action = ?resolved.action, mode = %self.modes.mode(), "presentation resolved");

        Ok(Presentation {
            card_id: id,
            rank,
            action: resolved.action,
            mode: self.modes.mode(),
            at,
            response: Response::new(id, rank, resolved.name.as_deref()),
        })
    }

    /// Steps 1-3. `rank` is written as soon as it is known so the caller can
    /// log it even when a later step fails.
    async fn resolve(
        &self,
        id: CardId,
        at: DateTime<Utc>,
        modes: &mut ModeController,
        rank: &mut Rank,
    ) -> std::result::Result<Resolved, Aborted> {
        let abort = |rank: Rank| move |error: EngineError| Aborted { rank, error };

        let record = self
            .store
            .lookup(id)
            .await
            .map_err(EngineError::read("lookup"))
            .map_err(abort(Rank::Unknown))?;

        let name = match record {
            Some(record) => {
                *rank = record.rank;
                self.store
                    .touch_last_used(id, at)
                    .await
                    .map_err(EngineError::write("touch_last_used"))
                    .map_err(abort(record.rank))?;
                record.name
            }
            None => None,
        };
        let rank = *rank;

        if rank == Rank::Programming && !modes.is_deleting() {
            modes.toggle_learning(id);
        } else if rank == Rank::Delete && !modes.is_learning() {
            modes.toggle_deleting(id);
        }

        let single_shot = self.config.mode_exit == ModeExitPolicy::SingleShot;

        let action = if modes.is_learning() && rank == Rank::Unknown {
            match self.store.enroll(id, Rank::User, None).await {
                Ok(()) => {
                    info!("enrolled card as user");
                    if single_shot {
                        modes.exit_learning(id);
                    }
                    Action::Enrolled
                }
                Err(e) if e.is_duplicate() => {
                    warn!("card already enrolled, skipping");
                    Action::DuplicateIgnored
                }
                Err(e) => return Err(abort(rank)(EngineError::write("enroll")(e))),
            }
        } else if let Some(initiator) = modes.deleting_initiator()
            && rank.is_known()
            && id != initiator
        {
            let removed = self
                .store
                .remove(id)
                .await
                .map_err(EngineError::write("remove"))
                .map_err(abort(rank))?;
            info!(removed, "removed card");
            if single_shot {
                modes.exit_deleting(id);
            }
            Action::Removed { removed }
        } else if rank == Rank::Wipe {
            let count = self
                .store
                .wipe_all()
                .await
                .map_err(EngineError::write("wipe_all"))
                .map_err(abort(rank))?;
            warn!(count, "credential table wiped");
            Action::Wiped { count }
        } else if rank == Rank::Master {
            let report = provision(&self.store, &self.config.bootstrap)
                .await
                .map_err(EngineError::write("provision"))
                .map_err(abort(rank))?;
            info!(created = report.created_count(), "master card reprovisioned bootstrap cards");
            Action::Provisioned {
                created: report.created_count(),
            }
        } else {
            Action::None
        };

        Ok(Resolved { action, name })
    }
}
