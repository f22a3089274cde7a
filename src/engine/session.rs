//! The per-login session loop
//!
//! ```text
//! start ──► rest day? ──yes──► refresh stale snapshot once ──► exit
//!              │no
//!              ▼
//!          seed notified set from today's snapshot
//!              │
//!              ▼
//!     ┌──► reload config if its mtime advanced
//!     │    reset notified set on a new calendar day
//!     │    select provider ─► retrieve ─► patch names ─► evaluate ─► alert
//!     │    publish snapshot
//!     └─── in a trading window? sleep with jitter : exit
//! ```

use chrono::{Local, NaiveDate};
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

use super::alert::notifier_for;
use super::calendar::{in_session, is_rest_day, jittered_delay};
use super::retrieval::{ProviderSelector, Retriever};
use super::snapshot::{SnapshotStore, SnapshotWriter};
use super::state::SessionState;
use super::tracker::{Evaluation, NotificationTracker};
use crate::common::errors::{Result, RunnerError};
use crate::common::traits::{Notifier, RandomSource};
use crate::common::types::{Mode, Quote, Retrieval, Snapshot, NAME_PLACEHOLDER};
use crate::config::loader::{config_modified, load_config};
use crate::config::types::RunnerPaths;
use crate::providers::ProviderKind;

/// Why [`Session::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// Weekend or configured holiday
    RestDay,
    /// The clock left every trading window
    MarketClosed,
}

/// Polling session state
pub struct Session {
    paths: RunnerPaths,
    state: Arc<SessionState>,
    config_modified: Option<SystemTime>,
    retriever: Retriever,
    selector: ProviderSelector,
    tracker: NotificationTracker,
    /// Display names from the first parsed series
    names: Option<Vec<String>>,
    store: SnapshotStore,
    notifier: Arc<dyn Notifier>,
    /// Rebuild `notifier` when a reload changes `alert_command`
    notifier_from_config: bool,
    rng: Box<dyn RandomSource>,
}

impl Session {
    /// Load the configuration under `paths` and build a session
    pub fn start(
        paths: RunnerPaths,
        notifier: Arc<dyn Notifier>,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        let config = load_config(&paths.config_file)?;
        let state = SessionState::resolve(config)?;
        Ok(Self::with_state(paths, state, Retriever::new()?, notifier, rng))
    }

    /// Like [`Session::start`], with notifications going to `alert_command`
    ///
    /// The notifier follows the configuration across reloads.
    pub fn configured(paths: RunnerPaths, rng: Box<dyn RandomSource>) -> Result<Self> {
        let config = load_config(&paths.config_file)?;
        let notifier = notifier_for(config.alert_command.as_deref());
        let state = SessionState::resolve(config)?;
        let mut session = Self::with_state(paths, state, Retriever::new()?, notifier, rng);
        session.notifier_from_config = true;
        Ok(session)
    }

    /// Build a session around an already resolved state
    pub fn with_state(
        paths: RunnerPaths,
        state: SessionState,
        retriever: Retriever,
        notifier: Arc<dyn Notifier>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let store = SnapshotStore::new(&paths.data_file, &paths.lock_file);
        Self {
            config_modified: config_modified(&paths.config_file),
            paths,
            state: Arc::new(state),
            retriever,
            selector: ProviderSelector::new(),
            tracker: NotificationTracker::new(Local::now().date_naive()),
            names: None,
            store,
            notifier,
            notifier_from_config: false,
            rng,
        }
    }

    /// Configuration snapshot currently in force
    pub fn state(&self) -> Arc<SessionState> {
        Arc::clone(&self.state)
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn notified(&self) -> Vec<usize> {
        self.tracker.notified()
    }

    /// Sink notifications currently go to
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    /// Continue today's notified set from the previous snapshot
    ///
    /// Slots beyond the configured series are dropped.
    pub fn seed(&mut self, today: NaiveDate) {
        let slots = self.state.config.slot_count();
        let notified: Vec<usize> = self
            .store
            .load_notified(today)
            .into_iter()
            .filter(|slot| *slot < slots)
            .collect();
        if !notified.is_empty() {
            info!("Continuing with notified slots {:?}", notified);
        }
        self.tracker = NotificationTracker::seeded(today, notified);
    }

    /// Swap in a new configuration if the file changed; returns whether it did
    ///
    /// A failed reload keeps the previous state.
    pub fn reload_if_changed(&mut self, today: NaiveDate) -> bool {
        let modified = config_modified(&self.paths.config_file);
        if modified.is_none() || modified <= self.config_modified {
            return false;
        }
        self.config_modified = modified;

        info!("Configuration updated, reloading");
        match load_config(&self.paths.config_file).and_then(SessionState::resolve) {
            Ok(state) => {
                if self.notifier_from_config
                    && state.config.alert_command != self.state.config.alert_command
                {
                    info!("Alert command now {:?}", state.config.alert_command);
                    self.notifier = notifier_for(state.config.alert_command.as_deref());
                }
                self.state = Arc::new(state);
                self.tracker.reset(today);
                self.names = None;
                self.selector.rearm();
                true
            }
            Err(e) => {
                error!("Configuration reload failed, keeping previous: {}", e);
                false
            }
        }
    }

    /// One polling tick; the snapshot is published before returning
    pub async fn tick(&mut self, writer: &mut SnapshotWriter, today: NaiveDate) -> Result<Snapshot> {
        self.reload_if_changed(today);
        if self.tracker.roll_day(today) {
            info!("New day {}, notified set cleared", today);
        }

        // the whole tick works on this state even if a reload lands meanwhile
        let state = Arc::clone(&self.state);
        let (kind, mut prices) = self.retrieve(&state, Mode::Percent).await;

        if let Retrieval::Series(series) = &mut prices {
            self.patch_names(series);
            let evaluation = self.tracker.apply(series, &state.config.threshold);
            self.dispatch(kind, evaluation);
        }

        let snapshot = Snapshot {
            notified: self.tracker.notified(),
            prices,
        };
        writer.publish(&snapshot)?;
        Ok(snapshot)
    }

    /// Refresh a stale snapshot once on a rest day; returns whether it wrote
    pub async fn refresh_rest_day(&mut self, today: NaiveDate) -> Result<bool> {
        if self.store.last_modified_date() == Some(today) {
            return Ok(false);
        }

        let mut writer = self.store.open()?;
        let state = Arc::clone(&self.state);
        let (_, prices) = self.retrieve(&state, Mode::Percent).await;
        writer.publish(&Snapshot {
            notified: Vec::new(),
            prices,
        })?;
        Ok(true)
    }

    /// Run until the market closes, or once on a rest day
    pub async fn run(mut self) -> Result<SessionExit> {
        let today = Local::now().date_naive();
        if is_rest_day(today, &self.state.config.rest_dates) {
            if self.refresh_rest_day(today).await? {
                debug!("Rest day snapshot refreshed");
            }
            info!("Rest day, exit.");
            return Ok(SessionExit::RestDay);
        }

        self.seed(today);
        let mut writer = self.store.open()?;
        loop {
            self.tick(&mut writer, Local::now().date_naive()).await?;

            let state = Arc::clone(&self.state);
            if !in_session(Local::now().time(), &state.config.sessions) {
                info!("Market inactive, exit.");
                return Ok(SessionExit::MarketClosed);
            }

            let pause = jittered_delay(state.config.delay, self.rng.as_mut());
            debug!("Sleeping {:?}", pause);
            tokio::time::sleep(pause).await;
        }
    }

    async fn retrieve(
        &mut self,
        state: &SessionState,
        mode: Mode,
    ) -> (Option<ProviderKind>, Retrieval) {
        match self.selector.select(state, mode, self.rng.as_mut()) {
            Some(kind) => {
                let prices = self
                    .retriever
                    .retrieve(state, kind, mode, self.rng.as_mut())
                    .await;
                (Some(kind), prices)
            }
            None => {
                let msg = format!("No provider can serve {} mode", mode);
                warn!("{}", msg);
                (None, Retrieval::Failure(msg))
            }
        }
    }

    /// Fill placeholder names from the cache, and the cache from real names
    fn patch_names(&mut self, series: &mut [Quote]) {
        match &mut self.names {
            None => self.names = Some(series.iter().map(|q| q.name.clone()).collect()),
            Some(names) => {
                for (quote, cached) in series.iter_mut().zip(names.iter_mut()) {
                    if quote.has_placeholder_name() {
                        quote.name = cached.clone();
                    } else if *cached == NAME_PLACEHOLDER {
                        *cached = quote.name.clone();
                    }
                }
            }
        }
    }

    fn dispatch(&self, kind: Option<ProviderKind>, evaluation: Evaluation) {
        let origin = kind.map(|k| k.source().referer()).unwrap_or("-");
        for anomaly in &evaluation.anomalies {
            let line = format!("<{}>\n{}", origin, anomaly);
            error!("{}", line);
            self.notifier.notify(&[line], None);
        }

        if !evaluation.alerts.is_empty() {
            info!("Notified: {:?}", evaluation.notified);
            self.notifier.notify(&evaluation.alerts, evaluation.class);
        }
    }
}

/// Drive `task` on its own tokio task and report how it ended
///
/// An error or a panic is logged and sent to `notifier` without an image.
/// Resources owned by the task are dropped before this returns.
pub async fn supervise<F, T>(task: F, notifier: Arc<dyn Notifier>) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let outcome = match tokio::spawn(task).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Err(RunnerError::Internal(format!(
            "panicked: {}",
            panic_message(e.into_panic())
        ))),
        Err(e) => Err(RunnerError::Internal(e.to_string())),
    };

    if let Err(e) = &outcome {
        error!("Session failed: {:?}", e);
        notifier.notify(&[format!("StockRunner stopped: {}", e)], None);
    }
    outcome
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Exactly one retrieval, outside any session
///
/// Uses `kind` when given, otherwise a random provider able to serve `mode`.
pub async fn retrieve_once(
    state: &SessionState,
    kind: Option<ProviderKind>,
    mode: Mode,
    rng: &mut dyn RandomSource,
) -> Result<Retrieval> {
    let retriever = Retriever::new()?;
    let kind = match kind {
        Some(kind) => Some(kind),
        None => ProviderSelector::random_only().select(state, mode, rng),
    };

    Ok(match kind {
        Some(kind) => retriever.retrieve(state, kind, mode, rng).await,
        None => Retrieval::Failure(format!("No provider can serve {} mode", mode)),
    })
}
