//! The routing card: holds the latest configuration and snapshot, tracks commands in
//! flight and republishes the view whenever any of them changes.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use serde_json::Value;
use strum::Display;
use tokio::sync::watch;
use tracing::debug;
use tracing::warn;

use crate::bus::CommandBus;
use crate::bus::ServiceCall;
use crate::config::CardConfig;
use crate::config::ConfigError;
use crate::resolver::resolve;
use crate::snapshot::Snapshot;
use crate::tracker::CommandKey;
use crate::tracker::Tracker;
use crate::view;
use crate::view::View;

/// Latest view, `None` until both a configuration and a snapshot have arrived.
pub type ViewReceiver = watch::Receiver<Option<Arc<View>>>;

/// Result of a row or preset action.
///
/// Failures are only reported here and in the log; the view just returns the row or
/// preset to its enabled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No command was issued
    Skipped(SkipReason),

    Completed,

    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// No state snapshot has been received from the host yet
    NoHost,
    NotConfigured,
    UnknownEntity,
    IllegalOption,
    UnknownPreset,
}

pub struct Card {
    bus: Arc<dyn CommandBus>,
    inner: Mutex<Inner>,
    views: watch::Sender<Option<Arc<View>>>,
}

#[derive(Debug, Default)]
struct Inner {
    config: Option<Arc<CardConfig>>,
    snapshot: Option<Arc<Snapshot>>,
    pending: Tracker,
}

impl std::fmt::Debug for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Card")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Marks a command key pending for as long as it lives.
struct InFlight<'a> {
    card: &'a Card,
    key: CommandKey,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut inner = self.card.lock();
        inner.pending.end(&self.key);
        debug!(key = %self.key, "command settled");
        self.card.publish(&inner);
    }
}

impl Card {
    pub fn new(bus: Arc<dyn CommandBus>) -> Self {
        let (views, _) = watch::channel(None);
        Self {
            bus,
            inner: Mutex::new(Inner::default()),
            views,
        }
    }

    /// Apply a host-supplied configuration mapping.
    ///
    /// Fails when the mapping is null or not a mapping; the previous configuration is kept.
    pub fn configure(&self, config: Value) -> Result<(), ConfigError> {
        let config = CardConfig::from_value(config)?;
        self.set_config(config);
        Ok(())
    }

    pub fn set_config(&self, config: CardConfig) {
        debug!(
            title = %config.title,
            auto_discover = config.auto_discover,
            entities = config.entities().len(),
            presets = config.presets().len(),
            "card configured"
        );
        let mut inner = self.lock();
        inner.config = Some(Arc::new(config));
        self.publish(&inner);
    }

    /// Replace the state snapshot.
    pub fn update_state(&self, snapshot: impl Into<Arc<Snapshot>>) {
        let snapshot = snapshot.into();
        debug!(entities = snapshot.len(), "state snapshot updated");
        let mut inner = self.lock();
        inner.snapshot = Some(snapshot);
        self.publish(&inner);
    }

    /// Layout height hint; see [`view::sizing_hint`].
    pub fn sizing_hint(&self) -> usize {
        let inner = self.lock();
        let rows = match (&inner.config, &inner.snapshot) {
            (Some(config), Some(snapshot)) => Some(resolve(config, snapshot).len()),
            _ => None,
        };
        view::sizing_hint(rows)
    }

    pub fn view(&self) -> Option<Arc<View>> {
        self.views.borrow().clone()
    }

    /// Receive every view the card publishes.
    pub fn subscribe(&self) -> ViewReceiver {
        self.views.subscribe()
    }

    pub fn is_pending(&self, key: &CommandKey) -> bool {
        self.lock().pending.is_pending(key)
    }

    /// Route `option` to the output row `entity_id`.
    ///
    /// The row stays disabled until the `select.select_option` call settles. Commands are
    /// never debounced: a second change while one is in flight issues another call.
    pub async fn route_entity(&self, entity_id: &str, option: &str) -> Dispatch {
        let call = {
            let inner = self.lock();
            let Some(snapshot) = &inner.snapshot else {
                return Dispatch::Skipped(SkipReason::NoHost);
            };
            let Some(config) = &inner.config else {
                return Dispatch::Skipped(SkipReason::NotConfigured);
            };

            let rows = resolve(config, snapshot);
            let Some(row) = rows.iter().find(|row| row.entity == entity_id) else {
                debug!(entity_id, "ignoring route for unknown row");
                return Dispatch::Skipped(SkipReason::UnknownEntity);
            };
            if !row.accepts(option) {
                debug!(entity_id, option, "ignoring route to unknown option");
                return Dispatch::Skipped(SkipReason::IllegalOption);
            }

            ServiceCall::select_option(entity_id, option)
        };

        self.dispatch(CommandKey::entity(entity_id), call).await
    }

    /// Run the preset at `index`.
    ///
    /// Issues exactly one command: the preset's own service, or `route_output` when it has
    /// none it can name.
    pub async fn run_preset(&self, index: usize) -> Dispatch {
        let call = {
            let inner = self.lock();
            if inner.snapshot.is_none() {
                return Dispatch::Skipped(SkipReason::NoHost);
            }
            let Some(config) = &inner.config else {
                return Dispatch::Skipped(SkipReason::NotConfigured);
            };
            let Some(preset) = config.preset(index) else {
                return Dispatch::Skipped(SkipReason::UnknownPreset);
            };

            ServiceCall::for_preset(preset)
        };

        self.dispatch(CommandKey::Preset(index), call).await
    }

    async fn dispatch(&self, key: CommandKey, call: ServiceCall) -> Dispatch {
        let in_flight = self.begin(key);

        debug!(service = %call, "issuing command");
        match self.bus.call_service(call).await {
            Ok(()) => Dispatch::Completed,
            Err(e) => {
                warn!(key = %in_flight.key, "command failed: {}", e);
                Dispatch::Failed
            }
        }
    }

    fn begin(&self, key: CommandKey) -> InFlight<'_> {
        let mut inner = self.lock();
        inner.pending.begin(key.clone());
        self.publish(&inner);
        InFlight { card: self, key }
    }

    /// Re-synthesize and publish the view, if the card has everything it needs.
    fn publish(&self, inner: &Inner) {
        let (Some(config), Some(snapshot)) = (&inner.config, &inner.snapshot) else {
            return;
        };

        let rows = resolve(config, snapshot);
        let view = view::synthesize(config, &rows, &inner.pending);
        self.views.send_replace(Some(Arc::new(view)));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
