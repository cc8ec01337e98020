//! Background polling for an owner's soon-to-expire listings.
//!
//! Each notifier is the single writer of a `watch` channel; readers see the latest
//! poll result and never block the poller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::NotifierConfig;
use crate::listings::{ListingRepository, RepositoryError};
use crate::users::UserId;

/// Advisory message shown to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub expiring: usize,
    pub message: String,
    pub generated_at: DateTime<Utc>,
}

impl Notification {
    /// `None` when nothing is expiring, which clears the previous message.
    pub fn for_expiring(expiring: usize, generated_at: DateTime<Utc>) -> Option<Self> {
        if expiring == 0 {
            return None;
        }
        let noun = if expiring == 1 { "listing" } else { "listings" };
        Some(Self {
            expiring,
            message: format!("{expiring} {noun} expiring soon"),
            generated_at,
        })
    }
}

pub type NotificationReceiver = watch::Receiver<Option<Notification>>;

pub struct ExpiryNotifier<R> {
    repository: Arc<R>,
    owner: UserId,
    config: NotifierConfig,
    publisher: watch::Sender<Option<Notification>>,
}

impl<R> ExpiryNotifier<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        owner: UserId,
        config: NotifierConfig,
    ) -> (Self, NotificationReceiver) {
        let (publisher, receiver) = watch::channel(None);
        let notifier = Self {
            repository,
            owner,
            config,
            publisher,
        };
        (notifier, receiver)
    }

    /// Runs one poll and overwrites the published notification.
    ///
    /// On error the previous notification is left in place.
    pub async fn poll_once(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<Notification>, RepositoryError> {
        let expiring = self
            .repository
            .expiring_for_owner(self.owner, now, now + self.config.lookahead)
            .await?;

        let notification = Notification::for_expiring(expiring.len(), now);
        debug!(
            owner = self.owner.0,
            expiring = expiring.len(),
            "expiry poll complete"
        );
        self.publisher.send_replace(notification.clone());
        Ok(notification)
    }

    /// Polls until `shutdown` fires or every receiver is gone.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            owner = self.owner.0,
            interval_secs = self.config.interval.as_secs_f64(),
            "expiry notifier started"
        );

        loop {
            if shutdown.is_cancelled() || self.publisher.is_closed() {
                break;
            }

            if let Err(err) = self.poll_once(Utc::now()).await {
                warn!(owner = self.owner.0, error = %err, "expiry poll failed");
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!(owner = self.owner.0, "expiry notifier stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
