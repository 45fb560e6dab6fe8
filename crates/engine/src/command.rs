//! Serial command processing
//!
//! A single loop consumes [`StoreCommand`]s in arrival order, so a
//! `Persistence` followed by a `Callback` for the same event reaches the
//! collaborators in that order. Collaborator errors are logged and
//! otherwise ignored.

use std::sync::Arc;

use eventlog_core::{ServiceEventUpdate, StoreCommand, WebhookEvent, WebhookParams};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::store::MessageStore;

impl MessageStore {
    /// Execute one command synchronously.
    pub fn handle_command(&self, command: StoreCommand) {
        debug!(verb = command.verb(), event_id = command.event_id(), "Handling store command");
        match command {
            StoreCommand::Persistence { event_id } => self.persistence(&event_id),
            StoreCommand::Callback {
                event_id,
                status,
                message,
            } => self.handle_callback(&event_id, &status, &message),
            StoreCommand::CodeVersion {
                event_id,
                code_version,
            } => self.handle_code_version(&event_id, &code_version),
        }
    }

    fn handle_callback(&self, event_id: &str, status: &str, message: &str) {
        let params = WebhookParams::from([
            ("event_id".to_string(), event_id.to_string()),
            ("status".to_string(), status.to_string()),
            ("message".to_string(), message.to_string()),
        ]);
        self.collaborators
            .webhooks
            .run_webhook_with_parameter(WebhookEvent::UpdateEventStatus, params);

        info!(event_id, status, "Updating event status");
        let update = ServiceEventUpdate::status(event_id, status, message);
        if let Err(e) = self.collaborators.records.update_service_event(&update) {
            warn!(event_id, error = %e, "Failed to update service event status");
        }
    }

    fn handle_code_version(&self, event_id: &str, code_version: &str) {
        let params = WebhookParams::from([
            ("event_id".to_string(), event_id.to_string()),
            ("code_version".to_string(), code_version.to_string()),
        ]);
        self.collaborators
            .webhooks
            .run_webhook_with_parameter(WebhookEvent::UpdateEventCodeVersion, params);

        let records = &self.collaborators.records;
        let update = ServiceEventUpdate::code_version(event_id, code_version);
        if let Err(e) = records.update_service_event(&update) {
            warn!(event_id, error = %e, "Failed to update service event code version");
        }

        match records.version_by_event_id(event_id) {
            Ok(Some(mut version)) => {
                version.code_version = code_version.to_string();
                if let Err(e) = records.update_version_info(&version) {
                    warn!(event_id, error = %e, "Failed to update version info code version");
                }
            }
            Ok(None) => debug!(event_id, "No version info for event"),
            Err(e) => warn!(event_id, error = %e, "Failed to load version info"),
        }
        info!(event_id, code_version, "Ran code version webhook");
    }

    pub(crate) async fn command_loop(
        self: Arc<Self>,
        mut commands: mpsc::UnboundedReceiver<StoreCommand>,
        cancel: CancellationToken,
    ) {
        debug!("Message store command loop start.");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command).await,
                    None => break,
                },
            }
        }

        // Commands queued before cancellation still run.
        let mut drained = 0usize;
        while let Ok(command) = commands.try_recv() {
            self.dispatch(command).await;
            drained += 1;
        }
        debug!(drained, "Message store command loop stop.");
    }

    async fn dispatch(self: &Arc<Self>, command: StoreCommand) {
        let store = Arc::clone(self);
        if let Err(e) = tokio::task::spawn_blocking(move || store.handle_command(command)).await {
            error!(error = %e, "Command task failed");
        }
    }
}
