use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{MediaKind, NotifyError};

/// Best-effort completion signal (local notification, push, chat message...)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_completion(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Title and body shown when an upload finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionNotice {
    pub title: String,
    pub body: String,
}

impl CompletionNotice {
    pub fn for_kind(kind: MediaKind) -> Self {
        Self {
            title: "Upload complete".to_string(),
            body: format!("Your {} was uploaded successfully!", kind.label()),
        }
    }
}

/// Notifier that only writes the notice to the log
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_completion(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        info!("{}: {}", title, body);
        Ok(())
    }
}

/// Send `notice` on a detached task. The outcome is logged and otherwise dropped.
///
/// Returns a handle that resolves once the notice has been handled, or `None`
/// when there is no tokio runtime to run it on.
pub(crate) fn spawn_notification(
    notifier: Arc<dyn Notifier>,
    notice: CompletionNotice,
) -> Option<JoinHandle<()>> {
    let runtime = match Handle::try_current() {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!("Skipping completion notification, no tokio runtime: {}", e);
            return None;
        }
    };

    let task = runtime.spawn(async move {
        if let Err(e) = notifier.notify_completion(&notice.title, &notice.body).await {
            warn!("Completion notification failed: {}", e);
        }
    });

    // A panicking notifier only poisons its own task.
    Some(runtime.spawn(async move {
        if let Err(e) = task.await {
            if e.is_panic() {
                warn!("Completion notifier panicked");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tracing_test::traced_test;

    struct Recording(mpsc::UnboundedSender<(String, String)>);

    #[async_trait]
    impl Notifier for Recording {
        async fn notify_completion(&self, title: &str, body: &str) -> Result<(), NotifyError> {
            let _ = self.0.send((title.to_string(), body.to_string()));
            Ok(())
        }
    }

    #[test]
    fn notice_names_the_media_kind() {
        let notice = CompletionNotice::for_kind(MediaKind::Video);
        assert_eq!(notice.title, "Upload complete");
        assert_eq!(notice.body, "Your video was uploaded successfully!");
    }

    #[tokio::test]
    async fn spawned_notification_is_delivered() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_notification(Arc::new(Recording(tx)), CompletionNotice::for_kind(MediaKind::Image));

        let (title, body) = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .expect("Timeout waiting for notification")
            .expect("Channel closed");
        assert_eq!(title, "Upload complete");
        assert_eq!(body, "Your image was uploaded successfully!");
    }

    #[test]
    #[traced_test]
    fn notification_is_skipped_outside_a_runtime() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_notification(Arc::new(Recording(tx)), CompletionNotice::for_kind(MediaKind::Image));

        assert!(handle.is_none());
        assert!(rx.try_recv().is_err());
        assert!(logs_contain("Skipping completion notification"));
    }
}
