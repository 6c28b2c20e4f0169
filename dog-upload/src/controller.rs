use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::{
    FilePicker, LocalFileRef, MediaKind, PickError, UploadError, UploadPipeline, UploadResult,
};

/// Outcome of [`UploadController::submit`]
#[derive(Debug)]
pub enum Submission {
    /// Another upload from this controller is still running; nothing was started
    InFlight,
    /// The pipeline ran to completion
    Finished(UploadResult),
}

impl Submission {
    pub fn into_result(self) -> Option<UploadResult> {
        match self {
            Submission::InFlight => None,
            Submission::Finished(result) => Some(result),
        }
    }
}

/// Caller-side state around one pipeline: the current selection and the
/// in-flight flag that disables re-entry while an upload runs.
pub struct UploadController {
    picker: Arc<dyn FilePicker>,
    pipeline: Arc<UploadPipeline>,
    selection: Mutex<Option<LocalFileRef>>,
    in_flight: AtomicBool,
}

impl UploadController {
    pub fn new<P: FilePicker + 'static>(picker: P, pipeline: Arc<UploadPipeline>) -> Self {
        Self {
            picker: Arc::new(picker),
            pipeline,
            selection: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Ask the picker for a file. Cancelling clears the current selection.
    ///
    /// A denied permission surfaces here, before anything is read or uploaded.
    pub async fn choose(&self, kind: MediaKind) -> Result<Option<LocalFileRef>, UploadError> {
        let picked = match self.picker.pick_one(kind).await {
            Ok(picked) => picked,
            Err(e @ PickError::Io { .. }) => {
                error!("Unexpected failure while picking {}: {}", kind, e);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        if picked.is_none() {
            debug!("{} selection cancelled", kind);
        }
        *self.selection.lock() = picked.clone();
        Ok(picked)
    }

    /// Currently selected file, if any
    pub fn selected(&self) -> Option<LocalFileRef> {
        self.selection.lock().clone()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Upload the current selection to the collection configured for its kind.
    ///
    /// The selection is cleared on success and restored on failure so the
    /// user can retry; every attempt mints a fresh object name.
    pub async fn submit(&self) -> Submission {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Upload already in flight");
            return Submission::InFlight;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let file = self.selection.lock().take();
        let retained = file.clone();

        let result = self.pipeline.upload_to_default(file).await;

        if result.is_err() {
            let mut selection = self.selection.lock();
            if selection.is_none() {
                *selection = retained;
            }
        }

        Submission::Finished(result)
    }
}

/// Clears the in-flight flag even if the submitting future is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
