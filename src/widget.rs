//! The upload widget: file selection, submission and the view derived from them
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    client::UploadApi,
    config::UploaderConfig,
    error::{Result, UploaderError},
    file::SelectedFile,
};

/// Where the widget is in the upload lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadState {
    #[default]
    Idle,
    Loading,
    Done,
    Failed,
}

/// A record of a completed upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    /// The id the upload API assigned to the file
    pub id: String,
    /// The public URL of the stored file
    pub link: String,
    pub uploaded_at: DateTime<Utc>,
    /// When the storage service is expected to discard the file
    pub expires_at: DateTime<Utc>,
}

/// What the picker shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickerView {
    /// True while an upload is in flight; the picker ignores input
    pub inert: bool,
    pub file_name: Option<String>,
    /// The last pick was rejected for being over the limit
    pub oversize_warning: bool,
    pub max_file_size: u64,
}

impl PickerView {
    /// The size hint printed under the picker, e.g. "Maximum: 2Mb"
    pub fn limit_hint(&self) -> String {
        let mb = self.max_file_size as f64 / (1024.0 * 1024.0);
        if mb.fract() == 0.0 {
            format!("Maximum: {}Mb", mb as u64)
        } else {
            format!("Maximum: {:.1}Mb", mb)
        }
    }
}

/// Everything a front-end needs to draw the widget
///
/// Produced by [`UploadWidget::render`].  The picker is always present, the
/// rest depends on the upload state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View {
    pub picker: PickerView,
    pub submit_enabled: bool,
    pub progress: bool,
    pub result_link: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Default)]
struct WidgetState {
    upload_state: UploadState,
    selected: Option<SelectedFile>,
    oversize_warning: bool,
    last_rejection: Option<String>,
    receipt: Option<UploadReceipt>,
    failure: Option<String>,
    torn_down: bool,
}

/// Orchestrates selecting, validating and uploading a single file
///
/// The widget is shared (typically behind an [`Arc`]) between whatever draws
/// it and the task awaiting [`UploadWidget::submit`].  Internal state is only
/// locked for short synchronous sections, never across the network call.
///
/// ```ignore
/// let config = UploaderConfig::from_env()?;
/// let widget = UploadWidget::new(config.clone(), Arc::new(UploadClient::new(&config)));
///
/// widget.select_file(SelectedFile::from_path("cat.png").await?);
/// if widget.submit().await? == UploadState::Done {
///     println!("{}", widget.result_link().unwrap());
/// }
/// ```
#[derive(Debug)]
pub struct UploadWidget {
    api: Arc<dyn UploadApi>,
    config: UploaderConfig,
    state: Mutex<WidgetState>,
    cancel: CancellationToken,
}

impl UploadWidget {
    pub fn new(config: UploaderConfig, api: Arc<dyn UploadApi>) -> Self {
        Self {
            api,
            config,
            state: Mutex::new(WidgetState::default()),
            cancel: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WidgetState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Offers a file to the widget
    ///
    /// A file over the size limit is not kept: the selection is cleared and the
    /// oversize warning raised.  A file within the limit replaces the selection
    /// and clears the warning.  Either way the outcome is only visible through
    /// the widget's state.  While an upload is in flight the picker is inert
    /// and the file is ignored.
    pub fn select_file(&self, candidate: SelectedFile) {
        let mut state = self.lock();
        if state.upload_state == UploadState::Loading {
            debug!(name = candidate.name(), "ignoring pick while uploading");
            return;
        }
        self.select_locked(&mut state, candidate);
    }

    /// Handles a pick from the file picker
    ///
    /// Only the first file is considered.  An empty pick clears the warning
    /// but keeps whatever was selected before.  Ignored while uploading.
    pub fn select_files(&self, candidates: impl IntoIterator<Item = SelectedFile>) {
        let mut state = self.lock();
        if state.upload_state == UploadState::Loading {
            debug!("ignoring pick while uploading");
            return;
        }

        state.oversize_warning = false;
        state.last_rejection = None;
        if let Some(first) = candidates.into_iter().next() {
            self.select_locked(&mut state, first);
        }
    }

    fn select_locked(&self, state: &mut WidgetState, candidate: SelectedFile) {
        let limit = self.config.max_file_size;

        if candidate.size() > limit {
            warn!(
                name = candidate.name(),
                size = candidate.size(),
                limit,
                "rejecting oversize file"
            );
            let reason = UploaderError::FileTooLarge {
                size: candidate.size(),
                limit,
            };
            state.selected = None;
            state.oversize_warning = true;
            state.last_rejection = Some(reason.to_string());
            return;
        }

        debug!(
            name = candidate.name(),
            size = candidate.size(),
            "file selected"
        );
        state.selected = Some(candidate);
        state.oversize_warning = false;
        state.last_rejection = None;
    }

    /// Uploads the selected file
    ///
    /// The call is rejected (and nothing changes) when no file is selected,
    /// when an upload is already in flight, or after [`UploadWidget::teardown`].
    ///
    /// Otherwise exactly one request is made and the terminal state is
    /// returned: [`UploadState::Done`] with a result link, or
    /// [`UploadState::Failed`] with an error message.  Upload failures never
    /// surface as `Err`.
    pub async fn submit(&self) -> Result<UploadState> {
        let file = {
            let mut state = self.lock();
            if state.torn_down {
                return Err(UploaderError::TornDown);
            }
            if state.upload_state == UploadState::Loading {
                return Err(UploaderError::UploadInProgress);
            }
            let file = state.selected.clone().ok_or(UploaderError::NoFileSelected)?;
            state.upload_state = UploadState::Loading;
            state.failure = None;
            file
        };

        info!(name = file.name(), size = file.size(), "uploading file");

        let outcome = tokio::select! {
            _ = self.cancel.cancelled() => Err(UploaderError::Cancelled),
            result = tokio::time::timeout(self.config.timeout, self.api.upload(&file)) => {
                result.unwrap_or(Err(UploaderError::Timeout(self.config.timeout)))
            }
        };

        let uploaded_at = Utc::now();
        let outcome = outcome.and_then(|response| {
            let expires_at = uploaded_at
                .checked_add_signed(self.config.retention)
                .ok_or_else(|| {
                    UploaderError::InvalidConfig(format!(
                        "retention of {}h overflows the expiry time",
                        self.config.retention.num_hours()
                    ))
                })?;
            Ok(UploadReceipt {
                link: self.api.link_for(&response.id),
                id: response.id,
                uploaded_at,
                expires_at,
            })
        });

        let mut state = self.lock();
        match outcome {
            Ok(receipt) => {
                info!(id = %receipt.id, link = %receipt.link, "upload complete");
                state.receipt = Some(receipt);
                state.upload_state = UploadState::Done;
            }
            Err(err) => {
                warn!(error = %err, name = file.name(), "upload failed");
                state.receipt = None;
                state.failure = Some(err.to_string());
                state.upload_state = UploadState::Failed;
            }
        }
        Ok(state.upload_state)
    }

    /// Cancels any upload in flight and refuses further submissions
    pub fn teardown(&self) {
        if !self.cancel.is_cancelled() {
            debug!("tearing down upload widget");
        }
        self.lock().torn_down = true;
        self.cancel.cancel();
    }

    /// Maps the current state to what should be drawn
    pub fn render(&self) -> View {
        let state = self.lock();
        let loading = state.upload_state == UploadState::Loading;

        View {
            picker: PickerView {
                inert: loading,
                file_name: state.selected.as_ref().map(|f| f.name().to_string()),
                oversize_warning: state.oversize_warning,
                max_file_size: self.config.max_file_size,
            },
            submit_enabled: match state.upload_state {
                UploadState::Idle | UploadState::Failed => state.selected.is_some(),
                UploadState::Loading | UploadState::Done => false,
            },
            progress: loading,
            result_link: match state.upload_state {
                UploadState::Done => state.receipt.as_ref().map(|r| r.link.clone()),
                _ => None,
            },
            error_message: match state.upload_state {
                UploadState::Failed => state.failure.clone(),
                _ => None,
            },
        }
    }

    pub fn state(&self) -> UploadState {
        self.lock().upload_state
    }

    pub fn selected_file(&self) -> Option<SelectedFile> {
        self.lock().selected.clone()
    }

    pub fn oversize_warning(&self) -> bool {
        self.lock().oversize_warning
    }

    /// Why the last pick was refused, if it was
    pub fn last_rejection(&self) -> Option<String> {
        self.lock().last_rejection.clone()
    }

    /// The link to the uploaded file; only set once an upload is done
    pub fn result_link(&self) -> Option<String> {
        let state = self.lock();
        match state.upload_state {
            UploadState::Done => state.receipt.as_ref().map(|r| r.link.clone()),
            _ => None,
        }
    }

    pub fn receipt(&self) -> Option<UploadReceipt> {
        let state = self.lock();
        match state.upload_state {
            UploadState::Done => state.receipt.clone(),
            _ => None,
        }
    }

    /// The message explaining the last failed upload
    pub fn failure(&self) -> Option<String> {
        let state = self.lock();
        match state.upload_state {
            UploadState::Failed => state.failure.clone(),
            _ => None,
        }
    }
}

impl Drop for UploadWidget {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
