use thiserror::Error;

/// Result type for a pipeline run: a receipt, or a classified failure
pub type UploadResult<T = crate::UploadReceipt> = Result<T, UploadError>;

/// Failure categories a caller can show to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoFileSelected,
    PermissionDenied,
    EncodingFailed,
    StoreRejected,
    UnexpectedFailure,
}

impl ErrorKind {
    /// Stable name of the kind (e.g. "StoreRejected")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NoFileSelected => "NoFileSelected",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::EncodingFailed => "EncodingFailed",
            ErrorKind::StoreRejected => "StoreRejected",
            ErrorKind::UnexpectedFailure => "UnexpectedFailure",
        }
    }

    /// Short message suitable for an alert or a status line
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::NoFileSelected => "Select a file first.",
            ErrorKind::PermissionDenied => "Allow access to your media library to continue.",
            ErrorKind::EncodingFailed => "The selected file could not be read.",
            ErrorKind::StoreRejected => "The upload was rejected by storage.",
            ErrorKind::UnexpectedFailure => "Unexpected error while uploading.",
        }
    }

    /// Every kind can be retried by re-invoking with a fresh or re-selected file
    pub fn is_retryable(&self) -> bool {
        true
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors surfaced by the upload pipeline and the upload controller
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("Permission denied: {detail}")]
    PermissionDenied { detail: String },

    #[error("Encoding failed: {source}")]
    EncodingFailed {
        #[from]
        source: EncodeError,
    },

    #[error("{message}")]
    StoreRejected { message: String },

    #[error("Unexpected failure: {detail}")]
    Unexpected { detail: String },
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::NoFileSelected => ErrorKind::NoFileSelected,
            UploadError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            UploadError::EncodingFailed { .. } => ErrorKind::EncodingFailed,
            UploadError::StoreRejected { .. } => ErrorKind::StoreRejected,
            UploadError::Unexpected { .. } => ErrorKind::UnexpectedFailure,
        }
    }

    /// Detail carried with the failure. For `StoreRejected` this is the
    /// store's message, unchanged.
    pub fn detail(&self) -> String {
        match self {
            UploadError::NoFileSelected => "no file selected".to_string(),
            UploadError::PermissionDenied { detail } => detail.clone(),
            UploadError::EncodingFailed { source } => source.to_string(),
            UploadError::StoreRejected { message } => message.clone(),
            UploadError::Unexpected { detail } => detail.clone(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }

    pub fn permission_denied<S: Into<String>>(detail: S) -> Self {
        Self::PermissionDenied {
            detail: detail.into(),
        }
    }

    pub fn unexpected<S: Into<String>>(detail: S) -> Self {
        Self::Unexpected {
            detail: detail.into(),
        }
    }
}

impl From<StoreError> for UploadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected { message } => Self::StoreRejected { message },
        }
    }
}

impl From<PickError> for UploadError {
    fn from(err: PickError) -> Self {
        match err {
            PickError::PermissionDenied { detail } => Self::PermissionDenied { detail },
            PickError::Io { source } => Self::Unexpected {
                detail: format!("file picker failed: {}", source),
            },
        }
    }
}

/// Errors turning a local file into transferable bytes
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Invalid base64 content: {source}")]
    Base64 {
        #[from]
        source: base64::DecodeError,
    },

    #[error("Unsupported URI: {uri}")]
    UnsupportedUri { uri: String },

    #[error("Failed to fetch {uri}: {message}")]
    Fetch { uri: String, message: String },

    #[error("Malformed file reference: {message}")]
    Malformed { message: String },
}

impl EncodeError {
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn unsupported_uri<S: Into<String>>(uri: S) -> Self {
        Self::UnsupportedUri { uri: uri.into() }
    }

    pub fn fetch<S: Into<String>, M: Into<String>>(uri: S, message: M) -> Self {
        Self::Fetch {
            uri: uri.into(),
            message: message.into(),
        }
    }
}

/// Failure reported by a remote store. The message is kept verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{message}")]
    Rejected { message: String },
}

impl StoreError {
    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// An object already exists under the requested name
    pub fn conflict() -> Self {
        Self::rejected("The resource already exists")
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Rejected { message } => message,
        }
    }
}

/// Errors from a file picker
#[derive(Error, Debug)]
pub enum PickError {
    #[error("Permission denied: {detail}")]
    PermissionDenied { detail: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Errors from a completion notifier. Never surfaced to pipeline callers.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification failed: {reason}")]
    Failed { reason: String },
}

impl NotifyError {
    pub fn failed<S: Into<String>>(reason: S) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Errors loading configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("{key} environment variable required")]
    Missing { key: String },
}
