#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// An options document could not be turned into field inputs.
    InvalidOptions { message: String },
    /// A file extension or format name no enabled format understands.
    UnknownFormat { name: String },
}

impl FieldError {
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOptions { message } => write!(f, "invalid field options: {message}"),
            Self::UnknownFormat { name } => write!(f, "unsupported document format '{name}'"),
        }
    }
}

impl std::error::Error for FieldError {}
