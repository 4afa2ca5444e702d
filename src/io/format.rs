use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::FieldError;

/// Supported data formats for options documents and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    #[cfg(feature = "yaml")]
    Yaml,
    #[cfg(feature = "toml")]
    Toml,
}

impl DocumentFormat {
    /// Formats compiled into this build.
    pub fn available() -> Vec<DocumentFormat> {
        vec![
            DocumentFormat::Json,
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml,
            #[cfg(feature = "toml")]
            DocumentFormat::Toml,
        ]
    }

    pub fn from_extension(extension: &str) -> Result<Self, FieldError> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Ok(DocumentFormat::Json),
            #[cfg(feature = "yaml")]
            "yaml" | "yml" => Ok(DocumentFormat::Yaml),
            #[cfg(feature = "toml")]
            "toml" => Ok(DocumentFormat::Toml),
            _ => Err(FieldError::UnknownFormat {
                name: extension.to_string(),
            }),
        }
    }

    /// Picks the format from a file name, defaulting to JSON when there is
    /// no extension.
    pub fn from_path(path: &Path) -> Result<Self, FieldError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(extension) => Self::from_extension(extension),
            None => Ok(DocumentFormat::Json),
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = FieldError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::from_extension(name)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            #[cfg(feature = "yaml")]
            DocumentFormat::Yaml => write!(f, "yaml"),
            #[cfg(feature = "toml")]
            DocumentFormat::Toml => write!(f, "toml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_always_available() {
        assert_eq!("JSON".parse::<DocumentFormat>(), Ok(DocumentFormat::Json));
        assert!(DocumentFormat::available().contains(&DocumentFormat::Json));
        assert_eq!(
            DocumentFormat::from_path(Path::new("field")),
            Ok(DocumentFormat::Json)
        );
    }

    #[test]
    fn unknown_extension_is_reported() {
        let err = DocumentFormat::from_path(Path::new("field.ini")).unwrap_err();
        assert_eq!(
            err,
            FieldError::UnknownFormat {
                name: "ini".to_string()
            }
        );
    }
}
