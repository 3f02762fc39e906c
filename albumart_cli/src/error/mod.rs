use albumart_core::error::{CatalogError, IoErrorKind};
use colored::*;
use std::error::Error as StdError;
use std::fmt;

/// CLI-specific error type with semantic exit codes
#[derive(Debug)]
pub struct CliError {
    /// The main error message
    message: String,

    /// Error category for exit code determination
    category: ErrorCategory,

    /// Additional context information
    context: Vec<(String, String)>,

    /// Suggestions for recovery
    pub suggestions: Vec<String>,

    /// Source error if any
    source: Option<Box<dyn StdError + Send + Sync>>,
}

/// Error categories that map to exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorCategory {
    General,
    Misuse,
    Network,
    Filesystem,
}

/// Semantic exit codes for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    Misuse = 2,
    NetworkError = 3,
    FilesystemError = 4,
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Extension trait for adding context to errors
pub trait ErrorContext {
    fn with_context(self, key: &str, value: &str) -> Self;
    fn with_suggestion(self, suggestion: &str) -> Self;
    fn with_source(self, source: Box<dyn StdError + Send + Sync>) -> Self;
}

impl CliError {
    fn with_category(message: &str, category: ErrorCategory) -> Self {
        Self {
            message: message.to_string(),
            category,
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    /// Create a general error
    pub fn general(message: &str) -> Self {
        Self::with_category(message, ErrorCategory::General)
    }

    /// Create a command misuse error
    pub fn misuse(message: &str) -> Self {
        let mut error = Self::with_category(message, ErrorCategory::Misuse);
        error
            .suggestions
            .push("Run 'albumart --help' for usage information".to_string());

        if message.contains("client_id") || message.contains("client_secret") {
            error.suggestions.insert(
                0,
                "Run 'albumart config init' or pass --client-id/--client-secret".to_string(),
            );
        }

        error
    }

    /// Create a network error
    pub fn network(message: &str) -> Self {
        let mut error = Self::with_category(message, ErrorCategory::Network);
        error.suggestions = vec![
            "Check your internet connection".to_string(),
            "Try again later".to_string(),
        ];
        error
    }

    /// Create a filesystem error
    pub fn filesystem(message: &str) -> Self {
        let mut error = Self::with_category(message, ErrorCategory::Filesystem);

        if message.contains("not found") {
            error
                .suggestions
                .push("Check if the dataset file exists".to_string());
        } else if message.contains("ermission") {
            error.suggestions.push("Check file permissions".to_string());
        }

        error
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self.category {
            ErrorCategory::General => ExitCode::GeneralError,
            ErrorCategory::Misuse => ExitCode::Misuse,
            ErrorCategory::Network => ExitCode::NetworkError,
            ErrorCategory::Filesystem => ExitCode::FilesystemError,
        }
    }

    fn label(&self) -> &'static str {
        match self.category {
            ErrorCategory::General => "Error",
            ErrorCategory::Misuse => "Usage Error",
            ErrorCategory::Network => "Network Error",
            ErrorCategory::Filesystem => "File Error",
        }
    }

    /// Format the error for user display
    pub fn format_for_user(&self, debug: bool) -> String {
        let mut output = String::new();

        let prefix = match self.category {
            ErrorCategory::Misuse => self.label().yellow(),
            _ => self.label().red(),
        };
        output.push_str(&format!("{}: {}\n", prefix, self.message));

        if !self.context.is_empty() {
            output.push_str("\nContext:\n");
            for (key, value) in &self.context {
                output.push_str(&format!("  {}: {}\n", key.bold(), value));
            }
        }

        // Error chain in debug mode
        if debug && let Some(source) = &self.source {
            output.push_str("\nCaused by:\n");
            let mut current: Option<&dyn StdError> = Some(source.as_ref());
            let mut level = 1;

            while let Some(err) = current {
                output.push_str(&format!("  {level}: {err}\n"));
                current = err.source();
                level += 1;
            }
        }

        if !self.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in &self.suggestions {
                output.push_str(&format!("  • {suggestion}\n"));
            }
        }

        output
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.message)?;

        for (key, value) in &self.context {
            write!(f, " ({key}: {value})")?;
        }

        Ok(())
    }
}

impl StdError for CliError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl ErrorContext for CliError {
    fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.push((key.to_string(), value.to_string()));
        self
    }

    fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestions.push(suggestion.to_string());
        self
    }

    fn with_source(mut self, source: Box<dyn StdError + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }
}

/// Map core errors onto exit-code categories
impl From<albumart_core::Error> for CliError {
    fn from(error: albumart_core::Error) -> Self {
        use albumart_core::Error;

        let message = error.to_string();
        let cli_error = match &error {
            Error::Io(io) => {
                let mut cli_error = Self::filesystem(&message);
                if let Some(path) = &io.path {
                    cli_error = cli_error.with_context("path", &path.display().to_string());
                }
                if io.kind == IoErrorKind::Other {
                    cli_error = cli_error.with_suggestion("Check free disk space");
                }
                cli_error
            }
            Error::Catalog(CatalogError::Auth { .. }) => {
                Self::network(&message).with_suggestion("Verify the client id and secret")
            }
            Error::Catalog(_) => Self::network(&message),
            Error::Validation(_) => Self::misuse(&message),
            Error::Csv { .. } => Self::general(&message)
                .with_suggestion("Check that the input is a comma-separated file"),
        };

        cli_error.with_source(Box::new(error))
    }
}

/// Convert anyhow errors to CLI errors
impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        Self::general(&format!("{error:#}"))
    }
}
