use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Optional file path
    pub file: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Default for SourceLocation {
    /// Start of the input.
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }

    /// Create a source location with file information
    pub fn with_file(file: String, line: usize, column: usize) -> Self {
        Self {
            file: Some(file),
            line,
            column,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Invalid arguments, options or content handed to a layout directive.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectiveError {
    /// A width outside (0.0, 1.0].
    #[error("columnset width '{value:.6}' must be between 0.0 and 1.0")]
    InvalidWidth {
        /// The offending width.
        value: f64,
    },
    /// Declared column widths add up to more than the full text width.
    #[error("cumulative column width '{total:.6}' exceeds 1.0")]
    WidthOverflow {
        /// Sum of the declared widths.
        total: f64,
    },
    /// Nothing is left for columns that did not declare a width.
    #[error("no room for unsized columns '{remainder:.6}'")]
    NoRoomForUnsized {
        /// Requested width minus the declared widths.
        remainder: f64,
    },
    /// An option value could not be converted.
    #[error("invalid value '{value}' for option '{name}'")]
    InvalidOption {
        /// Option name.
        name: String,
        /// Raw option value.
        value: String,
    },
    /// The directive does not accept this option.
    #[error("unknown option '{name}' for directive '{directive}'")]
    UnknownOption {
        /// Directive name.
        directive: String,
        /// Option name.
        name: String,
    },
    /// The directive needs a content block.
    #[error("content block required for directive '{directive}'")]
    MissingContent {
        /// Directive name.
        directive: String,
    },
    /// Wrong number of arguments.
    #[error("directive '{directive}' expects {expected} argument(s), found {found}")]
    ArgumentCount {
        /// Directive name.
        directive: String,
        /// Accepted argument count, e.g. `1` or `0..=1`.
        expected: String,
        /// Supplied argument count.
        found: usize,
    },
    /// A heading appeared in directive content.
    #[error("section titles are not allowed inside directive content")]
    UnexpectedSection,
    /// Directive content could not be parsed.
    #[error("directive content could not be parsed: {0}")]
    Content(String),
}

/// Fatal problems while translating a document tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    /// The tree breaks a structural rule (nesting, unresolved widths).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// Column widths could not be resolved during translation.
    #[error("layout error: {0}")]
    Layout(#[from] DirectiveError),
}

impl TranslateError {
    /// Shorthand for an invariant violation.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}

/// Configuration problems, detected while settings are built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The option is not part of the writer's schema.
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    /// A choice option received a value outside its choices.
    #[error("invalid choice '{value}' for option '{name}' (choose from {choices})")]
    InvalidChoice {
        /// Option name.
        name: String,
        /// Rejected value.
        value: String,
        /// Comma-separated accepted values.
        choices: String,
    },
}

/// Errors that can occur while converting a document.
#[derive(Debug, Error)]
pub enum R2bError {
    /// IO error while reading input or writing output.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// YAML front matter could not be read.
    #[error(transparent)]
    Frontmatter(#[from] crate::frontmatter::FrontmatterError),
    /// markdown-rs parser error surfaced through the adapter.
    #[error("Parse error at {location}: {message}")]
    MarkdownAdapter {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// A serialized document tree could not be decoded.
    #[error("Invalid document tree: {0}")]
    TreeDecode(#[from] serde_json::Error),
    /// Settings were rejected.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
    /// Translation aborted.
    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),
}

impl R2bError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::MarkdownAdapter {
            message: message.into(),
            location: SourceLocation::new(line, column),
        }
    }
}

/// Non-fatal warnings that don't prevent rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// Directive opened but never closed
    UnclosedDirective {
        /// Source location where the directive started
        location: SourceLocation,
        /// Directive name
        name: String,
    },
    /// Markdown construct with no counterpart in the document tree
    UnsupportedMarkup {
        /// Source location of the construct
        location: SourceLocation,
        /// Construct description
        kind: String,
    },
    /// Other potential warnings
    SuspiciousMarkup {
        /// Source location where the suspicious markup was found
        location: SourceLocation,
        /// Warning message
        message: String,
    },
}

impl ParseWarning {
    /// Get the location of this warning
    pub fn location(&self) -> &SourceLocation {
        match self {
            ParseWarning::UnclosedDirective { location, .. } => location,
            ParseWarning::UnsupportedMarkup { location, .. } => location,
            ParseWarning::SuspiciousMarkup { location, .. } => location,
        }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::UnclosedDirective { location, name } => {
                write!(f, "{}: directive '{}' is never closed", location, name)
            }
            ParseWarning::UnsupportedMarkup { location, kind } => {
                write!(f, "{}: unsupported markup dropped ({})", location, kind)
            }
            ParseWarning::SuspiciousMarkup { location, message } => {
                write!(f, "{}: {}", location, message)
            }
        }
    }
}

/// Recoverable error information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverableError {
    /// Error message
    pub message: String,
    /// Source location
    pub location: SourceLocation,
    /// Error severity
    pub severity: ErrorSeverity,
}

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that was recovered from
    Error,
    /// Warning that doesn't prevent rendering
    Warning,
}

impl RecoverableError {
    /// Create a new recoverable error
    pub fn error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            location: SourceLocation::new(line, column),
            severity: ErrorSeverity::Error,
        }
    }

    /// Create an error at an existing location
    pub fn at(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
            severity: ErrorSeverity::Error,
        }
    }

    /// Create a new warning
    pub fn warning(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            location: SourceLocation::new(line, column),
            severity: ErrorSeverity::Warning,
        }
    }
}

impl std::fmt::Display for RecoverableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            ErrorSeverity::Error => "error",
            ErrorSeverity::Warning => "warning",
        };
        write!(f, "{} at {}: {}", severity, self.location, self.message)
    }
}

/// Collection of parse diagnostics (warnings and recoverable errors)
#[derive(Debug, Clone, Default)]
pub struct ParseDiagnostics {
    /// List of non-fatal warnings
    pub warnings: Vec<ParseWarning>,
    /// List of recoverable errors
    pub errors: Vec<RecoverableError>,
}

impl ParseDiagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the diagnostics collection
    pub fn add_warning(&mut self, warning: ParseWarning) {
        self.warnings.push(warning);
    }

    /// Add a recoverable error to the diagnostics collection
    pub fn add_error(&mut self, error: RecoverableError) {
        self.errors.push(error);
    }

    /// Add an error with location
    pub fn add_error_at(&mut self, message: impl Into<String>, line: usize, column: usize) {
        self.errors
            .push(RecoverableError::error(message, line, column));
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Merge another collection into this one
    pub fn extend(&mut self, other: ParseDiagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    /// Get total count of all diagnostics
    pub fn count(&self) -> usize {
        self.warnings.len() + self.errors.len()
    }
}
