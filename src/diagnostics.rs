//! Unified, `miette`-based diagnostics for the GSS node primitive.
//!
//! Every fallible operation in this crate reports a [`GssError`]. Construct
//! errors with the `err_msg!` and `err_ctx!` macros rather than building the
//! variants by hand:
//!
//! - `err_msg!(Argument, "unexpected keyword argument '{}'", name)` for
//!   message-only errors.
//! - `err_ctx!(Config, "invalid value", src, span)` when a source text and a
//!   location inside it are known (configuration files).
//! - `err_ctx!(Config, "invalid value", src, span, help)` to attach help.

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type SourceArc = Arc<NamedSource<String>>;

/// A byte range inside a diagnostic source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// A one-byte span at `offset`.
    pub fn point(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset + 1,
        }
    }

    fn len(&self) -> usize {
        if self.end > self.start {
            self.end - self.start
        } else {
            1
        }
    }
}

/// Type-safe error classification matching the [`GssError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Node storage could not be obtained.
    Allocation,
    /// Construction was invoked with an unsupported argument shape.
    Argument,
    /// A configuration document could not be read or is invalid.
    Config,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Allocation => "AllocationError",
            ErrorType::Argument => "ArgumentError",
            ErrorType::Config => "ConfigError",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The source text the error points into (if any).
    pub source: Option<SourceArc>,
    /// The location inside `source` (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_help(help: impl Into<String>) -> Self {
        Self {
            help: Some(help.into()),
            ..Self::default()
        }
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure mode of node construction and configuration.
#[derive(Debug, Error)]
pub enum GssError {
    #[error("Allocation error: {message}")]
    Allocation {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<DynError>,
    },
    #[error("Argument error: {message}")]
    Argument {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<DynError>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<DynError>,
    },
}

impl GssError {
    fn parts(&self) -> (&str, &ErrorContext) {
        match self {
            GssError::Allocation { message, ctx, .. }
            | GssError::Argument { message, ctx, .. }
            | GssError::Config { message, ctx, .. } => (message.as_str(), ctx),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        match self {
            GssError::Allocation { .. } => ErrorType::Allocation,
            GssError::Argument { .. } => ErrorType::Argument,
            GssError::Config { .. } => ErrorType::Config,
        }
    }

    pub fn message(&self) -> &str {
        self.parts().0
    }

    /// Attaches an underlying cause, replacing any previous one.
    pub fn with_source<E>(mut self, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match &mut self {
            GssError::Allocation { source, .. }
            | GssError::Argument { source, .. }
            | GssError::Config { source, .. } => *source = Some(Box::new(err)),
        }
        self
    }
}

impl Diagnostic for GssError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!("gss::{}", self.error_type())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.parts()
            .1
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.parts()
            .1
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (message, ctx) = self.parts();
        // A label without source code cannot be rendered.
        ctx.source.as_ref()?;
        let span = ctx.span?;
        let label = LabeledSpan::new(Some(message.to_string()), span.start, span.len());
        Some(Box::new(std::iter::once(label)))
    }
}

/// Wraps a source text into a named, shareable diagnostic source.
pub fn to_error_source<S: AsRef<str>>(name: &str, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Constructs a [`GssError`] variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $($fmt:tt)+) => {
        $crate::GssError::$variant {
            message: format!($($fmt)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a [`GssError`] variant pointing into a source text.
///
/// `src` must be a [`SourceArc`]; `span` a [`Span`].
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::GssError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::GssError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(
                $crate::diagnostics::SourceArc::clone($src),
                $span,
            ),
            source: None,
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn test_error_type_matches_variant() {
        let err = crate::err_msg!(Argument, "too many arguments ({})", 2);
        assert_eq!(err.error_type(), ErrorType::Argument);
        assert_eq!(err.message(), "too many arguments (2)");
        assert_eq!(err.to_string(), "Argument error: too many arguments (2)");
    }

    #[test]
    fn test_labeled_report_renders_source_and_help() {
        let src = to_error_source("gss.yaml", "max_live_nodes: zero\n");
        let err = crate::err_ctx!(
            Config,
            "expected an integer",
            &src,
            Span::new(16, 20),
            "use a positive integer"
        );
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("expected an integer"));
        assert!(output.contains("use a positive integer"));
        assert!(output.contains("gss::ConfigError"));
    }

    #[test]
    fn test_labels_absent_without_source() {
        let err = crate::err_msg!(Allocation, "limit reached");
        assert!(err.labels().is_none());
        assert!(err.help().is_none());
    }

    #[test]
    fn test_source_absent_unless_attached() {
        let err = crate::err_msg!(Argument, "bad shape");
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_with_source_chains_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = crate::err_msg!(Config, "cannot read config").with_source(io);
        let cause = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(cause.as_deref(), Some("missing"));
    }
}
