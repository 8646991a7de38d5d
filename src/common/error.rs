//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{Buffer, ColorChoice, StandardStream};
use thiserror::Error;

use super::Span;

/// Diagnostic severities produced by analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Declaration,
    Type,
    Syntax,
}

/// Analysis error with source location
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Declaration error at {span:?}: {message}")]
    Declaration { message: String, span: Span },

    #[error("Type error at {span:?}: {message}")]
    Type { message: String, span: Span },

    #[error("Syntax error at {span:?}: {message}")]
    Syntax { message: String, span: Span },
}

impl CompileError {
    pub fn declaration(message: impl Into<String>, span: Span) -> Self {
        Self::Declaration {
            message: message.into(),
            span,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::Type {
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::Syntax {
            message: message.into(),
            span,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Declaration { .. } => ErrorKind::Declaration,
            Self::Type { .. } => ErrorKind::Type,
            Self::Syntax { .. } => ErrorKind::Syntax,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Declaration { message, .. }
            | Self::Type { message, .. }
            | Self::Syntax { message, .. } => message,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::Declaration { span, .. }
            | Self::Type { span, .. }
            | Self::Syntax { span, .. } => *span,
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Collects analysis errors instead of aborting on the first one.
///
/// Visitors report through this and keep walking; the caller inspects
/// the collected list when the pass finishes. After [`MAX_ERRORS`]
/// entries the reporter stops recording and raises the overflow flag,
/// which the analyzer checks at statement boundaries to cut the walk
/// short.
///
/// [`MAX_ERRORS`]: ErrorReporter::MAX_ERRORS
#[derive(Debug, Default)]
pub struct ErrorReporter {
    errors: Vec<CompileError>,
    overflown: bool,
}

impl ErrorReporter {
    /// Error budget before the reporter refuses further entries
    pub const MAX_ERRORS: usize = 256;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn declaration_error(&mut self, span: Span, message: impl Into<String>) {
        self.report(CompileError::declaration(message, span));
    }

    pub fn type_error(&mut self, span: Span, message: impl Into<String>) {
        self.report(CompileError::type_error(message, span));
    }

    pub fn syntax_error(&mut self, span: Span, message: impl Into<String>) {
        self.report(CompileError::syntax(message, span));
    }

    pub fn error(&mut self, kind: ErrorKind, span: Span, message: impl Into<String>) {
        match kind {
            ErrorKind::Declaration => self.declaration_error(span, message),
            ErrorKind::Type => self.type_error(span, message),
            ErrorKind::Syntax => self.syntax_error(span, message),
        }
    }

    fn report(&mut self, error: CompileError) {
        if self.errors.len() >= Self::MAX_ERRORS {
            self.overflown = true;
            return;
        }
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// True once the error budget is exhausted; the analysis stops early
    pub fn has_overflown(&self) -> bool {
        self.overflown
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }
}

/// Renders collected errors with source snippets
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    fn diagnostic(&self, file_id: usize, error: &CompileError) -> Diagnostic<usize> {
        let (title, message, span) = match error {
            CompileError::Declaration { message, span } => ("Declaration error", message, span),
            CompileError::Type { message, span } => ("Type error", message, span),
            CompileError::Syntax { message, span } => ("Syntax error", message, span),
        };
        Diagnostic::error().with_message(title).with_labels(vec![
            Label::primary(file_id, span.start..span.end).with_message(message),
        ])
    }

    /// Print an error to stderr
    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let _ = term::emit(
            &mut writer.lock(),
            &self.config,
            &self.files,
            &self.diagnostic(file_id, error),
        );
    }

    /// Render errors into a string, for embedding or assertions
    pub fn render(&self, file_id: usize, errors: &[CompileError]) -> String {
        let mut buffer = Buffer::no_color();
        for error in errors {
            let _ = term::emit(
                &mut buffer,
                &self.config,
                &self.files,
                &self.diagnostic(file_id, error),
            );
        }
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
