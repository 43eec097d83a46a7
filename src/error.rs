//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This enables
//! a uniform `Result<T>` alias throughout the crate while preserving the
//! `[line N] Error<where>: <msg>` diagnostic shape.
//!
//! The module does not print diagnostics itself; that is the job of
//! [`ErrorReporter`], which the driver owns and lends to each phase.

use std::io;

use log::info;
use thiserror::Error;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CorvidError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error at a specific token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static-analysis (resolver) failure.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error, carrying the offending token's position.
    #[error("[line {line}] Error at '{lexeme}': {message}")]
    Runtime {
        message: String,
        lexeme: String,
        line: usize,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl CorvidError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        CorvidError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Parse error: line={}, at={}, msg={}",
            token.line, token.lexeme, message
        );

        CorvidError::Parse {
            message,
            location: locate(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, at={}, msg={}",
            token.line, token.lexeme, message
        );

        CorvidError::Resolve {
            message,
            location: locate(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: line={}, at={}, msg={}",
            token.line, token.lexeme, message
        );

        CorvidError::Runtime {
            message,
            lexeme: token.lexeme.clone(),
            line: token.line,
        }
    }
}

/// `" at end"` for the stream terminator, `" at '<lexeme>'"` otherwise.
fn locate(token: &Token) -> String {
    if token.token_type == TokenType::END {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CorvidError>;

/// Collects diagnostics across the pipeline phases.
///
/// Owned by the driver and borrowed by each phase in turn; replaces a
/// process-wide error flag so a fresh run starts clean.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    had_error: bool,
    had_runtime_error: bool,
    diagnostics: Vec<String>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a scan, parse, or resolve error.
    pub fn error(&mut self, err: &CorvidError) {
        self.had_error = true;
        self.emit(err);
    }

    /// Report an error that unwound the evaluator.
    pub fn runtime_error(&mut self, err: &CorvidError) {
        self.had_runtime_error = true;
        self.emit(err);
    }

    fn emit(&mut self, err: &CorvidError) {
        let rendered: String = err.to_string();

        eprintln!("{}", rendered);

        self.diagnostics.push(rendered);
    }

    #[inline]
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    #[inline]
    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Every diagnostic emitted so far, in report order.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}
