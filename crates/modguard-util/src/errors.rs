use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for modguard operations that sit outside the engine.
#[derive(Debug, Error, Diagnostic)]
pub enum ModguardError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed `Modguard.toml`.
    #[error("Configuration error: {message}")]
    #[diagnostic(
        code(modguard::config),
        help("Check Modguard.toml for syntax errors or pass --config explicitly")
    )]
    Config { message: String },

    /// Discovering module declarations on disk failed.
    #[error("Module scan failed: {message}")]
    #[diagnostic(code(modguard::scan))]
    Scan { message: String },

    /// The external build oracle could not produce an answer.
    #[error("Build oracle failed: {message}")]
    #[diagnostic(code(modguard::oracle))]
    Oracle { message: String },

    /// The verification run completed and at least one check failed.
    #[error("Verification failed: {failed} of {total} checks did not pass")]
    #[diagnostic(code(modguard::verify))]
    VerificationFailed { failed: usize, total: usize },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
