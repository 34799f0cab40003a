use std::path::PathBuf;

use thiserror::Error;

/// The errors raised while converting a package.
///
/// They are raised wrapped inside an `anyhow::Error`, use `downcast_ref` to inspect them.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// A node or an attribute required by the format is missing from the descriptor.
    #[error("Malformed descriptor {path}: {reason}")]
    MalformedDescriptor {
        /// Path of the descriptor.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },
    /// The problem does not declare the source of its checker.
    #[error("Problem {problem} does not have a checker source")]
    MissingChecker {
        /// Short name of the problem.
        problem: String,
    },
    /// The problem does not ship `testlib.h` among its files.
    #[error("Problem {problem} does not include testlib.h among its files")]
    MissingTestlib {
        /// Short name of the problem.
        problem: String,
    },
    /// A file referenced by the descriptor does not exist.
    #[error("File {path} referenced by problem {problem} does not exist")]
    PathResolution {
        /// Short name of the problem.
        problem: String,
        /// The missing file.
        path: PathBuf,
    },
    /// The validation script of a problem failed.
    #[error("Validation of problem {problem} failed: {reason}")]
    ValidationFailure {
        /// Short name of the problem.
        problem: String,
        /// Exit status or failure description.
        reason: String,
    },
    /// An archive could not be read, extracted or written.
    #[error("Archive error on {path}: {reason}")]
    ArchiveIo {
        /// Path of the archive.
        path: PathBuf,
        /// The underlying error.
        reason: String,
    },
    /// The conversion of the contest was stopped after some validations failed.
    #[error("Conversion aborted, the validation failed for: {}", failed.join(", "))]
    Aborted {
        /// Short names of the problems whose validation failed.
        failed: Vec<String>,
    },
}
