//! Conversion of Polygon problem and contest packages into judge packages.
//!
//! A Polygon package is a directory (or a zip archive) with a `problem.xml` descriptor at its root
//! and all the files it references: tests, checker, `testlib.h`, statements and so on. This crate
//! parses the descriptor into plain data ([`ProblemDescriptor`](polygon/struct.ProblemDescriptor.html))
//! and builds from it one of the supported judge packages:
//!
//! - [`boca`]: a flat, single dataset package with templated shell scripts;
//! - [`jude`]: a package with a `jude.yml` manifest and weighted datasets.
//!
//! The [`contest`] module drives the conversion of a whole Polygon contest, skipping the problems
//! already converted at their current revision and running the validation script of the others.

#![deny(missing_docs)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Error};

pub use convert::Converter;
pub use error::ConversionError;
pub use plan::{plan_output_name, planned_output_name, TargetFormat};
pub use source::{read_revision, SourcePackage};

pub mod boca;
pub mod contest;
mod convert;
mod error;
pub mod jude;
mod plan;
pub mod polygon;
mod source;

lazy_static! {
    /// Directory where the data files are stored. It is taken from the `POLYCONV_DATA_DIR`
    /// environment variable if present, otherwise it will be defaulted to the path of the source
    /// tree.
    pub static ref DATA_DIR: PathBuf = {
        if let Some(dir) = option_env!("POLYCONV_DATA_DIR") {
            dir.into()
        } else {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .parent()
                .expect("Invalid CARGO_MANIFEST_DIR")
                .join("data")
        }
    };
}

/// Configuration of the conversion of the packages.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Multiplier applied to the time limits of the problems.
    pub time_multiplier: f64,
    /// Number of times a solution is run against each test.
    pub repetitions: u32,
    /// Maximum size of the submitted source files, in KiB.
    pub source_size_kib: u64,
    /// Where to write the packages. If not set they are written next to the source package.
    pub output_dir: Option<PathBuf>,
    /// Use this statement for every problem instead of the one in the package.
    pub force_statement: Option<PathBuf>,
    /// Language of the problem names and of the statements.
    pub statement_language: String,
    /// Name of the testset used for the problem-wide limits and for the flat BOCA dataset.
    pub default_testset: String,
    /// Directory of the BOCA templates. Defaults to `DATA_DIR/boca`.
    pub template_dir: Option<PathBuf>,
    /// Name of the validation script of the problems of a contest.
    pub validation_script: String,
    /// Kill the validation script after this amount of time. `None` waits for it to complete.
    pub validation_timeout: Option<Duration>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            time_multiplier: 1.0,
            repetitions: 1,
            source_size_kib: 512,
            output_dir: None,
            force_statement: None,
            statement_language: "portuguese".into(),
            default_testset: "tests".into(),
            template_dir: None,
            validation_script: "doall.sh".into(),
            validation_timeout: None,
        }
    }
}

impl ConversionConfig {
    /// The directory with the BOCA templates to use.
    pub fn template_dir(&self) -> PathBuf {
        match &self.template_dir {
            Some(dir) => dir.clone(),
            None => DATA_DIR.join("boca"),
        }
    }
}

/// Copy a file referenced by the package of `problem`, creating the parent directories of the
/// destination.
pub(crate) fn copy_file(problem: &str, from: &Path, to: &Path) -> Result<(), Error> {
    if !from.is_file() {
        return Err(ConversionError::PathResolution {
            problem: problem.into(),
            path: from.into(),
        }
        .into());
    }
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// The name of a test file inside a package: the ordinal zero-padded to width 3.
pub(crate) fn zeropad(ordinal: u32) -> String {
    format!("{:03}", ordinal)
}
