//! Jude problem packages.
//!
//! A Jude package contains a `jude.yml` manifest with the limits and the weighted datasets, the
//! checker at `checker.cpp`, the tests of each dataset in `tests/<dataset>/NNN.in|.out` and
//! optionally the statement at `statement.pdf`.

use std::path::Path;

use anyhow::{Context, Error};
use tempfile::TempDir;

pub use manifest::{JudeDataset, JudeLimits, JudeManifest};

use crate::polygon::{resolve_testsets, ProblemDescriptor};
use crate::{copy_file, zeropad, ConversionConfig, ConversionError};

mod manifest;

/// Path of the manifest inside the package.
pub const MANIFEST_PATH: &str = "jude.yml";
/// Path of the checker inside the package.
pub const CHECKER_PATH: &str = "checker.cpp";
/// Path of the statement inside the package.
pub const STATEMENT_PATH: &str = "statement.pdf";
/// Directory of the datasets inside the package.
pub const TESTS_DIR: &str = "tests";

/// Builder of the Jude packages.
#[derive(Debug)]
pub struct JudeAssembler<'a> {
    config: &'a ConversionConfig,
}

impl<'a> JudeAssembler<'a> {
    /// Make a new assembler with the provided configuration.
    pub fn new(config: &'a ConversionConfig) -> JudeAssembler<'a> {
        JudeAssembler { config }
    }

    /// Build the package of the problem and write it at `output`.
    pub fn assemble(&self, problem: &ProblemDescriptor, output: &Path) -> Result<(), Error> {
        let checker = problem.checker()?;
        let testsets = resolve_testsets(&problem.testsets)?;
        let mut manifest = JudeManifest::new(problem, &testsets, self.config);

        let staging = TempDir::new().context("Failed to create temporary directory")?;
        debug!("Temporary Jude directory: {}", staging.path().display());

        info!("Copying checker {}", checker.path.display());
        copy_file(
            &problem.short_name,
            &checker.path,
            &staging.path().join(CHECKER_PATH),
        )?;

        for testset in &testsets.testsets {
            let name = testset.name();
            info!(
                "Copying testcases of dataset {:?} of weight {}",
                name,
                testset.weight()
            );
            let dir = staging.path().join(TESTS_DIR).join(&name);
            for test in testset.tests() {
                let ordinal = zeropad(test.ordinal);
                copy_file(
                    &problem.short_name,
                    &test.input,
                    &dir.join(format!("{}.in", ordinal)),
                )?;
                copy_file(
                    &problem.short_name,
                    &test.answer,
                    &dir.join(format!("{}.out", ordinal)),
                )?;
            }
        }

        let statement = match &self.config.force_statement {
            Some(forced) => Some(forced.as_path()),
            None => problem.pdf_statement(&self.config.statement_language),
        };
        match statement {
            Some(statement) => {
                info!("Copying statement {}", statement.display());
                copy_file(
                    &problem.short_name,
                    statement,
                    &staging.path().join(STATEMENT_PATH),
                )?;
                manifest.statement = Some(STATEMENT_PATH.into());
            }
            None => warn!("Problem {} has no statement", problem.short_name),
        }

        let manifest_path = staging.path().join(MANIFEST_PATH);
        std::fs::write(&manifest_path, manifest.to_yaml()?)
            .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

        info!("Creating zip {}", output.display());
        polyconv_archive::write_dir(staging.path(), output).map_err(|e| {
            ConversionError::ArchiveIo {
                path: output.into(),
                reason: format!("{:#}", e),
            }
        })?;
        Ok(())
    }
}
