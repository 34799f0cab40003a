use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Error};
use tempfile::TempDir;

use crate::polygon::{ContestDescriptor, ProblemDescriptor, PROBLEM_XML};
use crate::{ConversionConfig, ConversionError};

/// Wrap an error of the archive primitives into an `ArchiveIo` error.
fn archive_error(path: &Path, error: Error) -> Error {
    ConversionError::ArchiveIo {
        path: path.into(),
        reason: format!("{:#}", error),
    }
    .into()
}

/// A source package ready to be read: either a directory or a zip archive extracted in a temporary
/// directory. The temporary directory is removed when the package is dropped.
#[derive(Debug)]
pub struct SourcePackage {
    /// The path of the package as provided.
    path: PathBuf,
    /// The directory with the content of the package.
    root: PathBuf,
    /// The directory where the archive is extracted, if the package is an archive.
    extracted: Option<TempDir>,
}

impl SourcePackage {
    /// Open the package at the provided path, extracting it if it is a zip archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SourcePackage, Error> {
        let path = path.as_ref();
        if path.is_dir() {
            return Ok(SourcePackage {
                path: path.into(),
                root: path.into(),
                extracted: None,
            });
        }
        if !path.is_file() {
            bail!("Source package {} does not exist", path.display());
        }
        if !polyconv_archive::is_archive(path) {
            return Err(ConversionError::ArchiveIo {
                path: path.into(),
                reason: "neither a directory nor a zip archive".into(),
            }
            .into());
        }
        let tmpdir = TempDir::new().context("Failed to create temporary directory")?;
        debug!(
            "Extracting {} into {}",
            path.display(),
            tmpdir.path().display()
        );
        polyconv_archive::extract(path, tmpdir.path()).map_err(|e| archive_error(path, e))?;
        Ok(SourcePackage {
            path: path.into(),
            root: tmpdir.path().into(),
            extracted: Some(tmpdir),
        })
    }

    /// The path of the package as provided to `open`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory with the content of the package.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the package was extracted from an archive.
    pub fn is_archive(&self) -> bool {
        self.extracted.is_some()
    }

    /// Parse the `problem.xml` of the package.
    pub fn problem(&self, config: &ConversionConfig) -> Result<ProblemDescriptor, Error> {
        ProblemDescriptor::from_dir(&self.root, &config.default_testset)
    }

    /// Parse the `contest.xml` of the package.
    pub fn contest(&self) -> Result<ContestDescriptor, Error> {
        ContestDescriptor::from_dir(&self.root)
    }
}

/// Read the revision of the problem package at the provided path, without extracting it.
pub fn read_revision<P: AsRef<Path>>(path: P) -> Result<u32, Error> {
    let path = path.as_ref();
    if path.is_dir() {
        let descriptor = path.join(PROBLEM_XML);
        let xml = std::fs::read_to_string(&descriptor)
            .with_context(|| format!("Failed to read {}", descriptor.display()))?;
        return ProblemDescriptor::read_revision(&xml, &descriptor);
    }
    let descriptor = path.join(PROBLEM_XML);
    let content = polyconv_archive::read_entry(path, PROBLEM_XML)
        .map_err(|e| archive_error(path, e))?
        .ok_or_else(|| ConversionError::MalformedDescriptor {
            path: descriptor.clone(),
            reason: format!("{} is not present in the archive", PROBLEM_XML),
        })?;
    let xml = String::from_utf8(content).map_err(|_| ConversionError::MalformedDescriptor {
        path: descriptor.clone(),
        reason: "not valid UTF-8".into(),
    })?;
    ProblemDescriptor::read_revision(&xml, &descriptor)
}
