//! Zip archive primitives used for reading the source packages and writing the judge packages.
//!
//! The source packages are read either by listing/reading single entries (without extracting the
//! whole archive) or by extracting them inside a directory. The judge packages are produced by
//! zipping a fully staged directory tree: the archive is first written to a temporary file next to
//! the destination and then renamed into place, so a failure never leaves a partial archive at the
//! final path.
//!
//! # Example
//!
//! ```
//! use polyconv_archive::{list_entries, write_dir};
//!
//! # use anyhow::Error;
//! # use tempfile::TempDir;
//! # fn main() -> Result<(), Error> {
//! # let tmp = TempDir::new().unwrap();
//! # let staging = tmp.path().join("staging");
//! # std::fs::create_dir_all(staging.join("input"))?;
//! std::fs::write(staging.join("input/001"), "1 2\n")?;
//! let archive = tmp.path().join("package.zip");
//! write_dir(&staging, &archive)?;
//! assert_eq!(list_entries(&archive)?, vec!["input/", "input/001"]);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

#[macro_use]
extern crate log;

use std::fs::File;
use std::io::{BufReader, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use anyhow::{bail, Context, Error};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Permissions of the final archive file.
const ARCHIVE_MODE: u32 = 0o644;

/// Open a zip archive for reading.
fn open_archive(archive: &Path) -> Result<ZipArchive<BufReader<File>>, Error> {
    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive {}", archive.display()))?;
    ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{} is not a valid zip archive", archive.display()))
}

/// Whether the file at the provided path looks like a zip archive.
pub fn is_archive<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    path.is_file() && open_archive(path).is_ok()
}

/// List the names of all the entries of the archive, in the order they are stored.
pub fn list_entries<P: AsRef<Path>>(archive: P) -> Result<Vec<String>, Error> {
    let archive = archive.as_ref();
    let zip = open_archive(archive)?;
    Ok(zip.file_names().map(String::from).collect())
}

/// Read the content of a single entry of the archive. Returns `None` if the entry is not present.
pub fn read_entry<P: AsRef<Path>>(archive: P, name: &str) -> Result<Option<Vec<u8>>, Error> {
    let archive = archive.as_ref();
    let mut zip = open_archive(archive)?;
    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to read {} from {}", name, archive.display())
            })
        }
    };
    let mut content = Vec::new();
    entry
        .read_to_end(&mut content)
        .with_context(|| format!("Failed to read {} from {}", name, archive.display()))?;
    Ok(Some(content))
}

/// Extract the whole archive inside `dest`, creating it if needed. The unix permissions stored in
/// the archive are restored.
pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(archive: P, dest: Q) -> Result<(), Error> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();
    debug!("Extracting {} into {}", archive.display(), dest.display());
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory {}", dest.display()))?;
    let mut zip = open_archive(archive)?;
    zip.extract(dest).with_context(|| {
        format!(
            "Failed to extract {} into {}",
            archive.display(),
            dest.display()
        )
    })?;
    Ok(())
}

/// Zip the directory tree rooted at `source_dir` into `archive`.
///
/// The entries are named with their path relative to `source_dir` and their unix permission bits
/// are preserved. The entries are sorted by name so the same tree always produces the same list of
/// entries. If `archive` already exists it is replaced atomically.
pub fn write_dir<P: AsRef<Path>, Q: AsRef<Path>>(source_dir: P, archive: Q) -> Result<(), Error> {
    let source_dir = source_dir.as_ref();
    let archive = archive.as_ref();
    if !source_dir.is_dir() {
        bail!("{} is not a directory", source_dir.display());
    }
    let parent = match archive.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create a temporary file in {}", parent.display()))?;
    debug!(
        "Writing {} to temporary archive {}",
        source_dir.display(),
        tmp.path().display()
    );

    let mut zip = ZipWriter::new(tmp.as_file());
    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", source_dir.display()))?;
        let path = entry.path();
        let name = entry_name(source_dir, path)?;
        let mode = entry
            .metadata()
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .permissions()
            .mode()
            & 0o777;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(mode);
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)
                .with_context(|| format!("Failed to add directory {} to the archive", name))?;
        } else {
            trace!("Adding {} (mode {:o})", name, mode);
            zip.start_file(name.clone(), options)
                .with_context(|| format!("Failed to add {} to the archive", name))?;
            let mut file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            std::io::copy(&mut file, &mut zip)
                .with_context(|| format!("Failed to write {} into the archive", name))?;
        }
    }
    zip.finish().context("Failed to finalize the archive")?;

    tmp.as_file()
        .set_permissions(std::fs::Permissions::from_mode(ARCHIVE_MODE))
        .context("Failed to set the permissions of the archive")?;
    tmp.persist(archive)
        .with_context(|| format!("Failed to move the archive to {}", archive.display()))?;
    Ok(())
}

/// The name of an entry inside the archive: the path relative to the root, `/`-separated.
fn entry_name(root: &Path, path: &Path) -> Result<String, Error> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is not inside {}", path.display(), root.display()))?;
    let mut components = vec![];
    for component in relative.components() {
        match component.as_os_str().to_str() {
            Some(name) => components.push(name),
            None => bail!("Non UTF-8 path: {}", path.display()),
        }
    }
    Ok(components.join("/"))
}
