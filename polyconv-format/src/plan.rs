use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Error;

use crate::read_revision;

/// The supported judge packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    /// A BOCA problem package.
    Boca,
    /// A Jude problem package.
    Jude,
}

impl TargetFormat {
    /// The suffix of the name of the packages of this format.
    pub fn suffix(&self) -> &'static str {
        match self {
            TargetFormat::Boca => "boca",
            TargetFormat::Jude => "jude",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for TargetFormat {
    type Err = std::convert::Infallible;

    /// Anything different from `jude` is a BOCA package.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jude" => Ok(TargetFormat::Jude),
            "boca" => Ok(TargetFormat::Boca),
            other => {
                warn!("Unknown target format {:?}, defaulting to boca", other);
                Ok(TargetFormat::Boca)
            }
        }
    }
}

/// The path of the package of the provided revision of `source`.
///
/// The name is `<INDEX>_<base>_<revision>_<format>.zip` where `<base>` is the file name of the
/// source package without its extension and the index is present only in contest mode. The
/// package is placed in `output_dir` or, if not set, next to the source package.
pub fn planned_output_name(
    source: &Path,
    format: TargetFormat,
    index: Option<&str>,
    output_dir: Option<&Path>,
    revision: u32,
) -> PathBuf {
    let base = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match index {
        Some(index) => format!("{}_{}_{}_{}.zip", index, base, revision, format.suffix()),
        None => format!("{}_{}_{}.zip", base, revision, format.suffix()),
    };
    let dir = match output_dir {
        Some(dir) => dir,
        None => source.parent().unwrap_or_else(|| Path::new("")),
    };
    dir.join(name)
}

/// The path of the package that converting `source` would produce. Only the revision is read from
/// the source package, which is not extracted.
pub fn plan_output_name(
    source: &Path,
    format: TargetFormat,
    index: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<PathBuf, Error> {
    let revision = read_revision(source)?;
    Ok(planned_output_name(
        source, format, index, output_dir, revision,
    ))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_target_format_from_str() {
        assert_eq!("jude".parse::<TargetFormat>().unwrap(), TargetFormat::Jude);
        assert_eq!("JUDE".parse::<TargetFormat>().unwrap(), TargetFormat::Jude);
        assert_eq!("boca".parse::<TargetFormat>().unwrap(), TargetFormat::Boca);
        assert_eq!("domjudge".parse::<TargetFormat>().unwrap(), TargetFormat::Boca);
        assert_eq!(TargetFormat::Jude.to_string(), "jude");
    }

    #[test]
    fn test_planned_next_to_source() {
        let path = planned_output_name(
            Path::new("/pkgs/soma-7$linux.zip"),
            TargetFormat::Boca,
            None,
            None,
            7,
        );
        assert_eq!(path, PathBuf::from("/pkgs/soma-7$linux_7_boca.zip"));
    }

    #[test]
    fn test_planned_with_index_and_dir() {
        let path = planned_output_name(
            Path::new("/contest/problems/myproblem"),
            TargetFormat::Boca,
            Some("A"),
            Some(Path::new("/out")),
            3,
        );
        assert_eq!(path, PathBuf::from("/out/A_myproblem_3_boca.zip"));
    }

    #[test]
    fn test_planned_relative() {
        let path = planned_output_name(Path::new("soma.zip"), TargetFormat::Jude, None, None, 1);
        assert_eq!(path, PathBuf::from("soma_1_jude.zip"));
    }

    #[test]
    fn test_plan_is_stable() {
        let tmpdir = TempDir::new().unwrap();
        let source = tmpdir.path().join("soma");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(
            source.join("problem.xml"),
            r#"<problem revision="5" short-name="soma"><judging/></problem>"#,
        )
        .unwrap();
        let first = plan_output_name(&source, TargetFormat::Jude, None, None).unwrap();
        let second = plan_output_name(&source, TargetFormat::Jude, None, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, tmpdir.path().join("soma_5_jude.zip"));
    }
}
