//! BOCA problem packages.
//!
//! A BOCA package has a single flat dataset (`input/NNN` and `output/NNN`), the sources and
//! resources of the problem in `files/`, the statement and `problem.info` in `description/` and a
//! set of shell scripts that BOCA runs for compiling, running and checking the submissions. The
//! scripts are produced from a template tree, see [`render_tree`].

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use tempfile::TempDir;
use walkdir::WalkDir;

pub use template::{render_tree, transliterate, BocaTemplateVars, TEMPLATE_SUFFIX};

use crate::polygon::ProblemDescriptor;
use crate::{copy_file, zeropad, ConversionConfig, ConversionError};

mod template;

/// The directories of the package with the scripts run by BOCA.
const SCRIPT_DIRS: &[&str] = &["compile", "run", "compare", "limits", "tests"];
/// Permissions of the scripts run by BOCA.
const SCRIPT_MODE: u32 = 0o744;
/// Value of `statement_path` when there is no statement.
const NO_STATEMENT: &str = "no";

/// Options of the conversion of a single problem.
#[derive(Debug, Clone, Copy, Default)]
pub struct BocaOptions<'a> {
    /// Use this short name instead of the one of the problem.
    pub short_name: Option<&'a str>,
    /// The index of the problem inside the contest, if converting a contest.
    pub index: Option<&'a str>,
}

/// The statement of the problem and where it is stored in the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BocaStatement {
    /// The statement file to copy.
    pub source: PathBuf,
    /// The path of the statement relative to the package, inside `description/`.
    pub destination: PathBuf,
}

/// Builder of the BOCA packages.
#[derive(Debug)]
pub struct BocaAssembler<'a> {
    config: &'a ConversionConfig,
}

/// Read a file referenced by a problem, byte by byte.
fn read_problem_file(problem: &str, path: &Path) -> Result<Vec<u8>, Error> {
    if !path.is_file() {
        return Err(ConversionError::PathResolution {
            problem: problem.into(),
            path: path.into(),
        }
        .into());
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Set the permissions of all the scripts of the package.
fn mark_scripts(staging: &Path) -> Result<(), Error> {
    for dir in SCRIPT_DIRS.iter().map(|dir| staging.join(dir)) {
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
            if entry.file_type().is_file() {
                std::fs::set_permissions(
                    entry.path(),
                    std::fs::Permissions::from_mode(SCRIPT_MODE),
                )
                .with_context(|| {
                    format!("Failed to set permissions of {}", entry.path().display())
                })?;
            }
        }
    }
    Ok(())
}

impl<'a> BocaAssembler<'a> {
    /// Make a new assembler with the provided configuration.
    pub fn new(config: &'a ConversionConfig) -> BocaAssembler<'a> {
        BocaAssembler { config }
    }

    /// The short name used in the package.
    fn short_name<'b>(&self, problem: &'b ProblemDescriptor, options: &BocaOptions<'b>) -> &'b str {
        options.short_name.unwrap_or(&problem.short_name)
    }

    /// Where the statement comes from and where it goes. The forced statement of the configuration
    /// wins over the one of the problem.
    pub fn statement(
        &self,
        problem: &ProblemDescriptor,
        options: &BocaOptions,
    ) -> Option<BocaStatement> {
        let source = match &self.config.force_statement {
            Some(forced) => forced.clone(),
            None => problem
                .pdf_statement(&self.config.statement_language)?
                .to_owned(),
        };
        let stem = options
            .index
            .unwrap_or_else(|| self.short_name(problem, options));
        let name = match source.extension() {
            Some(ext) => format!("{}.{}", stem, ext.to_string_lossy()),
            None => stem.to_string(),
        };
        Some(BocaStatement {
            source,
            destination: Path::new("description").join(name),
        })
    }

    /// The variables for the templates of the package.
    pub fn template_vars(
        &self,
        problem: &ProblemDescriptor,
        options: &BocaOptions,
    ) -> Result<BocaTemplateVars, Error> {
        let checker = problem.checker()?;
        let testlib = problem.testlib()?;
        let statement_path = match self.statement(problem, options) {
            Some(statement) => statement
                .destination
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| NO_STATEMENT.into()),
            None => NO_STATEMENT.into(),
        };
        Ok(BocaTemplateVars {
            multiplier: self.config.time_multiplier,
            reps: self.config.repetitions,
            source_size: self.config.source_size_kib,
            clock: problem.cpu_speed,
            time_limit: problem.time_limit(),
            time_limit_seconds: template::time_limit_seconds(
                problem.time_limit(),
                self.config.time_multiplier,
            ),
            memory_limit: problem.memory_limit(),
            short_name: self.short_name(problem, options).to_string(),
            full_name: transliterate(problem.name(&self.config.statement_language)),
            statement_path,
            checker_path: checker
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            checker_lang: checker.language.clone(),
            checker_content: read_problem_file(&problem.short_name, &checker.path)?,
            testlib_content: read_problem_file(&problem.short_name, testlib)?,
        })
    }

    /// Build the package of the problem and write it at `output`.
    pub fn assemble(
        &self,
        problem: &ProblemDescriptor,
        options: &BocaOptions,
        output: &Path,
    ) -> Result<(), Error> {
        let vars = self.template_vars(problem, options)?;
        let staging = TempDir::new().context("Failed to create temporary directory")?;
        debug!("Temporary BOCA directory: {}", staging.path().display());

        info!("Copying and generating templates");
        render_tree(&self.config.template_dir(), staging.path(), &vars)?;
        mark_scripts(staging.path())?;

        info!("Copying files (sources and resources)");
        for file in &problem.files {
            let name = file.file_name().unwrap_or_default();
            debug!("Copying file {}", file.display());
            copy_file(
                &problem.short_name,
                file,
                &staging.path().join("files").join(name),
            )?;
        }

        info!("Copying {} testcases", problem.test_count());
        for test in problem.tests() {
            let name = zeropad(test.ordinal);
            copy_file(
                &problem.short_name,
                &test.input,
                &staging.path().join("input").join(&name),
            )?;
            copy_file(
                &problem.short_name,
                &test.answer,
                &staging.path().join("output").join(&name),
            )?;
        }

        match self.statement(problem, options) {
            Some(statement) => {
                info!("Copying statement {}", statement.source.display());
                copy_file(
                    &problem.short_name,
                    &statement.source,
                    &staging.path().join(&statement.destination),
                )?;
            }
            None => warn!("Problem {} has no statement", problem.short_name),
        }

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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PROBLEM: &str = r#"<problem revision="3" short-name="soma">
    <names><name language="portuguese" value="Soma Fácil"/></names>
    <statements>
        <statement language="portuguese" path="statements/.pdf/portuguese/problem.pdf" type="application/pdf"/>
    </statements>
    <judging cpu-speed="3600">
        <testset name="tests">
            <time-limit>1500</time-limit>
            <memory-limit>67108864</memory-limit>
            <test-count>2</test-count>
            <input-path-pattern>tests/%02d</input-path-pattern>
            <answer-path-pattern>tests/%02d.a</answer-path-pattern>
        </testset>
    </judging>
    <files><resources><file path="files/testlib.h"/></resources></files>
    <assets><checker><source path="files/check.cpp" type="cpp.g++17"/></checker></assets>
</problem>"#;

    fn problem() -> ProblemDescriptor {
        ProblemDescriptor::parse(PROBLEM, Path::new("/pkg"), "tests").unwrap()
    }

    #[test]
    fn test_statement_of_problem() {
        let config = ConversionConfig::default();
        let assembler = BocaAssembler::new(&config);
        let problem = problem();
        let statement = assembler
            .statement(&problem, &BocaOptions::default())
            .unwrap();
        assert_eq!(
            statement.source,
            PathBuf::from("/pkg/statements/.pdf/portuguese/problem.pdf")
        );
        assert_eq!(statement.destination, PathBuf::from("description/soma.pdf"));
    }

    #[test]
    fn test_statement_with_index_and_short_name() {
        let config = ConversionConfig::default();
        let assembler = BocaAssembler::new(&config);
        let problem = problem();
        let options = BocaOptions {
            short_name: Some("easy"),
            index: None,
        };
        assert_eq!(
            assembler.statement(&problem, &options).unwrap().destination,
            PathBuf::from("description/easy.pdf")
        );
        let options = BocaOptions {
            short_name: Some("easy"),
            index: Some("B"),
        };
        assert_eq!(
            assembler.statement(&problem, &options).unwrap().destination,
            PathBuf::from("description/B.pdf")
        );
    }

    #[test]
    fn test_forced_statement() {
        let config = ConversionConfig {
            force_statement: Some("/tmp/all.html".into()),
            ..Default::default()
        };
        let assembler = BocaAssembler::new(&config);
        let statement = assembler
            .statement(&problem(), &BocaOptions::default())
            .unwrap();
        assert_eq!(statement.source, PathBuf::from("/tmp/all.html"));
        assert_eq!(statement.destination, PathBuf::from("description/soma.html"));
    }

    #[test]
    fn test_no_statement() {
        let config = ConversionConfig {
            statement_language: "english".into(),
            ..Default::default()
        };
        let assembler = BocaAssembler::new(&config);
        assert_eq!(
            assembler.statement(&problem(), &BocaOptions::default()),
            None
        );
    }

    #[test]
    fn test_template_vars_missing_files() {
        let config = ConversionConfig::default();
        let assembler = BocaAssembler::new(&config);
        let err = assembler
            .template_vars(&problem(), &BocaOptions::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConversionError>(),
            Some(ConversionError::PathResolution { .. })
        ));
    }
}
