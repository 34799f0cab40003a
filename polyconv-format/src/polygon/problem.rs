use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use itertools::Itertools;
use roxmltree::{Document, Node};

use crate::polygon::{child, descendant, lenient_int, resolve_path, TestCase, Testset, PROBLEM_XML};
use crate::ConversionError;

/// MIME type of the PDF statements.
const PDF_STATEMENT_TYPE: &str = "application/pdf";
/// Basename of the testlib header among the files of the package.
const TESTLIB_HEADER: &str = "testlib.h";

/// The source file of the checker of a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerSource {
    /// Path of the source file.
    pub path: PathBuf,
    /// Polygon language identifier of the source, like `cpp.g++17`.
    pub language: String,
}

/// The content of the `problem.xml` of a Polygon problem package.
#[derive(Debug, Clone)]
pub struct ProblemDescriptor {
    /// Root directory of the package.
    pub path: PathBuf,
    /// Short name of the problem.
    pub short_name: String,
    /// Revision of the package, it increases every time the problem changes.
    pub revision: u32,
    /// Speed rating of the judging machine used for setting the time limits.
    pub cpu_speed: u64,
    /// All the testsets of the `<judging>` section, in document order.
    pub testsets: Vec<Testset>,
    /// All the source files and resources of the package, without duplicates.
    pub files: Vec<PathBuf>,
    /// `(language, name)` of the localized names of the problem.
    names: Vec<(String, String)>,
    /// `(language, path)` of the PDF statements.
    pdf_statements: Vec<(String, PathBuf)>,
    /// The testset used for the problem-wide values.
    default_testset: Testset,
    /// The checker, if declared.
    checker: Option<CheckerSource>,
}

/// Build a `MalformedDescriptor` error.
fn malformed<S: Into<String>>(descriptor: &Path, reason: S) -> Error {
    ConversionError::MalformedDescriptor {
        path: descriptor.into(),
        reason: reason.into(),
    }
    .into()
}

/// Parse the XML and check that the root element is `<problem>`.
fn parse_document<'input>(xml: &'input str, descriptor: &Path) -> Result<Document<'input>, Error> {
    let doc = Document::parse(xml).map_err(|e| malformed(descriptor, e.to_string()))?;
    if !doc.root_element().has_tag_name("problem") {
        return Err(malformed(descriptor, "the root element is not <problem>"));
    }
    Ok(doc)
}

/// Parse the `revision` attribute of `<problem>`.
fn parse_revision(problem: Node, descriptor: &Path) -> Result<u32, Error> {
    let revision = lenient_int(problem.attribute("revision").unwrap_or(""));
    u32::try_from(revision).map_err(|_| malformed(descriptor, "the revision is out of range"))
}

impl ProblemDescriptor {
    /// Parse the `problem.xml` inside the package rooted at `root`. `default_testset` is the name
    /// of the testset used for the problem-wide limits and tests.
    pub fn from_dir<P: AsRef<Path>>(root: P, default_testset: &str) -> Result<Self, Error> {
        let root = root.as_ref();
        let descriptor = root.join(PROBLEM_XML);
        let xml = std::fs::read_to_string(&descriptor)
            .with_context(|| format!("Failed to read {}", descriptor.display()))?;
        ProblemDescriptor::parse(&xml, root, default_testset)
    }

    /// Parse the content of a `problem.xml`, resolving all the paths against `root`.
    pub fn parse(xml: &str, root: &Path, default_testset: &str) -> Result<Self, Error> {
        let descriptor = root.join(PROBLEM_XML);
        let doc = parse_document(xml, &descriptor)?;
        let problem = doc.root_element();

        let short_name = problem
            .attribute("short-name")
            .ok_or_else(|| malformed(&descriptor, "missing short-name attribute of <problem>"))?
            .to_string();
        let revision = parse_revision(problem, &descriptor)?;

        let judging = descendant(problem, "judging")
            .ok_or_else(|| malformed(&descriptor, "missing <judging> section"))?;
        let cpu_speed = lenient_int(judging.attribute("cpu-speed").unwrap_or(""));
        let testsets = judging
            .descendants()
            .filter(|n| n.has_tag_name("testset"))
            .map(|n| Testset::from_node(n, root))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| malformed(&descriptor, format!("{:#}", e)))?;
        let default = testsets
            .iter()
            .find(|t| t.full_name == default_testset)
            .cloned()
            .unwrap_or_else(|| {
                warn!(
                    "Problem {} does not have a testset named {}",
                    short_name, default_testset
                );
                Testset::missing(default_testset, root)
            });

        let names = child(problem, "names")
            .into_iter()
            .flat_map(|names| names.children())
            .filter(|n| n.has_tag_name("name"))
            .filter_map(|n| Some((n.attribute("language")?, n.attribute("value")?)))
            .map(|(lang, value)| (lang.to_string(), value.to_string()))
            .collect();

        let pdf_statements = problem
            .descendants()
            .filter(|n| n.has_tag_name("statements"))
            .flat_map(|statements| statements.children())
            .filter(|n| n.has_tag_name("statement"))
            .filter(|n| n.attribute("type") == Some(PDF_STATEMENT_TYPE))
            .filter_map(|n| Some((n.attribute("language")?, n.attribute("path")?)))
            .filter(|(_, path)| !path.is_empty())
            .map(|(lang, path)| (lang.to_string(), resolve_path(root, path)))
            .collect();

        let files = problem
            .descendants()
            .filter(|n| n.has_tag_name("source") || n.has_tag_name("file"))
            .filter_map(|n| n.attribute("path"))
            .map(|path| resolve_path(root, path))
            .unique()
            .collect();

        let checker = match problem
            .descendants()
            .filter(|n| n.has_tag_name("assets"))
            .flat_map(|assets| assets.children())
            .filter(|n| n.has_tag_name("checker"))
            .find_map(|checker| child(checker, "source"))
        {
            Some(source) => {
                let path = source
                    .attribute("path")
                    .ok_or_else(|| malformed(&descriptor, "the checker source has no path"))?;
                Some(CheckerSource {
                    path: resolve_path(root, path),
                    language: source.attribute("type").unwrap_or("").to_string(),
                })
            }
            None => None,
        };

        Ok(ProblemDescriptor {
            path: root.into(),
            short_name,
            revision,
            cpu_speed,
            testsets,
            files,
            names,
            pdf_statements,
            default_testset: default,
            checker,
        })
    }

    /// Read only the revision from the content of a `problem.xml`.
    pub fn read_revision(xml: &str, descriptor: &Path) -> Result<u32, Error> {
        let doc = parse_document(xml, descriptor)?;
        parse_revision(doc.root_element(), descriptor)
    }

    /// The name of the problem in the provided language, empty if not available.
    pub fn name(&self, language: &str) -> &str {
        self.names
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, name)| name.as_str())
            .unwrap_or("")
    }

    /// The path of the PDF statement in the provided language, if any.
    pub fn pdf_statement(&self, language: &str) -> Option<&Path> {
        self.pdf_statements
            .iter()
            .find(|(lang, _)| lang == language)
            .map(|(_, path)| path.as_path())
    }

    /// The testset used for the problem-wide limits and tests.
    pub fn default_testset(&self) -> &Testset {
        &self.default_testset
    }

    /// The time limit of the problem, in milliseconds.
    pub fn time_limit(&self) -> u64 {
        self.default_testset.time_limit
    }

    /// The memory limit of the problem, in MiB.
    pub fn memory_limit(&self) -> u64 {
        self.default_testset.memory_limit
    }

    /// The number of tests of the problem.
    pub fn test_count(&self) -> u32 {
        self.default_testset.test_count
    }

    /// The tests of the default testset.
    pub fn tests(&self) -> impl Iterator<Item = TestCase> + '_ {
        self.default_testset.tests()
    }

    /// The source of the checker of the problem.
    pub fn checker(&self) -> Result<&CheckerSource, Error> {
        self.checker.as_ref().ok_or_else(|| {
            ConversionError::MissingChecker {
                problem: self.short_name.clone(),
            }
            .into()
        })
    }

    /// The `testlib.h` header among the files of the problem.
    pub fn testlib(&self) -> Result<&Path, Error> {
        self.files
            .iter()
            .find(|path| path.file_name().map_or(false, |name| name == TESTLIB_HEADER))
            .map(PathBuf::as_path)
            .ok_or_else(|| {
                ConversionError::MissingTestlib {
                    problem: self.short_name.clone(),
                }
                .into()
            })
    }
}
