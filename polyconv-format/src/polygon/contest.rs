use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use roxmltree::Document;

use crate::polygon::CONTEST_XML;
use crate::ConversionError;

/// Directory of the contest package containing the problem packages.
const PROBLEMS_DIR: &str = "problems";

/// A problem of a contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestProblem {
    /// The index of the problem inside the contest, upper-cased (`A`, `B`, ...).
    pub index: String,
    /// The short name of the problem, the last segment of its url.
    pub short_name: String,
    /// The directory of the problem package, inside the contest package.
    pub path: PathBuf,
}

/// The content of the `contest.xml` of a Polygon contest package.
#[derive(Debug, Clone)]
pub struct ContestDescriptor {
    /// The problems in document order.
    pub problems: Vec<ContestProblem>,
}

impl ContestDescriptor {
    /// Parse the `contest.xml` inside the contest package rooted at `root`.
    pub fn from_dir<P: AsRef<Path>>(root: P) -> Result<Self, Error> {
        let root = root.as_ref();
        let descriptor = root.join(CONTEST_XML);
        let xml = std::fs::read_to_string(&descriptor)
            .with_context(|| format!("Failed to read {}", descriptor.display()))?;
        ContestDescriptor::parse(&xml, root)
    }

    /// Parse the content of a `contest.xml`. The problem packages are looked up inside
    /// `root/problems`.
    pub fn parse(xml: &str, root: &Path) -> Result<Self, Error> {
        let descriptor = root.join(CONTEST_XML);
        let malformed = |reason: String| -> Error {
            ConversionError::MalformedDescriptor {
                path: descriptor.clone(),
                reason,
            }
            .into()
        };
        let doc = Document::parse(xml).map_err(|e| malformed(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut problems = vec![];
        for node in doc
            .descendants()
            .filter(|n| n.has_tag_name("problems"))
            .flat_map(|problems| problems.children())
            .filter(|n| n.has_tag_name("problem"))
        {
            let index = node
                .attribute("index")
                .ok_or_else(|| malformed("a problem has no index".into()))?
                .to_uppercase();
            let url = node
                .attribute("url")
                .ok_or_else(|| malformed(format!("problem {} has no url", index)))?;
            let short_name = url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            if short_name.is_empty() {
                return Err(malformed(format!("problem {} has an invalid url", index)));
            }
            if !seen.insert(index.clone()) {
                return Err(malformed(format!("index {} is used more than once", index)));
            }
            problems.push(ContestProblem {
                path: root.join(PROBLEMS_DIR).join(&short_name),
                index,
                short_name,
            });
        }
        Ok(ContestDescriptor { problems })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use speculoos::prelude::*;

    use super::*;

    const CONTEST: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="no"?>
<contest url="https://polygon.codeforces.com/c/1234/training">
    <names>
        <name language="portuguese" main="true" value="Treino"/>
    </names>
    <problems>
        <problem index="a" url="https://polygon.codeforces.com/p/judge/soma"/>
        <problem index="B" url="https://polygon.codeforces.com/p/judge/grafos/"/>
    </problems>
</contest>
"#;

    #[test]
    fn test_parse_problems() {
        let contest = ContestDescriptor::parse(CONTEST, Path::new("/tmp/contest")).unwrap();
        assert_eq!(
            contest.problems,
            vec![
                ContestProblem {
                    index: "A".into(),
                    short_name: "soma".into(),
                    path: "/tmp/contest/problems/soma".into(),
                },
                ContestProblem {
                    index: "B".into(),
                    short_name: "grafos".into(),
                    path: "/tmp/contest/problems/grafos".into(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_empty() {
        let contest = ContestDescriptor::parse("<contest/>", Path::new("/c")).unwrap();
        assert_that!(contest.problems).is_empty();
    }

    #[test]
    fn test_malformed() {
        for xml in [
            r#"<contest><problems><problem url="x/y"/></problems></contest>"#,
            r#"<contest><problems><problem index="A"/></problems></contest>"#,
            r#"<contest><problems><problem index="A" url="p/x"/><problem index="a" url="p/y"/></problems></contest>"#,
            "<contest",
        ] {
            let err = ContestDescriptor::parse(xml, Path::new("/c")).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<ConversionError>(),
                    Some(ConversionError::MalformedDescriptor { .. })
                ),
                "{} should be malformed",
                xml
            );
        }
    }
}
