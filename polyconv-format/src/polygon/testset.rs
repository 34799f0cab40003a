use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use itertools::Itertools;
use roxmltree::Node;

use crate::polygon::{child_text, lenient_int, resolve_path, PathPattern, PROBLEM_XML};
use crate::ConversionError;

/// A named group of tests inside the `<judging>` section of a problem.
#[derive(Debug, Clone, PartialEq)]
pub struct Testset {
    /// The raw name of the testset, like `tests` or `main_80`.
    pub full_name: String,
    /// The time limit of the tests, in milliseconds.
    pub time_limit: u64,
    /// The memory limit of the tests, in MiB.
    pub memory_limit: u64,
    /// The number of tests of this testset.
    pub test_count: u32,
    /// The pattern of the paths of the input files.
    pub input_pattern: PathPattern,
    /// The pattern of the paths of the answer files.
    pub answer_pattern: PathPattern,
    /// The root of the package, the patterns are relative to it.
    root: PathBuf,
}

/// A single test of a testset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Path of the input file.
    pub input: PathBuf,
    /// Path of the answer file.
    pub answer: PathBuf,
    /// The 1-based ordinal of the test inside its testset.
    pub ordinal: u32,
}

/// Split the name of a testset into its name and weight.
///
/// A name like `main_80` encodes the weight after the last underscore: the name is the rest of the
/// pieces joined together (`main`) and the weight is `80`. Names without a valid trailing integer
/// are kept untouched with a weight of 1.
pub fn split_name_weight(full_name: &str) -> (String, u64) {
    let mut pieces = full_name.split('_').collect_vec();
    while pieces.len() > 1 && pieces.last() == Some(&"") {
        pieces.pop();
    }
    if pieces.len() < 2 {
        return (full_name.to_string(), 1);
    }
    match pieces[pieces.len() - 1].parse::<u64>() {
        Ok(weight) => (pieces[..pieces.len() - 1].concat(), weight),
        Err(_) => (full_name.to_string(), 1),
    }
}

/// Parse one of the path patterns of a testset. The patterns of the testsets without tests are
/// never used, so they are not required to be valid.
fn parse_pattern(
    node: Node,
    tag: &str,
    full_name: &str,
    test_count: u32,
) -> Result<PathPattern, Error> {
    match PathPattern::parse(child_text(node, tag)) {
        Ok(pattern) => {
            if test_count > 1 && !pattern.has_slot() {
                warn!(
                    "The {} of testset {} has no number, all its tests use the same file",
                    tag, full_name
                );
            }
            Ok(pattern)
        }
        Err(e) if test_count == 0 => {
            warn!("Ignoring the {} of the empty testset {}: {:#}", tag, full_name, e);
            Ok(PathPattern::default())
        }
        Err(e) => Err(e.context(format!("Invalid {} of testset {}", tag, full_name))),
    }
}

impl Testset {
    /// Build a testset from its `<testset>` node.
    pub(crate) fn from_node(node: Node, root: &Path) -> Result<Testset, Error> {
        let full_name = node.attribute("name").unwrap_or("").to_string();
        let test_count = u32::try_from(lenient_int(child_text(node, "test-count")))
            .with_context(|| format!("Too many tests in testset {}", full_name))?;
        let input_pattern = parse_pattern(node, "input-path-pattern", &full_name, test_count)?;
        let answer_pattern = parse_pattern(node, "answer-path-pattern", &full_name, test_count)?;
        Ok(Testset {
            time_limit: lenient_int(child_text(node, "time-limit")),
            memory_limit: lenient_int(child_text(node, "memory-limit")) / 1024 / 1024,
            test_count,
            input_pattern,
            answer_pattern,
            full_name,
            root: root.into(),
        })
    }

    /// A testset that is not present in the descriptor: no tests and no limits.
    pub(crate) fn missing(full_name: &str, root: &Path) -> Testset {
        Testset {
            full_name: full_name.into(),
            time_limit: 0,
            memory_limit: 0,
            test_count: 0,
            input_pattern: PathPattern::default(),
            answer_pattern: PathPattern::default(),
            root: root.into(),
        }
    }

    /// The name of the testset, without the weight suffix.
    pub fn name(&self) -> String {
        split_name_weight(&self.full_name).0
    }

    /// The weight of the testset, encoded in the suffix of its name.
    pub fn weight(&self) -> u64 {
        split_name_weight(&self.full_name).1
    }

    /// Iterate over the tests of this testset, in order. The iterator can be recreated any number
    /// of times.
    pub fn tests(&self) -> impl Iterator<Item = TestCase> + '_ {
        (1..=self.test_count).map(move |ordinal| TestCase {
            input: resolve_path(&self.root, &self.input_pattern.format(ordinal)),
            answer: resolve_path(&self.root, &self.answer_pattern.format(ordinal)),
            ordinal,
        })
    }
}

/// The testsets with at least one test, in the order of the datasets of the judge packages.
#[derive(Debug, Clone)]
pub struct ActiveTestsets {
    /// The active testsets, sorted by name.
    pub testsets: Vec<Testset>,
    /// The sum of the weights of the active testsets. Never zero.
    pub total_weight: u64,
}

/// Select the testsets with at least one test, sorting them by name. The sort is stable, so
/// testsets with the same name keep the order of the descriptor.
pub fn resolve_testsets(testsets: &[Testset]) -> Result<ActiveTestsets, Error> {
    let testsets = testsets
        .iter()
        .filter(|t| t.test_count > 0)
        .cloned()
        .sorted_by_cached_key(|t| t.name())
        .collect_vec();
    let mut total_weight: u64 = 0;
    for testset in &testsets {
        total_weight = total_weight.checked_add(testset.weight()).ok_or_else(|| {
            ConversionError::MalformedDescriptor {
                path: testset.root.join(PROBLEM_XML),
                reason: format!("the total weight overflows at testset {}", testset.full_name),
            }
        })?;
    }
    Ok(ActiveTestsets {
        testsets,
        total_weight: total_weight.max(1),
    })
}

impl ActiveTestsets {
    /// The fraction of the score assigned to a testset.
    pub fn percentage(&self, testset: &Testset) -> f64 {
        testset.weight() as f64 / self.total_weight as f64
    }

    /// Iterate over the active testsets with their percentage.
    pub fn iter(&self) -> impl Iterator<Item = (&Testset, f64)> {
        self.testsets.iter().map(move |t| (t, self.percentage(t)))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use speculoos::prelude::*;

    use super::*;

    fn testset(name: &str, count: u32) -> Testset {
        Testset {
            full_name: name.into(),
            time_limit: 1000,
            memory_limit: 256,
            test_count: count,
            input_pattern: PathPattern::parse("tests/%02d").unwrap(),
            answer_pattern: PathPattern::parse("tests/%02d.a").unwrap(),
            root: "/pkg".into(),
        }
    }

    #[test]
    fn test_split_weighted() {
        assert_eq!(split_name_weight("pretests_10"), ("pretests".to_string(), 10));
        assert_eq!(split_name_weight("main_90"), ("main".to_string(), 90));
        assert_eq!(split_name_weight("group_a_5"), ("groupa".to_string(), 5));
    }

    #[test]
    fn test_split_unweighted() {
        assert_eq!(split_name_weight("tests"), ("tests".to_string(), 1));
        assert_eq!(split_name_weight("main_tests"), ("main_tests".to_string(), 1));
        assert_eq!(split_name_weight("tests_"), ("tests_".to_string(), 1));
        assert_eq!(split_name_weight("sub_-3"), ("sub_-3".to_string(), 1));
        assert_eq!(split_name_weight(""), ("".to_string(), 1));
    }

    #[test]
    fn test_split_trailing_underscores() {
        assert_eq!(split_name_weight("main_5_"), ("main".to_string(), 5));
    }

    #[test]
    fn test_tests_enumeration() {
        let set = testset("tests", 3);
        let tests = set.tests().collect_vec();
        assert_that!(tests).has_length(3);
        assert_eq!(
            tests[0],
            TestCase {
                input: "/pkg/tests/01".into(),
                answer: "/pkg/tests/01.a".into(),
                ordinal: 1
            }
        );
        assert_eq!(tests[2].ordinal, 3);
        // restartable
        assert_eq!(set.tests().collect_vec(), tests);
    }

    #[test]
    fn test_resolve_filters_and_sorts() {
        let sets = vec![
            testset("zeta_1", 2),
            testset("empty_50", 0),
            testset("alpha_3", 1),
        ];
        let active = resolve_testsets(&sets).unwrap();
        let names = active.testsets.iter().map(|t| t.name()).collect_vec();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(active.total_weight, 4);
    }

    #[test]
    fn test_resolve_percentages() {
        let sets = vec![testset("pretests_20", 5), testset("main_80", 5)];
        let active = resolve_testsets(&sets).unwrap();
        let percentages = active.iter().map(|(t, p)| (t.name(), p)).collect_vec();
        assert_eq!(percentages[0].0, "main");
        assert_abs_diff_eq!(percentages[0].1, 0.8);
        assert_eq!(percentages[1].0, "pretests");
        assert_abs_diff_eq!(percentages[1].1, 0.2);
        let sum: f64 = percentages.iter().map(|(_, p)| p).sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_resolve_no_active() {
        let active = resolve_testsets(&[testset("tests", 0)]).unwrap();
        assert_that!(active.testsets).is_empty();
        assert_eq!(active.total_weight, 1);
    }

    #[test]
    fn test_resolve_zero_weights() {
        let active = resolve_testsets(&[testset("samples_0", 2)]).unwrap();
        assert_eq!(active.total_weight, 1);
        assert_abs_diff_eq!(active.percentage(&active.testsets[0]), 0.0);
    }

    #[test]
    fn test_resolve_weight_overflow() {
        let sets = vec![testset("a_18446744073709551615", 1), testset("b_1", 1)];
        let err = resolve_testsets(&sets).unwrap_err();
        match err.downcast_ref::<ConversionError>() {
            Some(ConversionError::MalformedDescriptor { path, reason }) => {
                assert_eq!(path, Path::new("/pkg/problem.xml"));
                assert_that!(reason.as_str()).contains("b_1");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_resolve_largest_weight() {
        let sets = vec![testset("a_18446744073709551615", 1), testset("b_0", 1)];
        let active = resolve_testsets(&sets).unwrap();
        assert_eq!(active.total_weight, u64::MAX);
    }

    fn parse_testset(xml: &str) -> Result<Testset, Error> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        Testset::from_node(doc.root_element(), Path::new("/pkg"))
    }

    #[test]
    fn test_from_node() {
        let set = parse_testset(
            r#"<testset name="main_80">
                <time-limit>2000</time-limit>
                <memory-limit>268435456</memory-limit>
                <test-count>2</test-count>
                <input-path-pattern>tests/%02d</input-path-pattern>
                <answer-path-pattern>tests/%02d.a</answer-path-pattern>
            </testset>"#,
        )
        .unwrap();
        assert_eq!(set.name(), "main");
        assert_eq!(set.weight(), 80);
        assert_eq!(set.time_limit, 2000);
        assert_eq!(set.memory_limit, 256);
        assert_eq!(set.tests().last().unwrap().answer, Path::new("/pkg/tests/02.a"));
    }

    #[test]
    fn test_from_node_invalid_pattern_of_empty_testset() {
        let set = parse_testset(
            r#"<testset name="unused">
                <test-count>0</test-count>
                <input-path-pattern>tests/%s</input-path-pattern>
                <answer-path-pattern>tests/%d%d</answer-path-pattern>
            </testset>"#,
        )
        .unwrap();
        assert_eq!(set.test_count, 0);
        assert_that!(set.tests().collect_vec()).is_empty();
    }

    #[test]
    fn test_from_node_invalid_pattern_of_used_testset() {
        let err = parse_testset(
            r#"<testset name="tests">
                <test-count>1</test-count>
                <input-path-pattern>tests/%s</input-path-pattern>
                <answer-path-pattern>tests/%02d.a</answer-path-pattern>
            </testset>"#,
        )
        .unwrap_err();
        assert_that!(format!("{:#}", err)).contains("input-path-pattern");
    }
}
