//! The Polygon package descriptors.
//!
//! `problem.xml` and `contest.xml` are parsed eagerly into plain data: after the parsing no XML
//! tree is kept around and all the paths are already resolved against the root of the package.

use std::path::{Component, Path, PathBuf};

use roxmltree::Node;

pub use contest::{ContestDescriptor, ContestProblem};
pub use pattern::PathPattern;
pub use problem::{CheckerSource, ProblemDescriptor};
pub use testset::{resolve_testsets, split_name_weight, ActiveTestsets, TestCase, Testset};

mod contest;
mod pattern;
mod problem;
mod testset;

/// Name of the problem descriptor inside a problem package.
pub const PROBLEM_XML: &str = "problem.xml";
/// Name of the contest descriptor inside a contest package.
pub const CONTEST_XML: &str = "contest.xml";

/// The first child element of `node` with the provided tag name.
fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

/// The first descendant element of `node` with the provided tag name. `node` itself is included.
fn descendant<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| n.has_tag_name(tag))
}

/// The text of the first child element of `node` with the provided tag name, or an empty string.
fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> &'a str {
    child(node, tag).and_then(|n| n.text()).unwrap_or("")
}

/// Parse the integer at the start of `text`, ignoring what follows it. Empty or non numeric text
/// is zero, as are negative values.
fn lenient_int(text: &str) -> u64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let mut value: u64 = 0;
    let mut last_underscore = false;
    for (i, ch) in digits.char_indices() {
        match ch {
            '0'..='9' => {
                value = value
                    .saturating_mul(10)
                    .saturating_add(u64::from(ch as u8 - b'0'));
                last_underscore = false;
            }
            '_' if i > 0 && !last_underscore => last_underscore = true,
            _ => break,
        }
    }
    if negative {
        0
    } else {
        value
    }
}

/// Resolve `path` against `root`, normalizing `.` and `..` lexically. Absolute paths are kept.
fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let mut result = PathBuf::new();
    for component in root.join(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}
