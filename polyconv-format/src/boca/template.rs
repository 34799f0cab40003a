use std::path::Path;

use anyhow::{Context, Error};
use serde::Serialize;
use unic::normal::StrNormalForm;
use unic::ucd::category::GeneralCategory;
use walkdir::WalkDir;

/// Suffix of the entries of the template tree that are rendered.
pub const TEMPLATE_SUFFIX: &str = ".tera";
/// Rendered in place of `checker_content`, replaced by the raw bytes after the rendering.
const CHECKER_CONTENT_TOKEN: &str = "\u{1}polyconv:checker_content\u{1}";
/// Rendered in place of `testlib_content`, replaced by the raw bytes after the rendering.
const TESTLIB_CONTENT_TOKEN: &str = "\u{1}polyconv:testlib_content\u{1}";

/// The variables available to the BOCA templates.
#[derive(Debug, Clone, Serialize)]
pub struct BocaTemplateVars {
    /// Multiplier of the time limit.
    pub multiplier: f64,
    /// Number of times a solution is run against each test.
    pub reps: u32,
    /// Maximum size of the source files, in KiB.
    pub source_size: u64,
    /// Speed rating of the judging machine of Polygon.
    pub clock: u64,
    /// Time limit in milliseconds, without the multiplier.
    pub time_limit: u64,
    /// Time limit in whole seconds with the multiplier applied, at least 1.
    pub time_limit_seconds: u64,
    /// Memory limit in MiB.
    pub memory_limit: u64,
    /// Short name of the problem.
    pub short_name: String,
    /// Name of the problem, transliterated to ASCII.
    pub full_name: String,
    /// File name of the statement inside `description/`, or `no`.
    pub statement_path: String,
    /// File name of the checker source.
    pub checker_path: String,
    /// Polygon language of the checker source.
    pub checker_lang: String,
    /// Content of the checker source, inserted byte by byte.
    #[serde(skip)]
    pub checker_content: Vec<u8>,
    /// Content of `testlib.h`, inserted byte by byte.
    #[serde(skip)]
    pub testlib_content: Vec<u8>,
}

impl BocaTemplateVars {
    /// The content blobs with the tokens that stand for them in the rendered text.
    fn blobs(&self) -> [(&'static str, &[u8]); 2] {
        [
            (CHECKER_CONTENT_TOKEN, self.checker_content.as_slice()),
            (TESTLIB_CONTENT_TOKEN, self.testlib_content.as_slice()),
        ]
    }
}

/// Replace the tokens of `rendered` with their blobs, in a single pass.
fn splice_blobs(rendered: &str, blobs: &[(&str, &[u8])]) -> Vec<u8> {
    let mut output = Vec::with_capacity(rendered.len());
    let mut rest = rendered;
    loop {
        let next = blobs
            .iter()
            .filter_map(|(token, blob)| rest.find(token).map(|pos| (pos, *token, *blob)))
            .min_by_key(|(pos, _, _)| *pos);
        match next {
            Some((pos, token, blob)) => {
                output.extend_from_slice(rest[..pos].as_bytes());
                output.extend_from_slice(blob);
                rest = &rest[pos + token.len()..];
            }
            None => {
                output.extend_from_slice(rest.as_bytes());
                return output;
            }
        }
    }
}

/// Time limit in seconds as BOCA wants it: rounded up and never zero.
pub(crate) fn time_limit_seconds(time_limit_ms: u64, multiplier: f64) -> u64 {
    let seconds = (time_limit_ms as f64 * multiplier / 1000.0).ceil();
    if seconds.is_finite() && seconds >= 1.0 {
        seconds as u64
    } else {
        1
    }
}

/// Make the name safe for BOCA: accents are removed and any other non-ASCII character becomes `?`.
pub fn transliterate(name: &str) -> String {
    name.nfd()
        .filter(|c| GeneralCategory::of(*c) != GeneralCategory::NonspacingMark)
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}

/// Copy the template tree at `template_dir` into `dest`. The entries ending with `.tera` are
/// rendered with `vars` and saved without the suffix, the others are copied as they are.
pub fn render_tree(template_dir: &Path, dest: &Path, vars: &BocaTemplateVars) -> Result<(), Error> {
    if !template_dir.is_dir() {
        anyhow::bail!(
            "The template directory {} does not exist",
            template_dir.display()
        );
    }
    let mut context =
        tera::Context::from_serialize(vars).context("Failed to build the template context")?;
    context.insert("checker_content", CHECKER_CONTENT_TOKEN);
    context.insert("testlib_content", TESTLIB_CONTENT_TOKEN);
    let blobs = vars.blobs();
    for entry in WalkDir::new(template_dir).min_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to walk {}", template_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path
            .strip_prefix(template_dir)
            .context("Template outside of the template directory")?;
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let name = entry.file_name().to_string_lossy();
        match name.strip_suffix(TEMPLATE_SUFFIX) {
            Some(stripped) => {
                debug!("Rendering template {}", relative.display());
                let target = target.with_file_name(stripped);
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read template {}", path.display()))?;
                let rendered = tera::Tera::one_off(&text, &context, false)
                    .with_context(|| format!("Failed to render template {}", path.display()))?;
                std::fs::write(&target, splice_blobs(&rendered, &blobs))
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                let permissions = entry
                    .metadata()
                    .with_context(|| format!("Failed to stat {}", path.display()))?
                    .permissions();
                std::fs::set_permissions(&target, permissions).with_context(|| {
                    format!("Failed to set permissions of {}", target.display())
                })?;
            }
            None => {
                debug!("Copying template {}", relative.display());
                std::fs::copy(path, &target).with_context(|| {
                    format!("Failed to copy {} to {}", path.display(), target.display())
                })?;
            }
        }
    }
    Ok(())
}
