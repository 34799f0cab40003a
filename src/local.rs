use std::path::{Path, PathBuf};

use anyhow::{Context, Error};

use polyconv_format::contest::{ContestConverter, ContestReport, ScriptValidator};
use polyconv_format::{ConversionConfig, Converter, TargetFormat};

use crate::prompt::{PrintingValidator, TerminalConfirmation};
use crate::Opt;

/// The files matching the glob pattern, directories excluded.
pub fn find_packages(pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let paths = glob::glob(pattern).with_context(|| format!("Invalid pattern {:?}", pattern))?;
    let mut packages = vec![];
    for path in paths {
        let path = path.context("Failed to expand the pattern")?;
        if path.is_file() {
            packages.push(path);
        }
    }
    Ok(packages)
}

/// Convert the problem packages one after the other, stopping at the first failure.
pub fn convert_packages(
    packages: &[PathBuf],
    format: TargetFormat,
    config: ConversionConfig,
    short_name: Option<&str>,
) -> Result<Vec<PathBuf>, Error> {
    let converter = Converter::new(config);
    let mut outputs = vec![];
    for package in packages {
        println!("============ Processing package {}...", package.display());
        println!("Target format: {}", format);
        let output = converter
            .convert(package, format, None, short_name)
            .with_context(|| format!("Failed to convert {}", package.display()))?;
        println!("Package written to {}", output.display());
        outputs.push(output);
    }
    Ok(outputs)
}

/// Convert all the problems of a contest.
pub fn convert_contest(
    contest: &Path,
    format: TargetFormat,
    config: ConversionConfig,
    assume_yes: bool,
) -> Result<ContestReport, Error> {
    println!("======= Processing contest {}...", contest.display());
    println!("Target format: {}", format);
    let mut validator = PrintingValidator::new(ScriptValidator::from_config(&config).echo(true));
    let mut confirmation = TerminalConfirmation::new(assume_yes);
    let report = ContestConverter::new(config).convert(
        contest,
        format,
        &mut validator,
        &mut confirmation,
    )?;
    print_report(&report);
    Ok(report)
}

fn print_report(report: &ContestReport) {
    for (problem, path) in &report.skipped {
        println!(
            "Package of {} already exists for this revision ({}), skipped",
            problem.short_name,
            path.display()
        );
    }
    for (problem, path) in &report.converted {
        println!("{}: {} written", problem.index, path.display());
    }
    let failed = report.failed_validations();
    if !failed.is_empty() {
        println!("Converted despite a failed validation: {}", failed.join(", "));
    }
}

/// Run the conversion described by the command line options.
pub fn main_local(opt: Opt) -> Result<(), Error> {
    let config = opt.to_config();
    let format = opt.target_format();
    if let Some(dir) = &config.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    if let Some(contest) = &opt.contest {
        convert_contest(contest, format, config, opt.yes)?;
    } else if let Some(pattern) = &opt.file {
        let packages = find_packages(pattern)?;
        if packages.is_empty() {
            warn!("No file matches {}", pattern);
        }
        convert_packages(&packages, format, config, opt.short_name.as_deref())?;
    }
    Ok(())
}
