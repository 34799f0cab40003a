use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser};

use polyconv_format::{ConversionConfig, TargetFormat};

/// Version of the binary, with the git revision if available.
const VERSION: &str = include_str!(concat!(env!("OUT_DIR"), "/version.txt"));

#[derive(Parser, Debug)]
#[clap(
    name = "polyconv",
    version = VERSION,
    about = "Convert Polygon packages into BOCA and Jude packages",
    group(clap::ArgGroup::new("input").required(true).args(["contest", "file"])),
)]
pub struct Opt {
    /// The target format: boca or jude. Anything other than jude produces a BOCA package.
    #[clap(short = 't', long = "target", default_value = "boca")]
    pub target: String,

    /// Convert all the problems of this Polygon contest package
    #[clap(short = 'c', long = "contest")]
    pub contest: Option<PathBuf>,

    /// Convert every file that matches this glob pattern
    #[clap(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Multiplier applied to the time limits
    #[clap(short = 'm', long = "multiplier", default_value = "1")]
    pub multiplier: f64,

    /// Number of times a solution is run against each test
    #[clap(short = 'r', long = "runs", default_value = "1")]
    pub runs: u32,

    /// Maximum size of the submitted sources, in KiB
    #[clap(long = "source-limit", default_value = "512")]
    pub source_limit: u64,

    /// Where to write the packages, created if missing. Defaults to next to the source package.
    #[clap(short = 'd', long = "dir")]
    pub dir: Option<PathBuf>,

    /// Use this statement for every problem
    #[clap(long = "pdf")]
    pub pdf: Option<PathBuf>,

    /// Short name of the problem used by BOCA
    #[clap(short = 's', long = "short")]
    pub short_name: Option<String>,

    /// Language of the problem names and of the statements
    #[clap(long = "lang", default_value = "portuguese")]
    pub lang: String,

    /// Testset used for the limits and the tests of the BOCA packages
    #[clap(long = "testset", default_value = "tests")]
    pub testset: String,

    /// Directory with the BOCA templates
    #[clap(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Kill the validation script of a problem after this number of seconds
    #[clap(long = "validation-timeout")]
    pub validation_timeout: Option<u64>,

    /// Continue the conversion of a contest even if some validations fail, without asking
    #[clap(short = 'y', long = "yes")]
    pub yes: bool,

    #[clap(flatten)]
    pub logger: LoggerOpt,
}

#[derive(Args, Debug, Clone)]
pub struct LoggerOpt {
    /// Verbose mode (-v, -vv, -vvv, etc.)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Opt {
    /// Make a `ConversionConfig` from this command line options.
    pub fn to_config(&self) -> ConversionConfig {
        ConversionConfig {
            time_multiplier: self.multiplier,
            repetitions: self.runs,
            source_size_kib: self.source_limit,
            output_dir: self.dir.clone(),
            force_statement: self.pdf.clone(),
            statement_language: self.lang.clone(),
            default_testset: self.testset.clone(),
            template_dir: self.template_dir.clone(),
            validation_timeout: self.validation_timeout.map(Duration::from_secs),
            ..Default::default()
        }
    }

    /// The format of the packages to produce.
    pub fn target_format(&self) -> TargetFormat {
        match self.target.parse() {
            Ok(format) => format,
            Err(never) => match never {},
        }
    }
}

impl LoggerOpt {
    pub fn enable_log(&self) {
        if self.verbose > 0 {
            std::env::set_var("RUST_BACKTRACE", "1");
            match self.verbose {
                0 => unreachable!(),
                1 => std::env::set_var("RUST_LOG", "info"),
                2 => std::env::set_var("RUST_LOG", "debug"),
                _ => std::env::set_var("RUST_LOG", "trace"),
            }
        }

        env_logger::Builder::from_default_env()
            .format_timestamp_nanos()
            .init();
        better_panic::install();
    }
}
