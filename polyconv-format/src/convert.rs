use std::path::{Path, PathBuf};

use anyhow::{Context, Error};

use crate::boca::{BocaAssembler, BocaOptions};
use crate::jude::JudeAssembler;
use crate::{plan_output_name, planned_output_name, ConversionConfig, SourcePackage, TargetFormat};

/// Converts the Polygon problem packages into judge packages.
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConversionConfig,
}

impl Converter {
    /// Make a new converter with the provided configuration.
    pub fn new(config: ConversionConfig) -> Converter {
        Converter { config }
    }

    /// The configuration of this converter.
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// The path of the package that converting `source` would produce.
    pub fn output_path(
        &self,
        source: &Path,
        format: TargetFormat,
        index: Option<&str>,
    ) -> Result<PathBuf, Error> {
        plan_output_name(source, format, index, self.config.output_dir.as_deref())
    }

    /// Convert the problem package at `source`, returning the path of the produced package.
    ///
    /// `index` is the index of the problem inside its contest and `short_name` overrides the short
    /// name of the problem, only BOCA packages use it.
    pub fn convert(
        &self,
        source: &Path,
        format: TargetFormat,
        index: Option<&str>,
        short_name: Option<&str>,
    ) -> Result<PathBuf, Error> {
        let package = SourcePackage::open(source)?;
        let problem = package
            .problem(&self.config)
            .with_context(|| format!("Failed to parse the problem at {}", source.display()))?;
        let output = planned_output_name(
            source,
            format,
            index,
            self.config.output_dir.as_deref(),
            problem.revision,
        );
        info!("Target path: {}", output.display());
        match format {
            TargetFormat::Boca => {
                let options = BocaOptions { short_name, index };
                BocaAssembler::new(&self.config).assemble(&problem, &options, &output)?;
            }
            TargetFormat::Jude => {
                JudeAssembler::new(&self.config).assemble(&problem, &output)?;
            }
        }
        Ok(output)
    }
}
