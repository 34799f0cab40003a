use anyhow::{Context, Error};
use serde::{Deserialize, Serialize};

use crate::polygon::{ActiveTestsets, ProblemDescriptor};
use crate::ConversionConfig;

/// The `jude.yml` manifest of a Jude package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudeManifest {
    /// The sum of the weights of the datasets.
    pub weight: u64,
    /// The limits of the problem.
    pub limits: JudeLimits,
    /// The datasets, in the order they are evaluated.
    pub datasets: Vec<JudeDataset>,
    /// Path of the statement inside the package, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
}

/// The limits of a Jude problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudeLimits {
    /// Maximum size of the source files, in KiB.
    pub source: u64,
    /// Time limit in milliseconds.
    pub time: u64,
    /// Memory limit in MiB.
    pub memory: u64,
    /// Multiplier of the time limit.
    #[serde(rename = "timeMultiplier")]
    pub time_multiplier: f64,
}

/// A dataset of a Jude problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudeDataset {
    /// Fraction of the score assigned to the dataset.
    pub percentage: f64,
    /// Directory of the tests, relative to `tests/`.
    pub path: String,
    /// Name of the dataset.
    pub name: String,
}

impl JudeManifest {
    /// Build the manifest of a problem. The limits are the ones of the default testset.
    pub fn new(
        problem: &ProblemDescriptor,
        testsets: &ActiveTestsets,
        config: &ConversionConfig,
    ) -> JudeManifest {
        JudeManifest {
            weight: testsets.total_weight,
            limits: JudeLimits {
                source: config.source_size_kib,
                time: problem.time_limit(),
                memory: problem.memory_limit(),
                time_multiplier: config.time_multiplier,
            },
            datasets: testsets
                .iter()
                .map(|(testset, percentage)| JudeDataset {
                    percentage,
                    path: testset.name(),
                    name: testset.name(),
                })
                .collect(),
            statement: None,
        }
    }

    /// Serialize the manifest to YAML.
    pub fn to_yaml(&self) -> Result<String, Error> {
        serde_yaml::to_string(self).context("Failed to serialize jude.yml")
    }
}
