use crate::libs::descriptor::{OutputLocation, ReadPair};
use crate::libs::error::{PipelineError, Result};
use itertools::Itertools;
use serde_json::Value;
use std::path::Path;

pub const DEFAULT_BINS: usize = 4;

/// A parsed run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub paired_reads: Vec<ReadPair>,
    pub s3_output: OutputLocation,
    pub apps_image: String,
    pub utils_image: String,
    pub bismark_index_url: String,
    pub bismark_genome_uri: String,
    pub bins: usize,
}

fn field<'a>(raw: &'a Value, name: &str) -> Result<&'a Value> {
    raw.get(name)
        .ok_or_else(|| PipelineError::ConfigFieldMissing(name.to_string()))
}

fn string_field(raw: &Value, name: &str) -> Result<String> {
    field(raw, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PipelineError::MalformedInput(format!("config field {} should be a string", name)))
}

impl PipelineConfig {
    pub fn from_value(raw: &Value) -> Result<Self> {
        if !raw.is_object() {
            return Err(PipelineError::MalformedInput(
                "config should be a JSON object".to_string(),
            ));
        }

        let paired_reads = field(raw, "paired_reads")?
            .as_array()
            .ok_or_else(|| PipelineError::MalformedInput("paired_reads should be a list".to_string()))?
            .iter()
            .map(ReadPair::parse)
            .collect::<Result<Vec<_>>>()?;

        let bins = match raw.get("bins") {
            None | Some(Value::Null) => DEFAULT_BINS,
            Some(v) => match v.as_u64() {
                Some(n) if n > 0 => n as usize,
                _ => {
                    return Err(PipelineError::MalformedInput(format!(
                        "bins should be a positive integer, got {}",
                        v
                    )))
                }
            },
        };

        let config = Self {
            paired_reads,
            apps_image: string_field(raw, "apps_image")?,
            utils_image: string_field(raw, "utils_image")?,
            s3_output: OutputLocation::parse(&string_field(raw, "s3_output")?)?,
            bismark_genome_uri: string_field(raw, "bismark_reference_genome_fasta")?,
            bismark_index_url: string_field(raw, "bismark_genome_index")?,
            bins,
        };

        let dups = config.duplicate_names();
        if !dups.is_empty() {
            log::warn!(
                "paired reads share names: {}; outputs are keyed by shard index",
                dups.join(", ")
            );
        }

        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)
            .map_err(|e| PipelineError::MalformedInput(format!("config is not valid JSON: {}", e)))?;
        Self::from_value(&raw)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Names carried by more than one read pair, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<String> {
        self.paired_reads
            .iter()
            .map(|p| p.name.as_str())
            .duplicates()
            .map(str::to_string)
            .collect()
    }
}
