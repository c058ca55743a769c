//! Maps regions to partitions.
//!
//! A region resolves to the first partition that lists it
//! explicitly, then to the first partition whose `regionRegex`
//! matches it, and finally to the `aws` partition.

use std::collections::HashMap;

use regex::Regex;
use serde_derive::Deserialize;

use crate::DiagnosticCollector;

const DEFAULT_PARTITIONS: &str = include_str!("partitions.json");

/// The partition a region belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Partition<'a> {
    name: &'a str,
    dns_suffix: &'a str,
    dual_stack_dns_suffix: &'a str,
    supports_fips: bool,
    supports_dual_stack: bool,
    implicit_global_region: &'a str,
}

impl<'a> Partition<'a> {
    /// The partition name, e.g. `aws`.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The DNS suffix, e.g. `amazonaws.com`.
    pub fn dns_suffix(&self) -> &'a str {
        self.dns_suffix
    }

    /// The dual-stack DNS suffix, e.g. `api.aws`.
    pub fn dual_stack_dns_suffix(&self) -> &'a str {
        self.dual_stack_dns_suffix
    }

    /// Whether FIPS endpoints exist.
    pub fn supports_fips(&self) -> bool {
        self.supports_fips
    }

    /// Whether dual-stack endpoints exist.
    pub fn supports_dual_stack(&self) -> bool {
        self.supports_dual_stack
    }

    /// The region global endpoints live in.
    pub fn implicit_global_region(&self) -> &'a str {
        self.implicit_global_region
    }
}

/// The partition table could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum PartitionTableError {
    /// The table is not valid JSON.
    #[error("invalid partition table: {0}")]
    Json(#[from] serde_json::Error),
    /// A partition's `regionRegex` is invalid.
    #[error("invalid region regex for partition `{partition}`")]
    Regex {
        /// The partition id.
        partition: String,
        /// The underlying error.
        #[source]
        source: regex::Error,
    },
}

#[derive(Deserialize)]
struct PartitionTable {
    partitions: Vec<RawPartition>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPartition {
    id: String,
    region_regex: String,
    #[serde(default)]
    regions: HashMap<String, OutputOverride>,
    outputs: Outputs,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Outputs {
    name: String,
    dns_suffix: String,
    dual_stack_dns_suffix: String,
    #[serde(rename = "supportsFIPS")]
    supports_fips: bool,
    supports_dual_stack: bool,
    implicit_global_region: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutputOverride {
    name: Option<String>,
    dns_suffix: Option<String>,
    dual_stack_dns_suffix: Option<String>,
    #[serde(rename = "supportsFIPS")]
    supports_fips: Option<bool>,
    supports_dual_stack: Option<bool>,
    implicit_global_region: Option<String>,
}

#[derive(Clone, Debug)]
struct PartitionEntry {
    id: String,
    region_regex: Regex,
    regions: HashMap<String, OutputOverride>,
    outputs: Outputs,
}

impl PartitionEntry {
    fn partition<'a>(&'a self, region: Option<&'a OutputOverride>) -> Partition<'a> {
        let o = &self.outputs;
        let r = region;
        Partition {
            name: r.and_then(|r| r.name.as_deref()).unwrap_or(&o.name),
            dns_suffix: r
                .and_then(|r| r.dns_suffix.as_deref())
                .unwrap_or(&o.dns_suffix),
            dual_stack_dns_suffix: r
                .and_then(|r| r.dual_stack_dns_suffix.as_deref())
                .unwrap_or(&o.dual_stack_dns_suffix),
            supports_fips: r.and_then(|r| r.supports_fips).unwrap_or(o.supports_fips),
            supports_dual_stack: r
                .and_then(|r| r.supports_dual_stack)
                .unwrap_or(o.supports_dual_stack),
            implicit_global_region: r
                .and_then(|r| r.implicit_global_region.as_deref())
                .unwrap_or(&o.implicit_global_region),
        }
    }
}

/// Resolves regions to [`Partition`]s.
#[derive(Clone, Debug)]
pub struct PartitionResolver {
    partitions: Vec<PartitionEntry>,
}

impl PartitionResolver {
    /// Loads a partition table in the `partitions.json` format.
    pub fn from_json(json: &str) -> Result<Self, PartitionTableError> {
        let table: PartitionTable = serde_json::from_str(json)?;
        let partitions = table
            .partitions
            .into_iter()
            .map(|p| {
                let region_regex =
                    Regex::new(&p.region_regex).map_err(|source| PartitionTableError::Regex {
                        partition: p.id.clone(),
                        source,
                    })?;
                Ok(PartitionEntry {
                    id: p.id,
                    region_regex,
                    regions: p.regions,
                    outputs: p.outputs,
                })
            })
            .collect::<Result<_, PartitionTableError>>()?;
        Ok(Self { partitions })
    }

    /// Returns the partition `region` belongs to.
    pub fn resolve_partition<'a>(
        &'a self,
        region: &str,
        e: &mut DiagnosticCollector,
    ) -> Option<Partition<'a>> {
        if let Some((p, r)) = self
            .partitions
            .iter()
            .find_map(|p| Some((p, p.regions.get(region)?)))
        {
            return Some(p.partition(Some(r)));
        }
        if let Some(p) = self.partitions.iter().find(|p| p.region_regex.is_match(region)) {
            return Some(p.partition(None));
        }
        match self.partitions.iter().find(|p| p.id == "aws") {
            Some(p) => Some(p.partition(None)),
            None => {
                e.report_error(format!("no partition found for `{region}`"));
                None
            }
        }
    }
}

impl Default for PartitionResolver {
    /// The built-in partition table.
    fn default() -> Self {
        // The built-in table is covered by tests.
        Self::from_json(DEFAULT_PARTITIONS).unwrap_or(Self {
            partitions: Vec::new(),
        })
    }
}
