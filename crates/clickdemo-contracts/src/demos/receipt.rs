use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::region::RegionCode;

pub const RECEIPT_SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReceipt {
    pub stage: String,
    pub attempts: u32,
}

/// What was generated and how. The design-system text is deliberately not
/// part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoReceipt {
    pub schema_version: u64,
    pub demo_id: String,
    pub contract_id: String,
    pub region: RegionCode,
    pub provider: String,
    pub model: String,
    pub context_images: usize,
    #[serde(default)]
    pub stages: Vec<StageReceipt>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub html_bytes: usize,
    pub started_at: String,
    pub finished_at: String,
}

impl DemoReceipt {
    pub fn total_attempts(&self) -> u32 {
        self.stages.iter().map(|stage| stage.attempts).sum()
    }
}

pub fn write_receipt(path: &Path, receipt: &DemoReceipt) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(receipt)?)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn read_receipt(path: &Path) -> anyhow::Result<DemoReceipt> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
