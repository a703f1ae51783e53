use std::path::PathBuf;

use anyhow::Context;

use super::receipt::{write_receipt, DemoReceipt};

pub const INDEX_FILE: &str = "index.html";
pub const RECEIPT_FILE: &str = "receipt.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDemo {
    pub demo_id: String,
    pub dir: PathBuf,
    pub index_path: PathBuf,
    pub receipt_path: PathBuf,
}

/// On-disk layout of generated demos: `{root}/{demo_id}/index.html`.
#[derive(Debug, Clone)]
pub struct DemoStore {
    root: PathBuf,
}

impl DemoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn new_demo_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn demo_dir(&self, demo_id: &str) -> PathBuf {
        self.root.join(demo_id)
    }

    pub fn write(&self, html: &str, receipt: &DemoReceipt) -> anyhow::Result<StoredDemo> {
        let dir = self.demo_dir(&receipt.demo_id);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let index_path = dir.join(INDEX_FILE);
        std::fs::write(&index_path, html)
            .with_context(|| format!("failed to write {}", index_path.display()))?;
        let receipt_path = dir.join(RECEIPT_FILE);
        write_receipt(&receipt_path, receipt)
            .with_context(|| format!("failed to write {}", receipt_path.display()))?;
        Ok(StoredDemo {
            demo_id: receipt.demo_id.clone(),
            dir,
            index_path,
            receipt_path,
        })
    }
}

pub fn demo_url(base_url: &str, demo_id: &str) -> String {
    format!("{}/demos/{}", base_url.trim().trim_end_matches('/'), demo_id)
}

/// Removes uploaded inputs once their demo has been written. Every path is
/// attempted; the first failure is reported.
pub fn remove_inputs(paths: &[PathBuf]) -> anyhow::Result<()> {
    let mut first_error = None;
    for path in paths {
        if let Err(err) = std::fs::remove_file(path) {
            if first_error.is_none() {
                first_error =
                    Some(anyhow::Error::new(err).context(format!("failed to remove {}", path.display())));
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
