mod receipt;
mod store;

pub use receipt::{
    now_utc_iso, write_receipt, DemoReceipt, StageReceipt, RECEIPT_SCHEMA_VERSION,
};
pub use store::{demo_url, remove_inputs, DemoStore, StoredDemo, INDEX_FILE, RECEIPT_FILE};
