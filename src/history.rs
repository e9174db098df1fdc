use crate::error::TunerResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One past tuning outcome, stored as a CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub region: String,
    pub parameter: String,
    pub value: i64,
    pub converged: bool,
}

/// Reads past outcomes keyed by region. A missing file is an empty history;
/// later rows for the same region win.
pub fn load<P: AsRef<Path>>(path: P) -> TunerResult<HashMap<String, HistoryRecord>> {
    let path = path.as_ref();
    let mut records = HashMap::new();
    if !path.exists() {
        debug!("No tuning history at {}", path.display());
        return Ok(records);
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    for result in rdr.deserialize() {
        let record: HistoryRecord = result?;
        records.insert(record.region.clone(), record);
    }

    debug!(
        "Loaded {} tuning history records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Replaces the history file with `records`.
pub fn save<P: AsRef<Path>>(path: P, records: &[HistoryRecord]) -> TunerResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
