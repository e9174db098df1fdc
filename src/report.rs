use crate::consts::COALESCED_PARCELS;
use crate::history::HistoryRecord;
use crate::registry::TuningRegistry;
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub region: String,
    pub parameter: String,
    pub value: i64,
    pub converged: bool,
    pub evaluations: usize,
}

impl SummaryEntry {
    pub fn status(&self) -> &'static str {
        if self.converged {
            "CONVERGED"
        } else {
            "NOT CONVERGED"
        }
    }
}

/// Final decisions for every tuned region, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub entries: Vec<SummaryEntry>,
}

pub struct SummaryReporter;

impl SummaryReporter {
    /// Reads each region's settled value. Expects no concurrent dispatches.
    pub fn report(registry: &TuningRegistry) -> Summary {
        let entries = registry
            .snapshot()
            .into_iter()
            .map(|request| SummaryEntry {
                region: request.name().to_string(),
                parameter: COALESCED_PARCELS.to_string(),
                value: request.long_value(COALESCED_PARCELS),
                converged: request.has_converged(),
                evaluations: request.session().evaluations(),
            })
            .collect();
        Summary { entries }
    }
}

impl Summary {
    pub fn get(&self, region: &str) -> Option<&SummaryEntry> {
        self.entries.iter().find(|e| e.region == region)
    }

    pub fn to_history(&self) -> Vec<HistoryRecord> {
        self.entries
            .iter()
            .map(|e| HistoryRecord {
                region: e.region.clone(),
                parameter: e.parameter.clone(),
                value: e.value,
                converged: e.converged,
            })
            .collect()
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(ASCII_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.add_row(vec![
            Cell::new("Region").add_attribute(Attribute::Bold),
            Cell::new("Parameter"),
            Cell::new("Value").fg(Color::Cyan),
            Cell::new("Samples"),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

        for i in 2..=3 {
            if let Some(col) = table.column_mut(i) {
                col.set_cell_alignment(CellAlignment::Right);
            }
        }

        for e in &self.entries {
            let status_color = if e.converged { Color::Green } else { Color::Red };
            table.add_row(vec![
                Cell::new(&e.region).add_attribute(Attribute::Bold),
                Cell::new(&e.parameter),
                Cell::new(e.value).fg(Color::Cyan),
                Cell::new(e.evaluations),
                Cell::new(e.status()).fg(status_color),
            ]);
        }
        table
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Final settings: ")?;
        for e in &self.entries {
            writeln!(
                f,
                "name: {}, {}: {} {}",
                e.region,
                e.parameter,
                e.value,
                e.status()
            )?;
        }
        Ok(())
    }
}
