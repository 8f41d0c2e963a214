use crate::arrange::{ArrangePhase, ArrangeReport, LabelReport};
use crate::layout::Region;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDump<'a> {
    pub axis: String,
    pub origin: [f64; 3],
    pub growth: &'static str,
    pub placed: usize,
    pub leaders_reconnected: usize,
    pub placements: Vec<PlacementDump>,
    pub issues: &'a [LabelReport],
    pub phases: &'a [ArrangePhase],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDump {
    pub label: u64,
    pub anchor: [f64; 2],
    pub head: [f64; 3],
    pub bbox: [f64; 4],
    pub attempts: usize,
    pub exhausted: bool,
}

impl<'a> ReportDump<'a> {
    pub fn from_report(report: &'a ArrangeReport) -> Self {
        let placements = report
            .placements
            .iter()
            .map(|p| PlacementDump {
                label: p.label.0,
                anchor: [p.anchor.x, p.anchor.y],
                head: [p.head.x, p.head.y, p.head.z],
                bbox: [p.bbox.min.x, p.bbox.min.y, p.bbox.max.x, p.bbox.max.y],
                attempts: p.attempts,
                exhausted: p.exhausted,
            })
            .collect();

        let growth = match (report.axis, report.region) {
            (crate::model::SortAxis::Horizontal, _) => "leftToRight",
            (_, Some(Region::Above)) => "topToBottom",
            _ => "bottomToTop",
        };

        ReportDump {
            axis: format!("{:?}", report.axis),
            origin: [report.origin.x, report.origin.y, report.origin.z],
            growth,
            placed: report.placed(),
            leaders_reconnected: report.leaders_reconnected,
            placements,
            issues: &report.issues,
            phases: &report.phases,
        }
    }
}

pub fn write_report_dump(path: &Path, report: &ArrangeReport) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = ReportDump::from_report(report);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
