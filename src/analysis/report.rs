use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use super::endpoints::EndpointPair;
use super::metrics::BandMetrics;

// ---------------------------------------------------------------------------
// BandMetricsRow – one record per (curve, endpoint pair) combination
// ---------------------------------------------------------------------------

/// One row of the band-metrics results table.
///
/// The serde field names double as the CSV header; the column order is part
/// of the export contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandMetricsRow {
    #[serde(rename = "band fwhm")]
    pub band_fwhm: f64,
    #[serde(rename = "band min")]
    pub band_min: f64,
    #[serde(rename = "band centre")]
    pub band_centre: f64,
    #[serde(rename = "band depth")]
    pub band_depth: f64,
    #[serde(rename = "band area")]
    pub band_area: f64,
    #[serde(rename = "x min")]
    pub x_min: f64,
    #[serde(rename = "x max")]
    pub x_max: f64,
    #[serde(rename = "y min")]
    pub y_min: f64,
    #[serde(rename = "y max")]
    pub y_max: f64,
}

impl BandMetricsRow {
    /// Assemble a row from computed metrics and the x-ordered endpoint pair
    /// that produced the segment. The bounds columns carry the pair's
    /// anchors after ordering, so each y stays with its x.
    pub fn new(metrics: BandMetrics, pair: &EndpointPair) -> Self {
        BandMetricsRow {
            band_fwhm: metrics.fwhm,
            band_min: metrics.minimum,
            band_centre: metrics.centre,
            band_depth: metrics.depth,
            band_area: metrics.area,
            x_min: pair.start.x,
            x_max: pair.end.x,
            y_min: pair.start.y,
            y_max: pair.end.y,
        }
    }
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Write the metrics table as comma-separated text: one header record,
/// one record per row, no row indices.
pub fn write_csv<W: Write>(writer: W, rows: &[BandMetricsRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer
            .serialize(row)
            .context("serializing band-metrics row")?;
    }
    csv_writer.flush().context("flushing CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::endpoints::ContinuumAnchor;

    fn sample_row() -> BandMetricsRow {
        let pair = EndpointPair::new(
            ContinuumAnchor::new(4.0, 0.9),
            ContinuumAnchor::new(1.0, 0.7),
        )
        .ordered();
        let metrics = BandMetrics {
            fwhm: 2.0,
            minimum: 0.5,
            centre: 2.0,
            depth: 0.5,
            area: 0.9,
        };
        BandMetricsRow::new(metrics, &pair)
    }

    #[test]
    fn bounds_carry_swapped_anchors() {
        let row = sample_row();
        assert_eq!(row.x_min, 1.0);
        assert_eq!(row.x_max, 4.0);
        assert_eq!(row.y_min, 0.7);
        assert_eq!(row.y_max, 0.9);
    }

    #[test]
    fn csv_header_matches_contract() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[sample_row()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "band fwhm,band min,band centre,band depth,band area,x min,x max,y min,y max"
        );
        assert_eq!(lines.next().unwrap(), "2.0,0.5,2.0,0.5,0.9,1.0,4.0,0.7,0.9");
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_table_writes_nothing() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        assert!(buf.is_empty());
    }
}
