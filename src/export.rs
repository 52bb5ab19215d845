//! Candidate table export for the dashboard

use std::path::Path;

use tracing::{debug, info};

use crate::Result;
use crate::models::Candidate;

/// Write the candidates as a delimited table with a header row.
///
/// Nothing is written for an empty slice; returns whether a file was written.
pub fn write_candidates(path: impl AsRef<Path>, candidates: &[Candidate]) -> Result<bool> {
    let path = path.as_ref();
    if candidates.is_empty() {
        debug!("No candidates, skipping export to {}", path.display());
        return Ok(false);
    }

    let mut writer = csv::Writer::from_path(path)?;
    for candidate in candidates {
        writer.serialize(candidate)?;
    }
    writer.flush()?;

    info!(rows = candidates.len(), "Candidates exported to {}", path.display());
    Ok(true)
}

/// Read a table written by [`write_candidates`]
pub fn read_candidates(path: impl AsRef<Path>) -> Result<Vec<Candidate>> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize()
        .map(|row| {
            let mut candidate: Candidate = row?;
            candidate.restore_score();
            Ok(candidate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::Measurements;
    use crate::models::{Coordinate, ElevationCategory, Park};
    use chrono::NaiveDate;

    fn candidate(name: &str, address: Option<&str>, route: Option<f64>, score: f64) -> Candidate {
        Candidate::new(
            NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            Coordinate::new(40.416_8, -3.703_8),
            &Park::new(name, address.map(str::to_string), Coordinate::new(40.415_3, -3.684_4)),
            Measurements {
                distance_km: 1.634_91,
                route_minutes: route,
                elevation: route.map(|_| 667.0),
                elevation_category: if route.is_some() {
                    ElevationCategory::Moderate
                } else {
                    ElevationCategory::Unknown
                },
                weather_score: 24,
                score,
            },
        )
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.csv");
        assert!(!write_candidates(&path, &[]).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_export_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.csv");
        let rows = vec![
            candidate("Parque del Retiro", Some("Plaza de la Independencia 7"), Some(23.5), 20.02),
            candidate("Casa de Campo", None, None, 22.37),
        ];
        assert!(write_candidates(&path, &rows).unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "day,user_lat,user_lon,name,address,location_lat,location_lon,distance_km,\
             route_minutes,elevation,elevation_category,weather_score,final_score"
        );
        assert!(lines.next().unwrap().contains("Parque del Retiro"));
        assert!(lines.next().unwrap().contains(",,,unknown,24,22.37"));
    }

    #[test]
    fn test_read_back_restores_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.csv");
        let rows = vec![
            candidate("Parque del Retiro", Some("Plaza de la Independencia 7"), Some(23.5), 20.02),
            candidate("Casa de Campo", None, None, 22.37),
        ];
        write_candidates(&path, &rows).unwrap();

        let read = read_candidates(&path).unwrap();
        assert_eq!(read, rows);
        assert_eq!(read[1].raw_score(), 22.37);
        assert_eq!(read[1].address, None);
        assert_eq!(read[1].route_minutes, None);
    }

    #[test]
    fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_candidates(dir.path().join("missing.csv")).is_err());
    }
}
