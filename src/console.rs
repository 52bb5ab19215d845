//! Interactive prompts and the recommendation summary

use std::io::{BufRead, Write};

use chrono::{Days, NaiveDate};

use crate::Result;
use crate::config::OriginConfig;
use crate::error::DataRunError;
use crate::models::{Coordinate, RankingResult};

/// Number of forecast days offered in the menu, today included
pub const FORECAST_DAYS: u32 = 8;

/// Where the user wants to start running from
#[derive(Debug, Clone, PartialEq)]
pub enum OriginChoice {
    /// The configured default origin
    Default,
    Coordinates(Coordinate),
    /// A place name still to be geocoded
    Place(String),
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(DataRunError::validation("No answer given, input closed"));
    }
    Ok(line.trim().to_string())
}

/// Ask for the day as a 1-based menu entry; returns the day offset
pub fn prompt_day_offset<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    today: NaiveDate,
) -> Result<u32> {
    writeln!(output, "📅 Which day do you want to run?")?;
    for entry in 1..=FORECAST_DAYS {
        let date = today
            .checked_add_days(Days::new(u64::from(entry - 1)))
            .unwrap_or(today);
        let label = match entry {
            1 => "today".to_string(),
            2 => "tomorrow".to_string(),
            _ => date.format("%A").to_string(),
        };
        writeln!(output, "  {entry}. {label} ({date})")?;
    }

    loop {
        write!(output, "Choose 1-{FORECAST_DAYS}: ")?;
        output.flush()?;
        let answer = read_answer(input)?;
        match answer.parse::<u32>() {
            Ok(entry) if (1..=FORECAST_DAYS).contains(&entry) => return Ok(entry - 1),
            _ => writeln!(output, "⚠️  '{answer}' is not an option")?,
        }
    }
}

/// Ask whether to use the default origin, otherwise read coordinates or a place name
pub fn prompt_origin<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    default: &OriginConfig,
) -> Result<OriginChoice> {
    write!(
        output,
        "📍 Start from {} ({})? [Y/n] ",
        default.name,
        default.coordinate().format_coordinates()
    )?;
    output.flush()?;
    let answer = read_answer(input)?.to_lowercase();
    if answer.is_empty() || answer == "y" || answer == "yes" {
        return Ok(OriginChoice::Default);
    }

    loop {
        write!(output, "Enter 'latitude, longitude' or a place name: ")?;
        output.flush()?;
        let answer = read_answer(input)?;
        if answer.is_empty() {
            continue;
        }
        if let Some(coordinate) = parse_coordinates(&answer) {
            return Ok(OriginChoice::Coordinates(coordinate));
        }
        return Ok(OriginChoice::Place(answer));
    }
}

/// Parse "lat, lon" (comma or whitespace separated)
#[must_use]
pub fn parse_coordinates(text: &str) -> Option<Coordinate> {
    let mut parts = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let latitude = parts.next()?.parse().ok()?;
    let longitude = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let coordinate = Coordinate::new(latitude, longitude);
    coordinate.is_valid().then_some(coordinate)
}

/// Print the recommendation summary, or why there is none
pub fn print_recommendation<W: Write>(
    output: &mut W,
    result: &RankingResult,
    origin_label: &str,
    max_distance_km: f64,
) -> std::io::Result<()> {
    match &result.best {
        Some(best) => {
            writeln!(output)?;
            writeln!(
                output,
                "🏃 Best park to run from {origin_label} on {}:",
                result.day
            )?;
            writeln!(output, "{best}")?;
            writeln!(
                output,
                "   ({} parks within {max_distance_km} km evaluated)",
                result.candidates.len()
            )?;
        }
        None => {
            writeln!(output)?;
            writeln!(
                output,
                "😕 No parks within {max_distance_km} km of {origin_label}."
            )?;
        }
    }
    Ok(())
}
