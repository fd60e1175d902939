//! Parser for line-oriented rating input.
//!
//! The input has two sections:
//! - training: `userId itemId rating` per line
//! - queries: `userId itemId` per line
//!
//! A line reading `test dataset` separates them. Fields are separated by
//! any whitespace; fields past the ones a section needs are ignored.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::io::BufRead;
use std::str::FromStr;

/// Line that ends the training section
pub const TRAINING_SENTINEL: &str = "test dataset";

/// Everything read from one input stream
#[derive(Debug, Default, Clone)]
pub struct ParsedInput {
    pub ratings: Vec<Rating>,
    pub queries: Vec<Query>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Training,
    Queries,
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Section::Training => "training",
            Section::Queries => "queries",
        }
    }
}

/// Parse a whole input stream using the default sentinel
pub fn parse_input<R: BufRead>(reader: R) -> Result<ParsedInput> {
    parse_input_with_sentinel(reader, TRAINING_SENTINEL)
}

/// Parse a whole input stream, switching to queries at `sentinel`.
///
/// Without a sentinel line every line is training data.
pub fn parse_input_with_sentinel<R: BufRead>(reader: R, sentinel: &str) -> Result<ParsedInput> {
    let mut parsed = ParsedInput::default();
    let mut section = Section::Training;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }

        match section {
            Section::Training if line_trimmed == sentinel => section = Section::Queries,
            Section::Training => parsed.ratings.push(parse_rating_line(line_trimmed, line_no)?),
            Section::Queries => parsed.queries.push(parse_query_line(line_trimmed, line_no)?),
        }
    }

    Ok(parsed)
}

/// Parse one training line: `userId itemId rating`
pub fn parse_rating_line(line: &str, line_no: usize) -> Result<Rating> {
    let fields = split_fields(line, 3, line_no)?;

    let rating: f64 = parse_field(fields[2], "rating", Section::Training, line_no)?;
    if !rating.is_finite() {
        return Err(DataLoadError::InvalidValue {
            field: "rating".to_string(),
            value: fields[2].to_string(),
            line: line_no,
        });
    }

    Ok(Rating {
        user_id: parse_field(fields[0], "userId", Section::Training, line_no)?,
        item_id: parse_field(fields[1], "itemId", Section::Training, line_no)?,
        rating,
    })
}

/// Parse one query line: `userId itemId`
pub fn parse_query_line(line: &str, line_no: usize) -> Result<Query> {
    let fields = split_fields(line, 2, line_no)?;

    Ok(Query {
        user_id: parse_field(fields[0], "userId", Section::Queries, line_no)?,
        item_id: parse_field(fields[1], "itemId", Section::Queries, line_no)?,
    })
}

fn split_fields(line: &str, expected: usize, line_no: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < expected {
        return Err(DataLoadError::FieldCountMismatch {
            expected,
            found: fields.len(),
            line: line_no,
        });
    }
    Ok(fields)
}

fn parse_field<T>(raw: &str, field: &str, section: Section, line_no: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| DataLoadError::ParseError {
        section: section.name().to_string(),
        line: line_no,
        reason: format!("Invalid {}: {}", field, e),
    })
}
