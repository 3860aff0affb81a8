//! Reader for the plain-text network description format
//!
//! One directed segment per line as `x1,y1,x2,y2`; whitespace around the
//! commas and blank lines are ignored.

use std::fs;
use std::path::Path;

use super::types::{Node, Segment};
use crate::error::{Error, Result};

/// Parses a network description into segments
pub fn parse_segments(input: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let segment = parse_line(trimmed).ok_or_else(|| Error::Parse {
            line: index + 1,
            content: trimmed.to_string(),
        })?;
        segments.push(segment);
    }
    Ok(segments)
}

fn parse_line(line: &str) -> Option<Segment> {
    let values = line
        .split(',')
        .map(|field| field.trim().parse::<i64>().ok())
        .collect::<Option<Vec<_>>>()?;
    match values.as_slice() {
        [x1, y1, x2, y2] => Some(Segment::new(Node::new(*x1, *y1), Node::new(*x2, *y2))),
        _ => None,
    }
}

/// Reads and parses a network description file
pub fn load_segments(path: impl AsRef<Path>) -> Result<Vec<Segment>> {
    let contents = fs::read_to_string(path)?;
    parse_segments(&contents)
}
