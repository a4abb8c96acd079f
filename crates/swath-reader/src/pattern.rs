//! Filename templates.
//!
//! File patterns in reader configurations are templates such as
//! `SVM05_{platform}_d{start_time:%Y%m%d_t%H%M%S}_e{end_time:%H%M%S}.h5`.
//! A template can be turned into a glob (fields become wildcards, or fixed
//! values when the caller knows them) and can parse a filename back into
//! typed field values.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::num::IntErrorKind;
use std::path::Path;

use crate::error::{ReaderError, Result};

/// A parsed filename template.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePattern {
    template: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    name: String,
    format: FieldFormat,
}

#[derive(Debug, Clone, PartialEq)]
enum FieldFormat {
    Text { width: Option<usize> },
    Int { width: Option<usize> },
    Time { format: String, width: usize },
}

impl FieldFormat {
    fn parse(spec: &str) -> Result<Self> {
        if spec.is_empty() {
            return Ok(FieldFormat::Text { width: None });
        }
        if spec.contains('%') {
            return Ok(FieldFormat::Time {
                format: spec.to_string(),
                width: strftime_width(spec)?,
            });
        }

        let (idx, kind) = spec.char_indices().last().unwrap_or((0, 's'));
        let digits = &spec[..idx];
        let width = if digits.is_empty() {
            None
        } else {
            Some(
                digits
                    .trim_start_matches('0')
                    .parse::<usize>()
                    .map_err(|_| ReaderError::config(format!("Invalid field width in '{{:{}}}'", spec)))?,
            )
        };
        match kind {
            'd' => Ok(FieldFormat::Int { width }),
            's' => Ok(FieldFormat::Text { width }),
            _ => Err(ReaderError::config(format!(
                "Unsupported field format '{}'",
                spec
            ))),
        }
    }

    fn width(&self) -> Option<usize> {
        match self {
            FieldFormat::Text { width } | FieldFormat::Int { width } => *width,
            FieldFormat::Time { width, .. } => Some(*width),
        }
    }
}

/// Number of characters a strftime format produces.
fn strftime_width(format: &str) -> Result<usize> {
    let mut width = 0;
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            width += 1;
            continue;
        }
        width += match chars.next() {
            Some('Y') => 4,
            Some('j') => 3,
            Some('b') => 3,
            Some('f') => 6,
            Some('y' | 'm' | 'd' | 'H' | 'M' | 'S') => 2,
            Some('%') => 1,
            other => {
                return Err(ReaderError::config(format!(
                    "Unsupported time directive '%{}' in '{}'",
                    other.map(String::from).unwrap_or_default(),
                    format
                )))
            }
        };
    }
    Ok(width)
}

impl FilePattern {
    /// Parse a template.
    pub fn new(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            match c {
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => body.push(ch),
                            None => {
                                return Err(ReaderError::config(format!(
                                    "Unclosed field in file pattern '{}'",
                                    template
                                )))
                            }
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let (name, spec) = body.split_once(':').unwrap_or((body.as_str(), ""));
                    if name.is_empty() {
                        return Err(ReaderError::config(format!(
                            "Unnamed field in file pattern '{}'",
                            template
                        )));
                    }
                    segments.push(Segment::Field(Field {
                        name: name.to_string(),
                        format: FieldFormat::parse(spec)?,
                    }));
                }
                '}' => {
                    return Err(ReaderError::config(format!(
                        "Unbalanced '}}' in file pattern '{}'",
                        template
                    )))
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names of all fields, in template order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(f) => Some(f.name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Glob for the whole template. Fields with a known value are filled in,
    /// fixed-width fields become `?` runs and the rest `*`.
    pub fn globify(&self, known: &HashMap<String, String>) -> String {
        let mut glob = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => glob.push_str(&glob::Pattern::escape(text)),
                Segment::Field(field) => match known.get(&field.name) {
                    Some(value) => glob.push_str(&glob::Pattern::escape(value)),
                    None => match field.format.width() {
                        Some(width) => glob.push_str(&"?".repeat(width)),
                        None => glob.push('*'),
                    },
                },
            }
        }
        glob
    }

    /// Compiled glob for the last path component of the template.
    pub fn base_name_glob(&self) -> Result<glob::Pattern> {
        let full = self.globify(&HashMap::new());
        let base = Path::new(&full)
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(full);
        Ok(glob::Pattern::new(&base)?)
    }

    /// Check whether the base name of `filename` fits the template's base name.
    pub fn matches_base_name(&self, filename: &str) -> Result<bool> {
        let base = base_name(filename);
        Ok(self.base_name_glob()?.matches(base))
    }

    /// Parse the base name of `filename` into field values.
    ///
    /// Returns `None` when the name doesn't follow the template.
    pub fn parse(&self, filename: &str) -> Option<FilenameFields> {
        let input = base_name(filename);
        let segments = self.base_name_segments();
        let mut fields = BTreeMap::new();
        let mut pos = 0;

        for (index, segment) in segments.iter().enumerate() {
            let rest = input.get(pos..)?;
            match segment {
                Segment::Literal(text) => {
                    if !rest.starts_with(text.as_str()) {
                        return None;
                    }
                    pos += text.len();
                }
                Segment::Field(field) => {
                    let raw = match field.format.width() {
                        Some(width) => rest.get(..width)?,
                        None => match segments.get(index + 1) {
                            Some(Segment::Literal(next)) => &rest[..rest.find(next.as_str())?],
                            Some(Segment::Field(_)) => return None,
                            None => rest,
                        },
                    };
                    pos += raw.len();
                    fields.insert(field.name.clone(), FieldValue::parse(raw, &field.format)?);
                }
            }
        }

        if pos == input.len() {
            Some(FilenameFields(fields))
        } else {
            None
        }
    }

    /// Segments after the last path separator of the template.
    fn base_name_segments(&self) -> Vec<Segment> {
        let mut out = Vec::new();
        for segment in self.segments.iter().rev() {
            match segment {
                Segment::Literal(text) => {
                    if let Some(idx) = text.rfind(['/', '\\']) {
                        let tail = &text[idx + 1..];
                        if !tail.is_empty() {
                            out.push(Segment::Literal(tail.to_string()));
                        }
                        break;
                    }
                    out.push(segment.clone());
                }
                Segment::Field(_) => out.push(segment.clone()),
            }
        }
        out.reverse();
        out
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Last path component of `filename`.
pub fn base_name(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

/// A typed value parsed out of a filename.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Time(NaiveDateTime),
}

impl FieldValue {
    fn parse(raw: &str, format: &FieldFormat) -> Option<Self> {
        match format {
            FieldFormat::Text { .. } => Some(FieldValue::Text(raw.to_string())),
            FieldFormat::Int { .. } => {
                let raw = raw.trim();
                match raw.parse::<i64>() {
                    Ok(value) => Some(FieldValue::Int(value)),
                    // Too wide for an i64, e.g. 20-digit creation stamps.
                    Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
                        Some(FieldValue::Text(raw.to_string()))
                    }
                    Err(_) => None,
                }
            }
            FieldFormat::Time { format, .. } => parse_time(raw, format).map(FieldValue::Time),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Time(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// Parse a time field. Formats without a date part land on 1900-01-01, like
/// `strptime`, and are completed by [`FilenameFields::end_time`].
fn parse_time(raw: &str, format: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(dt);
    }
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    if let Ok(t) = NaiveTime::parse_from_str(raw, format) {
        return Some(epoch.and_time(t));
    }
    NaiveDate::parse_from_str(raw, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Field values parsed from one filename.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilenameFields(BTreeMap<String, FieldValue>);

impl FilenameFields {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> + '_ {
        self.0.iter()
    }

    /// Observation start: `start_time`, falling back to `nominal_time`.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.get("start_time")
            .or_else(|| self.get("nominal_time"))
            .and_then(FieldValue::as_time)
            .map(|t| Utc.from_utc_datetime(&t))
    }

    /// Observation end.
    ///
    /// End times that carry only a clock time take the start date, rolling
    /// over to the next day when the clock time is earlier than the start's.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        let end = self.get("end_time").and_then(FieldValue::as_time)?;
        let start = match self.start_time() {
            Some(start) => start.naive_utc(),
            None => return Some(Utc.from_utc_datetime(&end)),
        };
        if start <= end {
            return Some(Utc.from_utc_datetime(&end));
        }

        let mut date = start.date();
        if end.time() < start.time() {
            date += Duration::days(1);
        }
        Some(Utc.from_utc_datetime(&date.and_time(end.time())))
    }
}
