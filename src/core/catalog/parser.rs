//! Parser for the enumeration utility's text output.
//!
//! Output shape: a banner line, then blank-line-separated records of
//! five `label: value` lines in a fixed order (published name, provider,
//! class, date+version, signer). Labels are locale-dependent, so they
//! are ignored entirely; only position assigns meaning. Long values wrap
//! onto the following line, which the parser repairs.

use regex::Regex;
use tracing::debug;

use super::{dates, DriverCatalog, DriverRecord, DriverVersion};
use crate::error::ParseError;

/// First non-blank line the utility is expected to print
const UTILITY_BANNER: &str = "Microsoft PnP Utility";

/// Fields per record, in order: published name, provider, class,
/// date+version, signer. A sixth labelled line means the output format
/// is not the one we understand.
const FIELD_COUNT: usize = 5;

/// A record with its fields assigned but its date not yet resolved
struct RawRecord {
    published_name: String,
    provider: String,
    class_name: String,
    raw_date: String,
    raw_version: String,
    version: DriverVersion,
    signer: String,
}

/// Parse the full captured output of the driver enumeration command
/// into a catalog.
///
/// Fails on an unrecognized banner, on any record that does not fit the
/// positional schema, and when no single date convention parses every
/// record (see [`dates::resolve_date_format`]).
pub fn parse_enumeration(output: &str) -> Result<DriverCatalog, ParseError> {
    let mut lines = output.lines();

    let banner = loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => break line.trim(),
            None => break "",
        }
    };
    if banner != UTILITY_BANNER {
        return Err(ParseError::UnexpectedOutputHeader {
            first_line: banner.to_string(),
        });
    }

    let digit_runs = Regex::new(r"\d+").unwrap();

    let mut raw_records = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            if !block.is_empty() {
                raw_records.push(parse_record(&block, &digit_runs)?);
                block.clear();
            }
            continue;
        }
        block.push(line);
    }
    if !block.is_empty() {
        raw_records.push(parse_record(&block, &digit_runs)?);
    }

    let samples: Vec<&str> = raw_records.iter().map(|r| r.raw_date.as_str()).collect();
    let format = dates::resolve_date_format(&samples)?;
    debug!(%format, records = raw_records.len(), "resolved enumeration date format");

    let mut catalog = DriverCatalog::new();
    for raw in raw_records {
        let date = format
            .parse(&raw.raw_date)
            .ok_or_else(|| ParseError::MalformedRecord {
                line: raw.raw_date.clone(),
                context: format!("date does not parse as {format}"),
            })?;
        catalog.insert(DriverRecord {
            published_name: raw.published_name,
            provider: raw.provider,
            class_name: raw.class_name,
            signer: raw.signer,
            raw_date: raw.raw_date,
            raw_version: raw.raw_version,
            version: raw.version,
            date,
        });
    }
    Ok(catalog)
}

/// Fold one blank-line-delimited block of lines into a record.
fn parse_record(lines: &[&str], digit_runs: &Regex) -> Result<RawRecord, ParseError> {
    let mut fields: [String; FIELD_COUNT] = Default::default();
    let mut cursor = 0;
    let mut continuation = false;

    for line in lines {
        let text = line.trim();
        if continuation {
            // Previous line's value was blank: this whole line is the
            // wrapped value, colons and all.
            fields[cursor - 1].push_str(text);
            continuation = false;
            continue;
        }
        if cursor == FIELD_COUNT {
            return Err(ParseError::MalformedRecord {
                line: (*line).to_string(),
                context: format!("more than {FIELD_COUNT} fields in one record"),
            });
        }
        let Some((_label, value)) = text.split_once(':') else {
            return Err(ParseError::MalformedRecord {
                line: (*line).to_string(),
                context: "expected a \"label: value\" line".to_string(),
            });
        };
        let value = value.trim();
        if value.is_empty() {
            continuation = true;
        }
        fields[cursor] = value.to_string();
        cursor += 1;
    }

    if cursor < FIELD_COUNT {
        return Err(ParseError::MalformedRecord {
            line: lines.first().copied().unwrap_or_default().trim().to_string(),
            context: format!("record ended after {cursor} of {FIELD_COUNT} fields"),
        });
    }

    let [published_name, provider, class_name, date_and_version, signer] = fields;

    let mut parts = date_and_version.split_whitespace();
    let (Some(raw_date), Some(raw_version), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::MalformedRecord {
            line: date_and_version.clone(),
            context: "expected a \"<date> <version>\" pair".to_string(),
        });
    };

    let version = DriverVersion::new(
        digit_runs
            .find_iter(raw_version)
            .map(|m| m.as_str().parse::<u32>().unwrap_or(u32::MAX))
            .collect(),
    );

    Ok(RawRecord {
        published_name,
        provider,
        class_name,
        raw_date: raw_date.to_string(),
        raw_version: raw_version.to_string(),
        version,
        signer,
    })
}
