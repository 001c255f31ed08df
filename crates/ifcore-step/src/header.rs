// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HEADER section parsing

use crate::entity::AttributeValue;
use crate::tokenizer::parse_arguments;
use ifcore_model::{ModelMetadata, ParseError, Result};

/// Extract model metadata from the HEADER section
///
/// `FILE_SCHEMA` is required; the descriptive records are optional and
/// missing or `$` fields come back as `None`.
pub fn parse_header(content: &str) -> Result<ModelMetadata> {
    let start = content
        .find("HEADER;")
        .ok_or_else(|| ParseError::InvalidHeader("no HEADER section".into()))?;
    let header = &content[start..];
    let header = &header[..header.find("ENDSEC;").unwrap_or(header.len())];

    let schema = record(header, "FILE_SCHEMA")
        .and_then(|args| first_text(args.first()?))
        .ok_or_else(|| ParseError::InvalidHeader("missing FILE_SCHEMA".into()))?;

    let mut metadata = ModelMetadata {
        schema_version: schema.to_ascii_uppercase(),
        ..ModelMetadata::default()
    };

    if let Some(args) = record(header, "FILE_DESCRIPTION") {
        metadata.file_description = args.first().and_then(first_text);
    }

    // FILE_NAME(name, time_stamp, (author), (organization), preprocessor, originating_system, authorization)
    if let Some(args) = record(header, "FILE_NAME") {
        let text = |i: usize| args.get(i).and_then(first_text);
        metadata.file_name = text(0);
        metadata.timestamp = text(1);
        metadata.author = text(2);
        metadata.organization = text(3);
        metadata.preprocessor_version = text(4);
        metadata.originating_system = text(5);
    }

    Ok(metadata)
}

/// Arguments of the header record named `keyword`
fn record(header: &str, keyword: &str) -> Option<Vec<AttributeValue>> {
    let mut from = 0;
    while let Some(pos) = header[from..].find(keyword) {
        let after = &header[from + pos + keyword.len()..];
        if after.trim_start().starts_with('(') {
            return parse_arguments(after);
        }
        from += pos + keyword.len();
    }
    None
}

/// First non-empty string in a value or list of values
fn first_text(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        AttributeValue::List(items) => items.iter().find_map(first_text),
        _ => None,
    }
}
