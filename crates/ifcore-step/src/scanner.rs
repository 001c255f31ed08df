// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity scanner using SIMD-accelerated byte searching
//!
//! Walks the DATA section statement by statement and records where each
//! entity instance lives, without decoding any attributes.

use ifcore_model::{EntityId, ParseError, Result};
use memchr::{memchr2, memmem};

/// Location of one entity instance in the source text
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEntity<'a> {
    pub id: EntityId,
    /// Type name as written in the file (usually upper case)
    pub type_name: &'a str,
    /// Byte offset of the leading `#`
    pub start: usize,
    /// Byte offset just past the terminating `;`
    pub end: usize,
}

/// Check the exchange-structure signature and locate the DATA section
///
/// Returns the byte offset just past `DATA;`.
pub fn data_section(content: &str) -> Result<usize> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("ISO-10303-21") {
        return Err(ParseError::format("missing ISO-10303-21 signature"));
    }
    memmem::find(content.as_bytes(), b"DATA;")
        .map(|p| p + 5)
        .ok_or_else(|| ParseError::format("no DATA section"))
}

/// Scanner over the entity instances of a DATA section
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a scanner starting at `pos` (see [`data_section`])
    pub fn new(content: &'a str, pos: usize) -> Self {
        Self { content, pos }
    }

    /// Skip whitespace and `/* */` comments
    fn skip_trivia(&mut self) {
        let bytes = self.content.as_bytes();
        loop {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if bytes[self.pos..].starts_with(b"/*") {
                self.pos = memmem::find(&bytes[self.pos + 2..], b"*/")
                    .map(|p| self.pos + 2 + p + 2)
                    .unwrap_or(bytes.len());
                continue;
            }
            return;
        }
    }

    /// Advance past the next `;` that isn't inside a string
    fn skip_statement(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        // A doubled quote toggles twice, so escapes need no special case.
        loop {
            let Some(offset) = memchr2(b'\'', b';', &bytes[self.pos..]) else {
                self.pos = bytes.len();
                return None;
            };
            self.pos += offset;
            let found = bytes[self.pos];
            self.pos += 1;
            if found == b'\'' {
                in_string = !in_string;
            } else if !in_string {
                return Some(self.pos);
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let bytes = self.content.as_bytes();
        let start = self.pos;
        while self.pos < bytes.len() && pred(bytes[self.pos]) {
            self.pos += 1;
        }
        &self.content[start..self.pos]
    }
}

impl<'a> Iterator for EntityScanner<'a> {
    type Item = RawEntity<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.content.as_bytes();

        loop {
            self.skip_trivia();
            if self.pos >= bytes.len() || bytes[self.pos..].starts_with(b"ENDSEC") {
                return None;
            }

            let start = self.pos;
            if bytes[self.pos] != b'#' {
                self.skip_statement()?;
                continue;
            }
            self.pos += 1;

            let digits = self.take_while(|b| b.is_ascii_digit());
            let Ok(id) = digits.parse::<u32>() else {
                self.skip_statement()?;
                continue;
            };

            self.take_while(|b| b == b' ' || b == b'\t');
            if bytes.get(self.pos) != Some(&b'=') {
                self.skip_statement()?;
                continue;
            }
            self.pos += 1;
            self.take_while(|b| b.is_ascii_whitespace());

            let type_name = self.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
            if type_name.is_empty() {
                // Complex instances like #5=(IFCA()IFCB()) carry nothing we read
                log::debug!("skipping complex entity instance #{id}");
                self.skip_statement()?;
                continue;
            }

            let end = self.skip_statement()?;
            return Some(RawEntity {
                id: EntityId(id),
                type_name,
                start,
                end,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
/* units */
#2=IFCUNITASSIGNMENT((#3));
#3 = IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCWALL('guid',$,'Wall; ''north''',$,$,#5,#6,$);
#7=(IFCLENGTHMEASURE(1.)IFCNAMEDUNIT(*,.LENGTHUNIT.));
ENDSEC;
END-ISO-10303-21;
"#;

    fn scan(content: &str) -> Vec<RawEntity<'_>> {
        let start = data_section(content).unwrap();
        EntityScanner::new(content, start).collect()
    }

    #[test]
    fn test_scanner_finds_entities() {
        let entities = scan(TEST_IFC);
        let ids: Vec<u32> = entities.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(entities[0].type_name, "IFCPROJECT");
        assert_eq!(entities[2].type_name, "IFCSIUNIT");
    }

    #[test]
    fn test_semicolon_inside_string() {
        let entities = scan(TEST_IFC);
        let wall = &entities[3];
        let text = &TEST_IFC[wall.start..wall.end];
        assert!(text.starts_with("#4=IFCWALL("));
        assert!(text.ends_with(",$);"));
    }

    #[test]
    fn test_signature_required() {
        assert!(data_section("HEADER;\nDATA;\nENDSEC;").is_err());
        assert!(data_section("ISO-10303-21;\nHEADER;\nENDSEC;").is_err());
        assert!(data_section("\u{feff}ISO-10303-21;\nDATA;\n").is_ok());
    }

    #[test]
    fn test_truncated_file_stops_cleanly() {
        let content = "ISO-10303-21;\nDATA;\n#1=IFCWALL('a',$);\n#2=IFCWALL('b'";
        let entities = scan(content);
        assert_eq!(entities.len(), 1);
    }
}
