// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity scanner using memchr byte searching
//!
//! Finds entity instance boundaries in the DATA section without decoding
//! attributes, so the model can index a large file cheaply and decode only
//! the entities the extractor actually touches.

use crate::tokenizer::parse_header_record;
use floorplan_model::{AttributeValue, ModelMetadata};
use memchr::{memchr, memchr2};

/// One entity instance located in the file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScannedEntity<'a> {
    pub id: u32,
    pub type_name: &'a str,
    /// Byte offset of the leading `#`
    pub start: usize,
    /// Byte offset just past the terminating `;`
    pub end: usize,
}

/// Sequential scanner over the DATA section
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    pub fn new(content: &'a str) -> Self {
        let pos = content.find("DATA;").map(|p| p + 5).unwrap_or(0);
        Self { content, pos }
    }

    /// Advance to the next entity instance
    pub fn next_entity(&mut self) -> Option<ScannedEntity<'a>> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            self.pos += memchr(b'#', &bytes[self.pos..])?;

            // Instance names start a record; references inside attributes do not
            let at_record_start = self.pos == 0
                || matches!(bytes[self.pos - 1], b'\n' | b'\r' | b';' | b' ' | b'\t');
            let start = self.pos;
            self.pos += 1;
            if !at_record_start {
                continue;
            }

            let id_start = self.pos;
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            let Ok(id) = self.content[id_start..self.pos].parse::<u32>() else {
                continue;
            };

            self.skip_blanks();
            if bytes.get(self.pos) != Some(&b'=') {
                continue;
            }
            self.pos += 1;
            self.skip_blanks();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
            if self.pos == type_start {
                continue;
            }
            let type_name = &self.content[type_start..self.pos];

            let end = self.find_record_end()?;
            return Some(ScannedEntity {
                id,
                type_name,
                start,
                end,
            });
        }

        None
    }

    fn skip_blanks(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Find the terminating semicolon, skipping quoted strings
    fn find_record_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            if in_string {
                // Jump to the next quote; '' is an escaped quote
                self.pos += memchr(b'\'', &bytes[self.pos..])?;
                if bytes.get(self.pos + 1) == Some(&b'\'') {
                    self.pos += 2;
                    continue;
                }
                in_string = false;
                self.pos += 1;
                continue;
            }

            self.pos += memchr2(b'\'', b';', &bytes[self.pos..])?;
            if bytes[self.pos] == b';' {
                self.pos += 1;
                return Some(self.pos);
            }
            in_string = true;
            self.pos += 1;
        }

        None
    }
}

impl<'a> Iterator for EntityScanner<'a> {
    type Item = ScannedEntity<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entity()
    }
}

/// Read FILE_NAME and FILE_SCHEMA from the HEADER section
pub fn parse_header(content: &str) -> ModelMetadata {
    let mut meta = ModelMetadata::default();

    let Some(header_start) = content.find("HEADER;") else {
        return meta;
    };
    let header_end = content[header_start..]
        .find("ENDSEC;")
        .map(|p| header_start + p)
        .unwrap_or(content.len());
    let header = &content[header_start + 7..header_end];

    for record in header.split_inclusive(';') {
        let Some((name, args)) = parse_header_record(record) else {
            continue;
        };
        match name.to_ascii_uppercase().as_str() {
            "FILE_SCHEMA" => {
                if let Some(schema) = args
                    .first()
                    .and_then(|v| v.as_list())
                    .and_then(|l| l.first())
                    .and_then(AttributeValue::as_string)
                {
                    meta.schema_version = schema.to_string();
                }
            }
            "FILE_NAME" => {
                let text = |i: usize| {
                    args.get(i)
                        .and_then(AttributeValue::as_string)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                };
                meta.file_name = text(0);
                meta.timestamp = text(1);
                meta.originating_system = text(5);
            }
            _ => {}
        }
    }

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('plan.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','Revit','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project;1',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
  #3 = IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4=IFCBUILDINGSTOREY('g''uid',$,'Plan 1',$,$,#5,$,$,.ELEMENT.,3000.);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_entities() {
        let found: Vec<_> = EntityScanner::new(TEST_IFC)
            .map(|e| (e.id, e.type_name))
            .collect();
        assert_eq!(
            found,
            vec![
                (1, "IFCPROJECT"),
                (2, "IFCUNITASSIGNMENT"),
                (3, "IFCSIUNIT"),
                (4, "IFCBUILDINGSTOREY"),
            ]
        );
    }

    #[test]
    fn test_semicolon_inside_string_does_not_end_record() {
        let first = EntityScanner::new(TEST_IFC).next().unwrap();
        assert!(TEST_IFC[first.start..first.end].ends_with("#2);"));
    }

    #[test]
    fn test_parse_header() {
        let meta = parse_header(TEST_IFC);
        assert_eq!(meta.schema_version, "IFC4");
        assert_eq!(meta.file_name.as_deref(), Some("plan.ifc"));
        assert_eq!(meta.originating_system.as_deref(), Some("Revit"));
    }
}
