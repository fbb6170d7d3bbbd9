//! Inline source maps
//!
//! Target code carries a version 3 source map in a trailing
//! `//# sourceMappingURL=data:...;base64,` comment. Segments are encoded as
//! base64 VLQ like any other source map; `x_sourceHash` records the SHA-256
//! of the source text so a consumer can tell whether the map belongs to the
//! source it holds.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Location;

/// Prefix of the trailing map comment
pub const MAP_COMMENT_PREFIX: &str = "//# sourceMappingURL=data:application/json;charset=utf-8;base64,";

/// Name recorded for the single source
pub const SOURCE_NAME: &str = "source.js";

/// One generated position and the source position it came from (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: usize,
    pub generated_col: usize,
    pub source_line: usize,
    pub source_col: usize,
}

/// Decoded source map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    pub version: u32,
    pub sources: Vec<String>,
    #[serde(rename = "sourcesContent")]
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
    #[serde(rename = "x_sourceHash")]
    pub source_hash: String,
}

impl SourceMap {
    /// Build a map for `source` from mappings in generated order
    pub fn new(source: &str, mappings: &[Mapping]) -> Self {
        Self {
            version: 3,
            sources: vec![SOURCE_NAME.to_string()],
            sources_content: vec![source.to_string()],
            names: vec![],
            mappings: encode_mappings(mappings),
            source_hash: source_hash(source),
        }
    }

    /// True when this map was produced from exactly `source`
    pub fn matches(&self, source: &str) -> bool {
        self.source_hash == source_hash(source)
    }

    /// Render as the trailing comment line
    pub fn to_comment(&self) -> String {
        // Serializing a struct of strings cannot fail
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{}{}", MAP_COMMENT_PREFIX, STANDARD.encode(json))
    }

    /// Parse the trailing comment of some target code, if present
    pub fn from_code(code: &str) -> Option<Self> {
        let line = code.lines().rev().find(|l| !l.trim().is_empty())?;
        let encoded = line.trim().strip_prefix(MAP_COMMENT_PREFIX)?;
        let bytes = STANDARD.decode(encoded).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn decoded(&self) -> Vec<Mapping> {
        decode_mappings(&self.mappings)
    }

    /// Map a generated position (0-indexed) back to a 1-based source location
    ///
    /// Picks the closest segment at or before the column on the same line,
    /// falling back to the first segment of the line.
    pub fn lookup(&self, line: usize, col: usize) -> Option<Location> {
        let on_line: Vec<Mapping> = self
            .decoded()
            .into_iter()
            .filter(|m| m.generated_line == line)
            .collect();

        let best = on_line
            .iter()
            .filter(|m| m.generated_col <= col)
            .max_by_key(|m| m.generated_col)
            .or_else(|| on_line.first())?;

        Some(Location::new(best.source_line + 1, best.source_col + 1))
    }
}

/// Hex SHA-256 of the source text
pub fn source_hash(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/* ===================== VLQ ===================== */

const BASE64_CHARS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    loop {
        let mut digit = vlq & 0b11111;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_CHARS[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn decode_vlq_segment(segment: &str) -> Option<Vec<i64>> {
    let mut values = Vec::new();
    let mut value: i64 = 0;
    let mut shift = 0;
    for byte in segment.bytes() {
        let digit = BASE64_CHARS.iter().position(|&c| c == byte)? as i64;
        value += (digit & 0b11111) << shift;
        if digit & 0b100000 != 0 {
            shift += 5;
        } else {
            let negative = value & 1 == 1;
            let magnitude = value >> 1;
            values.push(if negative { -magnitude } else { magnitude });
            value = 0;
            shift = 0;
        }
    }
    Some(values)
}

/// Encode mappings (sorted by generated position) as a `mappings` string
pub fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let mut line = 0;
    let mut prev_gen_col = 0i64;
    let mut prev_src_line = 0i64;
    let mut prev_src_col = 0i64;
    let mut first_on_line = true;

    for m in mappings {
        while line < m.generated_line {
            out.push(';');
            line += 1;
            prev_gen_col = 0;
            first_on_line = true;
        }
        if !first_on_line {
            out.push(',');
        }
        first_on_line = false;

        encode_vlq(m.generated_col as i64 - prev_gen_col, &mut out);
        // Single source: index delta is always 0
        encode_vlq(0, &mut out);
        encode_vlq(m.source_line as i64 - prev_src_line, &mut out);
        encode_vlq(m.source_col as i64 - prev_src_col, &mut out);

        prev_gen_col = m.generated_col as i64;
        prev_src_line = m.source_line as i64;
        prev_src_col = m.source_col as i64;
    }
    out
}

/// Decode a `mappings` string; malformed segments are skipped
pub fn decode_mappings(mappings: &str) -> Vec<Mapping> {
    let mut result = Vec::new();
    let mut src_line = 0i64;
    let mut src_col = 0i64;

    for (generated_line, line) in mappings.split(';').enumerate() {
        let mut gen_col = 0i64;
        for segment in line.split(',').filter(|s| !s.is_empty()) {
            let Some(fields) = decode_vlq_segment(segment) else {
                continue;
            };
            gen_col += fields[0];
            if fields.len() >= 4 {
                src_line += fields[2];
                src_col += fields[3];
                result.push(Mapping {
                    generated_line,
                    generated_col: gen_col.max(0) as usize,
                    source_line: src_line.max(0) as usize,
                    source_col: src_col.max(0) as usize,
                });
            }
        }
    }
    result
}
