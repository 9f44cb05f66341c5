//! ToUnicode CMap parser for mapping character codes to Unicode strings.
//!
//! Supports `beginbfchar`/`endbfchar` and `beginbfrange`/`endbfrange`
//! sections with UTF-16BE encoded destinations, which covers the CMaps
//! typesetters embed for text extraction.

use std::collections::HashMap;

use crate::error::BackendError;

/// A parsed ToUnicode CMap.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    mappings: HashMap<u32, String>,
}

impl CMap {
    /// Parse a ToUnicode CMap from its raw byte content.
    pub fn parse(data: &[u8]) -> Result<Self, BackendError> {
        let text = String::from_utf8_lossy(data);
        let mut mappings = HashMap::new();

        for section in sections(&text, "beginbfchar", "endbfchar") {
            parse_bfchar_section(section, &mut mappings)?;
        }
        for section in sections(&text, "beginbfrange", "endbfrange") {
            parse_bfrange_section(section, &mut mappings)?;
        }

        Ok(CMap { mappings })
    }

    /// Look up the Unicode string for a character code.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Bodies of every `begin ... end` section, in order.
fn sections<'a>(text: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(begin) {
        let body = &rest[start + begin.len()..];
        let Some(stop) = body.find(end) else {
            break;
        };
        out.push(&body[..stop]);
        rest = &body[stop + end.len()..];
    }
    out
}

/// Each line: `<srcCode> <dstUnicode>`
fn parse_bfchar_section(
    section: &str,
    mappings: &mut HashMap<u32, String>,
) -> Result<(), BackendError> {
    let tokens = extract_hex_tokens(section);
    for pair in tokens.chunks_exact(2) {
        let src = parse_hex_code(pair[0])?;
        mappings.insert(src, decode_utf16be_hex(pair[1])?);
    }
    Ok(())
}

/// Each line: `<srcLow> <srcHigh> <dstStart>` or
/// `<srcLow> <srcHigh> [<dst1> <dst2> ...]`
fn parse_bfrange_section(
    section: &str,
    mappings: &mut HashMap<u32, String>,
) -> Result<(), BackendError> {
    for line in section.lines() {
        let trimmed = line.trim();
        if !trimmed.contains('<') {
            continue;
        }

        if let Some(bracket) = trimmed.find('[') {
            let src = extract_hex_tokens(&trimmed[..bracket]);
            if src.len() < 2 {
                continue;
            }
            let low = parse_hex_code(src[0])?;
            let high = parse_hex_code(src[1])?;
            for (offset, dst) in extract_hex_tokens(&trimmed[bracket..]).iter().enumerate() {
                let code = low + offset as u32;
                if code > high {
                    break;
                }
                mappings.insert(code, decode_utf16be_hex(dst)?);
            }
        } else {
            let tokens = extract_hex_tokens(trimmed);
            if tokens.len() < 3 {
                continue;
            }
            let low = parse_hex_code(tokens[0])?;
            let high = parse_hex_code(tokens[1])?;
            let dst = parse_hex_code(tokens[2])?;
            for offset in 0..=high.saturating_sub(low) {
                if let Some(ch) = char::from_u32(dst + offset) {
                    mappings.insert(low + offset, ch.to_string());
                }
            }
        }
    }
    Ok(())
}

fn parse_hex_code(hex: &str) -> Result<u32, BackendError> {
    u32::from_str_radix(hex, 16)
        .map_err(|e| BackendError::Parse(format!("invalid hex code '{hex}': {e}")))
}

/// Decode UTF-16BE code units written as hex. Two-digit values are treated
/// as a single code unit.
fn decode_utf16be_hex(hex: &str) -> Result<String, BackendError> {
    if hex.len() == 2 {
        return decode_utf16be_hex(&format!("00{hex}"));
    }
    if hex.len() % 4 != 0 {
        return Err(BackendError::Parse(format!(
            "UTF-16BE hex string must have length divisible by 4, got '{hex}'"
        )));
    }
    let units = hex
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            let s = std::str::from_utf8(chunk)
                .map_err(|e| BackendError::Parse(format!("invalid UTF-8 in hex: {e}")))?;
            u16::from_str_radix(s, 16)
                .map_err(|e| BackendError::Parse(format!("invalid hex in UTF-16BE '{s}': {e}")))
        })
        .collect::<Result<Vec<u16>, _>>()?;
    String::from_utf16(&units)
        .map_err(|e| BackendError::Parse(format!("invalid UTF-16BE sequence: {e}")))
}

fn extract_hex_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        let Some(end) = rest[start + 1..].find('>') else {
            break;
        };
        tokens.push(&rest[start + 1..start + 1 + end]);
        rest = &rest[start + 1 + end + 1..];
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cmap_returns_none() {
        let cmap = CMap::parse(b"").unwrap();
        assert!(cmap.is_empty());
        assert_eq!(cmap.lookup(0x41), None);
    }

    #[test]
    fn bfchar_mappings() {
        let data = b"2 beginbfchar\n<0003> <0020>\n<0024> <0041>\nendbfchar\n";
        let cmap = CMap::parse(data).unwrap();
        assert_eq!(cmap.len(), 2);
        assert_eq!(cmap.lookup(0x03), Some(" "));
        assert_eq!(cmap.lookup(0x24), Some("A"));
    }

    #[test]
    fn bfchar_ligature_maps_to_two_chars() {
        let data = b"beginbfchar\n<01> <00660069>\nendbfchar\n";
        let cmap = CMap::parse(data).unwrap();
        assert_eq!(cmap.lookup(0x01), Some("fi"));
    }

    #[test]
    fn bfrange_sequential() {
        let data = b"beginbfrange\n<0041> <0043> <0061>\nendbfrange\n";
        let cmap = CMap::parse(data).unwrap();
        assert_eq!(cmap.lookup(0x41), Some("a"));
        assert_eq!(cmap.lookup(0x43), Some("c"));
        assert_eq!(cmap.lookup(0x44), None);
    }

    #[test]
    fn bfrange_array_form() {
        let data = b"beginbfrange\n<10> <11> [<0058> <0059>]\nendbfrange\n";
        let cmap = CMap::parse(data).unwrap();
        assert_eq!(cmap.lookup(0x10), Some("X"));
        assert_eq!(cmap.lookup(0x11), Some("Y"));
    }

    #[test]
    fn multiple_sections_merge() {
        let data = b"beginbfchar\n<01> <0041>\nendbfchar\nbeginbfchar\n<02> <0042>\nendbfchar\n";
        let cmap = CMap::parse(data).unwrap();
        assert_eq!(cmap.len(), 2);
    }

    #[test]
    fn bad_hex_is_an_error() {
        let data = b"beginbfchar\n<zz> <0041>\nendbfchar\n";
        assert!(CMap::parse(data).is_err());
    }
}
