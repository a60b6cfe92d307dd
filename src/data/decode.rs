/// Text recovered from an upload, plus how much was thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    /// Bytes that were not valid UTF-8 and were skipped.
    pub dropped_bytes: usize,
}

const BOM: char = '\u{feff}';

/// Decode bytes as UTF-8, silently eliding invalid sequences.
///
/// Never fails. A leading byte-order mark is stripped so it cannot leak
/// into the first header name.
pub fn decode(bytes: &[u8]) -> Decoded {
    let mut text = String::with_capacity(bytes.len());
    let mut dropped_bytes = 0;

    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped_bytes += chunk.invalid().len();
    }

    if text.starts_with(BOM) {
        text.replace_range(..BOM.len_utf8(), "");
    }

    if dropped_bytes > 0 {
        log::debug!("Dropped {dropped_bytes} undecodable bytes");
    }

    Decoded {
        text,
        dropped_bytes,
    }
}
