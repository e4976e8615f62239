//! Helvetica metrics, WinAnsi encoding and greedy line wrapping.

/// Advance widths (1/1000 em) of Helvetica for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

const DEFAULT_WIDTH: u16 = 556;

fn glyph_width(c: char) -> u16 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        HELVETICA_WIDTHS[(code - 32) as usize]
    } else {
        DEFAULT_WIDTH
    }
}

/// Width of `text` in points when set in Helvetica at `font_size`.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c))).sum();
    units as f32 * font_size / 1000.0
}

/// Greedy word wrap. Words longer than `max_width` are hard-broken by character.
/// A single glyph wider than `max_width` still gets a line of its own.
pub fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, font_size) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = hard_break(word, font_size, max_width);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

fn hard_break(word: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if text_width(&current, font_size) > max_width && current.chars().count() > 1 {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Largest size not above `preferred` (and not below `minimum`) at which `text` fits `width`.
pub fn fit_font_size(text: &str, preferred: f32, minimum: f32, width: f32) -> f32 {
    let natural = text_width(text, preferred);
    if natural <= width || natural <= f32::EPSILON {
        return preferred;
    }
    (preferred * width / natural).max(minimum)
}

/// Encodes text as WinAnsi bytes; unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '\u{20ac}' => 0x80,
            '\u{201a}' => 0x82,
            '\u{201e}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}

/// Wraps WinAnsi bytes in a PDF literal string, escaping delimiters.
pub fn pdf_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(*byte);
            }
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\n' => out.extend_from_slice(b"\\n"),
            _ => out.push(*byte),
        }
    }
    out.push(b')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measures_helvetica_widths() {
        assert!((text_width("A", 10.0) - 6.67).abs() < 0.001);
        assert!((text_width("i", 1000.0) - 222.0).abs() < 0.001);
        assert!((text_width("\u{e9}", 1000.0) - 556.0).abs() < 0.001);
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("the quick brown fox jumps", 10.0, 60.0);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn hard_breaks_long_words() {
        let lines = wrap_text("1HGCM82633A004352", 10.0, 30.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "1HGCM82633A004352");
        for line in &lines {
            assert!(text_width(line, 10.0) <= 30.0, "line {line:?} too wide");
        }
    }

    #[test]
    fn keeps_explicit_paragraph_breaks() {
        let lines = wrap_text("first\n\nsecond", 10.0, 500.0);
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn fits_font_size_down_to_minimum() {
        assert_eq!(fit_font_size("short", 10.0, 6.0, 200.0), 10.0);
        let shrunk = fit_font_size("a fairly long purchaser name", 10.0, 6.0, 100.0);
        assert!(shrunk < 10.0 && shrunk >= 6.0);
        assert_eq!(fit_font_size(&"W".repeat(80), 10.0, 6.0, 50.0), 6.0);
    }

    #[test]
    fn escapes_literals_and_encodes_win_ansi() {
        assert_eq!(pdf_literal(b"a(b)c\\"), b"(a\\(b\\)c\\\\)".to_vec());
        assert_eq!(encode_win_ansi("Jos\u{e9} \u{2014} \u{4e2d}"), vec![
            b'J', b'o', b's', 0xe9, b' ', 0x97, b' ', b'?'
        ]);
    }
}
