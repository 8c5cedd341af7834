/// Maximum number of body lines on a text card.
pub const MAX_BODY_LINES: usize = 5;

const ELLIPSIS: char = '…';

/// Escape text for embedding in SVG/XML character data and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() && c != '\n' && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

/// Characters per line for a panel of `inner_width` px at `font_size` px, assuming glyphs
/// average `0.6 * font_size`.
pub fn max_chars_per_line(inner_width: f64, font_size: f64) -> usize {
    if !(inner_width.is_finite() && font_size.is_finite()) || font_size <= 0.0 {
        return 1;
    }
    // Scaled by ten so exact boundaries do not lose a character to rounding in `0.6`.
    (((inner_width * 10.0) / (font_size * 6.0)).floor() as usize).max(1)
}

/// Greedy word wrap into at most `max_lines` lines of at most `max_chars` characters.
///
/// Words longer than a line are split. When the text does not fit, the last line is cut and
/// ends with `…`.
pub fn wrap_lines(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        loop {
            let sep = usize::from(current_len > 0);
            if current_len + sep + word.len() <= max_chars {
                if sep == 1 {
                    current.push(' ');
                }
                current.extend(word.iter());
                current_len += sep + word.len();
                break;
            }
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            // Word alone exceeds a line: hard split.
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
            if word.is_empty() {
                break;
            }
        }
    }
    if current_len > 0 {
        lines.push(current);
    }

    if lines.len() <= max_lines {
        return lines;
    }

    lines.truncate(max_lines);
    if let Some(last) = lines.last_mut() {
        let keep: String = last.chars().take(max_chars.saturating_sub(1)).collect();
        *last = format!("{}{ELLIPSIS}", keep.trim_end());
    }
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
