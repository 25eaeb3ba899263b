use unicode_width::UnicodeWidthStr;

/// Widest a rendered column may get before values are truncated.
pub(crate) const MAX_COLUMN_WIDTH: usize = 24;

/// Truncate a string to fit within `width` display columns, adding ".." if truncated.
/// Uses Unicode display width so CJK/emoji alignment stays correct.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s.chars().take(width).collect();
    }

    // Stop at width - 2 to leave room for ".."
    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

fn pad_right(s: &str, width: usize) -> String {
    let sw = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(sw)))
}

/// Render a header row, a rule, and the body rows as aligned text.
///
/// Rows shorter than the header are padded with blanks.
pub(crate) fn grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(h.as_str())).collect();
    for row in rows {
        for (i, value) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(UnicodeWidthStr::width(value.as_str()));
        }
    }
    for w in &mut widths {
        *w = (*w).min(MAX_COLUMN_WIDTH);
    }

    let mut out = String::new();
    push_line(&mut out, headers.iter().map(String::as_str), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, rule.iter().map(String::as_str), &widths);
    for row in rows {
        let cells = (0..widths.len()).map(|i| row.get(i).map(String::as_str).unwrap_or(""));
        push_line(&mut out, cells, &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| pad_right(&truncate_display(cell, w), w))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_display("hello", 10), "hello");
        assert_eq!(truncate_display("hello world", 7), "hello..");
    }

    #[test]
    fn truncate_cjk() {
        // Each CJK char is 2 columns wide
        assert_eq!(truncate_display("你好世界", 6), "你好..");
    }

    #[test]
    fn grid_aligns_columns() {
        let out = grid(
            &strings(&["name", "n"]),
            &[strings(&["tea", "3.5"]), strings(&["espresso", "12"])],
        );
        assert_eq!(
            out,
            "name      n\n--------  ---\ntea       3.5\nespresso  12\n"
        );
    }

    #[test]
    fn grid_pads_short_rows() {
        let out = grid(&strings(&["a", "b"]), &[strings(&["1"])]);
        assert_eq!(out, "a  b\n-  -\n1\n");
    }
}
