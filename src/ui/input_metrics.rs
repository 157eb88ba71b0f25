use unicode_width::UnicodeWidthChar;

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    text.chars().map(char_display_width).sum()
}

/// Wrap a single-line input buffer into display rows of at most `width`
/// columns. The input never contains newlines; wrapping is width-driven only.
pub fn wrap_input_lines(input: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![String::new()];
    let mut current_width = 0usize;

    for ch in input.chars() {
        let ch_width = char_display_width(ch);
        if current_width + ch_width > width && current_width > 0 {
            lines.push(String::new());
            current_width = 0;
        }
        if let Some(line) = lines.last_mut() {
            line.push(ch);
        }
        current_width += ch_width;
    }

    lines
}

/// Visual (row, column) of a byte cursor within the wrapped input.
pub fn cursor_row_col(input: &str, cursor_byte: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let cursor_byte = clamp_to_char_boundary_left(input, cursor_byte);
    let mut row = 0usize;
    let mut col = 0usize;

    for (idx, ch) in input.char_indices() {
        if idx >= cursor_byte {
            break;
        }
        let ch_width = char_display_width(ch);
        if col + ch_width > width && col > 0 {
            row += 1;
            col = 0;
        }
        col += ch_width;
    }

    if col >= width {
        row += 1;
        col = 0;
    }
    (row, col)
}

pub fn clamp_to_char_boundary_left(input: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(input.len());
    while cursor > 0 && !input.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_splits_at_display_width() {
        let lines = wrap_input_lines("abcdefgh", 3);
        assert_eq!(lines, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_wrap_counts_wide_characters() {
        // Each CJK character is two columns wide.
        let lines = wrap_input_lines("新聞記事", 4);
        assert_eq!(lines, vec!["新聞", "記事"]);
    }

    #[test]
    fn test_cursor_position_tracks_wrapping() {
        assert_eq!(cursor_row_col("abcdefgh", 0, 3), (0, 0));
        assert_eq!(cursor_row_col("abcdefgh", 4, 3), (1, 1));
        assert_eq!(cursor_row_col("abcdefgh", 8, 3), (2, 2));
    }

    #[test]
    fn test_cursor_clamps_inside_multibyte_sequences() {
        let input = "héllo";
        // Byte 2 falls inside the two-byte 'é'.
        assert_eq!(clamp_to_char_boundary_left(input, 2), 1);
        assert_eq!(clamp_to_char_boundary_left(input, 99), input.len());
    }

    #[test]
    fn test_display_width_mixes_narrow_and_wide() {
        assert_eq!(display_width("ab記"), 4);
    }
}
