use crate::consts::{ADDRESS_HEX_WIDTH, ADDRESS_PREFIX};

/// Left-aligns `text` in a field of `width` characters. Never truncates.
pub fn align_left(text: Option<&str>, width: usize) -> String {
    format!("{:<width$}", text.unwrap_or(""), width = width)
}

pub fn format_address(address: u64) -> String {
    format!(
        "{}{:0width$x}",
        ADDRESS_PREFIX,
        address,
        width = ADDRESS_HEX_WIDTH
    )
}

pub fn spaces(count: usize) -> String {
    " ".repeat(count)
}

pub fn rtrim(text: &str) -> &str {
    text.trim_end()
}

/// Character count, not byte length, so padding lines up for non-ASCII labels.
pub fn display_width(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_left_pads_without_truncating() {
        assert_eq!(align_left(Some("ab"), 5), "ab   ");
        assert_eq!(align_left(Some("abcdef"), 3), "abcdef");
        assert_eq!(align_left(None, 2), "  ");
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0x10), "0x0000000000000010");
        assert_eq!(format_address(0x7f3cABCD), "0x000000007f3cabcd");
        assert_eq!(format_address(u64::MAX), "0xffffffffffffffff");
    }

    #[test]
    fn test_display_width_counts_chars() {
        assert_eq!(display_width("héllo"), 5);
        assert_eq!(align_left(Some("é"), 3), "é  ");
    }
}
