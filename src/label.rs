/// Turns a raw navigation segment such as `12-Ehitus` into a stable label.
///
/// Dashes are removed first; a leading two-digit ordering prefix is then
/// dropped. Anything shorter than two characters is returned as is.
pub fn normalize(segment: &str) -> String {
    let cleaned = segment.replace('-', "");
    let mut chars = cleaned.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_ascii_digit() && second.is_ascii_digit() => {
            cleaned[2..].to_string()
        }
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_numeric_prefix() {
        assert_eq!(normalize("12-Ehitus"), "Ehitus");
        assert_eq!(normalize("10Ehitus"), "Ehitus");
    }

    #[test]
    fn keeps_plain_labels() {
        assert_eq!(normalize("Keskkond"), "Keskkond");
        assert_eq!(normalize("1a-Test"), "1aTest");
    }

    #[test]
    fn short_input_passes_through() {
        assert_eq!(normalize("1"), "1");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("-"), "");
    }

    #[test]
    fn dashes_removed_before_prefix_check() {
        assert_eq!(normalize("1-2Kaubandus"), "Kaubandus");
        assert_eq!(normalize("Välis-kaubandus"), "Väliskaubandus");
    }
}
