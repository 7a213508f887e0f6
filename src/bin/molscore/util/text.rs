/// Greedy word wrap; a single word longer than `width` gets its own line.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Shortens `s` to `max_len` characters, marking the cut with `…`.
pub fn truncate(s: &str, max_len: usize) -> String {
    match max_len {
        0 => return String::new(),
        1 => return "…".to_string(),
        _ => {}
    }
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len - 1).collect();
    out.push('…');
    out
}

/// `count / total` as a percentage, `0.0` for an empty total.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Shortest round-trip form of `value`, written the way Python's `repr`
/// writes a float: `1.0`, `0.25`, `5e-05`, `1e+16`.
pub fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    let text = format!("{value:?}");
    let Some((mantissa, exponent)) = text.split_once('e') else {
        return text;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_short_messages_on_one_line() {
        assert_eq!(wrap("submission contains no molecules", 40), vec![
            "submission contains no molecules"
        ]);
    }

    #[test]
    fn wrap_breaks_between_words() {
        assert_eq!(wrap("failed to read 'train.txt'", 15), vec![
            "failed to read",
            "'train.txt'"
        ]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn truncate_marks_the_cut() {
        assert_eq!(truncate("validity", 10), "validity");
        assert_eq!(truncate("uniqueness", 10), "uniqueness");
        assert_eq!(truncate("/data/reference_stats.npz", 8), "/data/r…");
        assert_eq!(truncate("Fréchet", 4), "Fré…");
        assert_eq!(truncate("abc", 1), "…");
    }

    #[test]
    fn percent_handles_empty_totals() {
        assert_eq!(percent(3, 4), 75.0);
        assert_eq!(percent(0, 0), 0.0);
    }

    #[test]
    fn float_repr_matches_python() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(0.0), "0.0");
        assert_eq!(float_repr(0.25), "0.25");
        assert_eq!(float_repr(2.0 / 3.0), "0.6666666666666666");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(0.00005), "5e-05");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(float_repr(1e-100), "1e-100");
        assert_eq!(float_repr(1e16), "1e+16");
    }
}
