//! Coordinate text parsing shared by the KML and GPX extractors
//!
//! Two policies live here side by side:
//! - lenient coercion, used for single values and `Point` tuples: anything
//!   that does not start with a number becomes `0.0`
//! - the strict token filter, used for `LineString` text: whitespace-separated
//!   tokens that do not look like `x,y[,z]` are dropped

/// Coerces text to a float using its leading numeric prefix.
///
/// Leading whitespace is skipped; text without a numeric prefix, or whose
/// prefix overflows `f64`, yields `0.0`.
/// `"12.5abc"` → `12.5`, `"abc"` → `0.0`, `""` → `0.0`, `"1e400"` → `0.0`.
pub fn coerce_lenient(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let end = numeric_prefix_len(trimmed);
    parse_finite(&trimmed[..end]).unwrap_or(0.0)
}

/// Value of a whole decimal literal, `None` when it is not one or overflows
fn parse_strict(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if is_numeric_literal(trimmed) {
        parse_finite(trimmed)
    } else {
        None
    }
}

fn parse_finite(literal: &str) -> Option<f64> {
    literal.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Whether the whole text (ignoring surrounding whitespace) is a decimal
/// number literal such as `9`, `-45.10`, `.5` or `1e-3`.
///
/// `inf`, `NaN`, hexadecimal and empty text are not numeric literals.
pub fn is_numeric_literal(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && numeric_prefix_len(trimmed) == trimmed.len()
}

/// Length in bytes of the decimal number at the start of `text`, 0 if none.
///
/// Grammar: `[+-]? (digits ('.' digits?)? | '.' digits) ([eE] [+-]? digits)?`.
/// The exponent only counts when it is followed by at least one digit.
fn numeric_prefix_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut pos = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    let int_digits = count_digits(&bytes[pos..]);
    pos += int_digits;

    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        frac_digits = count_digits(&bytes[pos + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            pos += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
        let mut exp_pos = pos + 1;
        if matches!(bytes.get(exp_pos), Some(b'+') | Some(b'-')) {
            exp_pos += 1;
        }
        let exp_digits = count_digits(&bytes[exp_pos.min(bytes.len())..]);
        if exp_digits > 0 {
            pos = exp_pos + exp_digits;
        }
    }

    pos
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Parses a single `x,y[,z]` tuple with lenient coercion.
///
/// Every comma-separated part is kept and coerced on its own, so malformed
/// parts become `0.0` instead of being rejected.
pub fn parse_point_tuple(text: &str) -> Vec<f64> {
    text.trim().split(',').map(|part| coerce_lenient(part.trim())).collect()
}

/// Parses one whitespace-free coordinate token with the strict filter.
///
/// Returns `None` for empty tokens, tokens without a comma, and tokens whose
/// first two parts are not finite numeric literals. Parts past the second
/// are coerced leniently.
pub fn parse_coordinate_token(token: &str) -> Option<Vec<f64>> {
    let token = token.trim();
    if token.is_empty() || !token.contains(',') {
        return None;
    }

    let mut parts = token.split(',').map(str::trim);
    let lon = parse_strict(parts.next()?)?;
    let lat = parse_strict(parts.next()?)?;

    let mut tuple = vec![lon, lat];
    tuple.extend(parts.map(coerce_lenient));
    Some(tuple)
}

/// Parses `LineString` coordinate text into tuples, dropping malformed tokens.
///
/// `"9.0,45.0,100.0 invalid 9.1,45.1,110.0 , ,"` → two tuples.
pub fn parse_coordinate_tokens(text: &str) -> Vec<Vec<f64>> {
    text.split_whitespace()
        .filter_map(|token| {
            let tuple = parse_coordinate_token(token);
            if tuple.is_none() {
                tracing::trace!(token, "dropping malformed coordinate token");
            }
            tuple
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_lenient() {
        assert_eq!(coerce_lenient("9.0"), 9.0);
        assert_eq!(coerce_lenient("  -45.5 "), -45.5);
        assert_eq!(coerce_lenient("100"), 100.0);
        assert_eq!(coerce_lenient("12.5abc"), 12.5);
        assert_eq!(coerce_lenient("1e3"), 1000.0);
        assert_eq!(coerce_lenient("1e"), 1.0);
        assert_eq!(coerce_lenient(".5"), 0.5);
        assert_eq!(coerce_lenient("5."), 5.0);
        assert_eq!(coerce_lenient("abc"), 0.0);
        assert_eq!(coerce_lenient(""), 0.0);
        assert_eq!(coerce_lenient("."), 0.0);
        assert_eq!(coerce_lenient("-"), 0.0);
        assert_eq!(coerce_lenient("inf"), 0.0);
        assert_eq!(coerce_lenient("NaN"), 0.0);
        assert_eq!(coerce_lenient("1e400"), 0.0);
        assert_eq!(coerce_lenient("-1e999m"), 0.0);
    }

    #[test]
    fn test_is_numeric_literal() {
        assert!(is_numeric_literal("9.0"));
        assert!(is_numeric_literal("-45"));
        assert!(is_numeric_literal("+1.5e-3"));
        assert!(is_numeric_literal(" 7 "));
        assert!(is_numeric_literal(".5"));
        assert!(!is_numeric_literal(""));
        assert!(!is_numeric_literal("invalid"));
        assert!(!is_numeric_literal("9.0x"));
        assert!(!is_numeric_literal("1e"));
        assert!(!is_numeric_literal("0x1A"));
        assert!(!is_numeric_literal("inf"));
        assert!(!is_numeric_literal("NaN"));
        assert!(!is_numeric_literal("."));
    }

    #[test]
    fn test_point_tuple_is_lenient() {
        assert_eq!(parse_point_tuple("9.0,45.0,100.0"), vec![9.0, 45.0, 100.0]);
        assert_eq!(parse_point_tuple("\n  9.0, 45.0\n"), vec![9.0, 45.0]);
        assert_eq!(parse_point_tuple("9.0,abc"), vec![9.0, 0.0]);
        assert_eq!(parse_point_tuple(""), vec![0.0]);
        assert_eq!(parse_point_tuple("1e400,45.0,-1e999"), vec![0.0, 45.0, 0.0]);
    }

    #[test]
    fn test_tokens_empty_input() {
        assert!(parse_coordinate_tokens("").is_empty());
        assert!(parse_coordinate_tokens("   \n\t ").is_empty());
    }

    #[test]
    fn test_tokens_single_and_multiple_points() {
        assert_eq!(parse_coordinate_tokens("9.0,45.0,100.0"), vec![vec![9.0, 45.0, 100.0]]);
        assert_eq!(
            parse_coordinate_tokens("9.0,45.0,100.0 9.1,45.1,110.0"),
            vec![vec![9.0, 45.0, 100.0], vec![9.1, 45.1, 110.0]]
        );
        assert_eq!(
            parse_coordinate_tokens("\n  9.0,45.0\n\t9.1,45.1,110.0\n"),
            vec![vec![9.0, 45.0], vec![9.1, 45.1, 110.0]]
        );
    }

    #[test]
    fn test_tokens_skip_invalid() {
        assert_eq!(
            parse_coordinate_tokens("9.0,45.0,100.0 invalid 9.1,45.1,110.0 , ,"),
            vec![vec![9.0, 45.0, 100.0], vec![9.1, 45.1, 110.0]]
        );
        assert_eq!(parse_coordinate_tokens("9.0 45.0 100.0"), Vec::<Vec<f64>>::new());
        assert_eq!(parse_coordinate_tokens("9.0"), Vec::<Vec<f64>>::new());
        assert_eq!(parse_coordinate_tokens("9.0,45.0,100.0 9.1"), vec![vec![9.0, 45.0, 100.0]]);
        assert_eq!(parse_coordinate_tokens("9.0,45.0,100.0   9.1   "), vec![vec![9.0, 45.0, 100.0]]);
        assert_eq!(parse_coordinate_tokens("a,b 9.0,x 9.0,"), Vec::<Vec<f64>>::new());
    }

    #[test]
    fn test_token_keeps_trailing_parts_leniently() {
        assert_eq!(parse_coordinate_token("9.0,45.0,high"), Some(vec![9.0, 45.0, 0.0]));
        assert_eq!(parse_coordinate_token("9.0,45.0"), Some(vec![9.0, 45.0]));
        assert_eq!(parse_coordinate_token("1e400,45.0"), None);
        assert_eq!(parse_coordinate_token("9.0,-1e400"), None);
        assert_eq!(parse_coordinate_token("1,2,1e400"), Some(vec![1.0, 2.0, 0.0]));
    }

    #[test]
    fn test_token_filter_is_idempotent() {
        let input = "9.0,45.0,100.0 invalid 9.1,45.1 , , 7 -3.5,2e1,x";
        let first = parse_coordinate_tokens(input);
        let reformatted = first
            .iter()
            .map(|tuple| tuple.iter().map(f64::to_string).collect::<Vec<_>>().join(","))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(parse_coordinate_tokens(&reformatted), first);
        assert_eq!(first.len(), 3);
    }
}
