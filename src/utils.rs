use std::str::FromStr;
use tokio::time::Duration;

/// Parses a duration string in the format "30s", "10m", "5h", "3d".
///
/// Supported units:
/// - `s` for seconds
/// - `m` for minutes
/// - `h` for hours
/// - `d` for days
pub fn parse_duration_string(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    let Some(unit_char) = s.chars().last() else {
        return Err("Duration string cannot be empty".to_string());
    };
    let value_str = &s[0..s.len() - unit_char.len_utf8()];

    let value = u64::from_str(value_str)
        .map_err(|_| format!("Invalid numeric value in duration: '{}'", value_str))?;

    let seconds_per_unit: u64 = match unit_char {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => {
            return Err(format!(
                "Unknown duration unit: '{}'. Use 's', 'm', 'h', or 'd'.",
                unit_char
            ))
        }
    };

    value
        .checked_mul(seconds_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Duration too large: '{}'", s))
}

/// Parses a comma-separated header string with support for escaped commas.
///
/// Use `\,` to include a literal comma in a header value.
/// Example: "Connection:keep-alive,Keep-Alive:timeout=5\,max=200"
pub fn parse_headers_with_escapes(headers_str: &str) -> Vec<String> {
    let mut headers = Vec::new();
    let mut current_header = String::new();
    let mut chars = headers_str.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if chars.peek() == Some(&',') {
                    current_header.push(',');
                    chars.next();
                } else {
                    current_header.push('\\');
                }
            }
            ',' => {
                if !current_header.trim().is_empty() {
                    headers.push(std::mem::take(&mut current_header));
                }
                current_header.clear();
            }
            _ => current_header.push(ch),
        }
    }

    if !current_header.trim().is_empty() {
        headers.push(current_header);
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    mod duration {
        use super::*;

        #[test]
        fn parse_seconds() {
            assert_eq!(parse_duration_string("30s").unwrap(), Duration::from_secs(30));
        }

        #[test]
        fn parse_minutes() {
            assert_eq!(
                parse_duration_string("10m").unwrap(),
                Duration::from_secs(600)
            );
        }

        #[test]
        fn parse_hours_and_days() {
            assert_eq!(
                parse_duration_string("5h").unwrap(),
                Duration::from_secs(18000)
            );
            assert_eq!(
                parse_duration_string("3d").unwrap(),
                Duration::from_secs(259200)
            );
        }

        #[test]
        fn parse_with_whitespace() {
            assert_eq!(
                parse_duration_string("  2m ").unwrap(),
                Duration::from_secs(120)
            );
        }

        #[test]
        fn reject_empty() {
            assert!(parse_duration_string("").is_err());
            assert!(parse_duration_string("   ").is_err());
        }

        #[test]
        fn reject_bad_unit_and_number() {
            assert!(parse_duration_string("10x").is_err());
            assert!(parse_duration_string("abcs").is_err());
            assert!(parse_duration_string("s").is_err());
        }

        #[test]
        fn reject_overflow() {
            let err = parse_duration_string("300000000000000d").unwrap_err();
            assert!(err.contains("too large"));
            assert_eq!(
                parse_duration_string("18446744073709551615s").unwrap(),
                Duration::from_secs(u64::MAX)
            );
            assert!(parse_duration_string("18446744073709551615m").is_err());
        }
    }

    mod headers {
        use super::*;

        #[test]
        fn split_simple() {
            assert_eq!(
                parse_headers_with_escapes("A:1,B:2"),
                vec!["A:1".to_string(), "B:2".to_string()]
            );
        }

        #[test]
        fn escaped_comma_kept() {
            assert_eq!(
                parse_headers_with_escapes("Keep-Alive:timeout=5\\,max=200"),
                vec!["Keep-Alive:timeout=5,max=200".to_string()]
            );
        }

        #[test]
        fn skips_empty_segments() {
            assert_eq!(
                parse_headers_with_escapes("A:1,, ,B:2,"),
                vec!["A:1".to_string(), "B:2".to_string()]
            );
        }

        #[test]
        fn lone_backslash_kept() {
            assert_eq!(
                parse_headers_with_escapes("Path:C:\\dir"),
                vec!["Path:C:\\dir".to_string()]
            );
        }
    }
}
