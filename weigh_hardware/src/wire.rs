//! Parsing of raw indicator output.
//!
//! Weight indicators stream free-form ASCII lines such as `ST,GS,+  65.02kg`.
//! We take the LAST decimal token of a line as the reading; indicators repeat
//! the weight at the end of the frame and the tail is the freshest field.

/// Extract the last `digits.digits` token from a line, e.g. "65.02" out of
/// "ST,GS,+  65.02kg". Returns None if no such token exists or it does not
/// parse as a finite number.
pub fn parse_last_decimal(line: &str) -> Option<f64> {
    let bytes = line.as_bytes();
    let mut best: Option<(usize, usize)> = None; // (start, end) byte range
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            // Require a fractional part: scales emit fixed-point frames, and
            // bare integers in the stream are usually status codes.
            if i < bytes.len() && bytes[i] == b'.' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit()
            {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                best = Some((start, i));
            }
        } else {
            i += 1;
        }
    }
    let (start, end) = best?;
    let token = &line[start..end];
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}

/// Scan a drained burst of lines and return the most recent parseable weight
/// together with the raw line it came from. Lines shorter than 4 characters
/// are noise (bare CR/LF, status glyphs) and are skipped.
pub fn latest_weight<'a, I>(lines: I) -> Option<(f64, &'a str)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut latest = None;
    for line in lines {
        let trimmed = line.trim();
        if trimmed.len() <= 3 {
            continue;
        }
        if let Some(kg) = parse_last_decimal(trimmed) {
            latest = Some((kg, trimmed));
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_indicator_frame() {
        assert_eq!(parse_last_decimal("ST,GS,+  65.02kg"), Some(65.02));
    }

    #[test]
    fn takes_the_last_token_when_several_present() {
        assert_eq!(parse_last_decimal("t 0.00 net 64.95"), Some(64.95));
    }

    #[test]
    fn ignores_bare_integers() {
        assert_eq!(parse_last_decimal("US,GS,+ 12 kg"), None);
    }

    #[test]
    fn rejects_lines_without_numbers() {
        assert_eq!(parse_last_decimal("OVERLOAD"), None);
        assert_eq!(parse_last_decimal(""), None);
    }

    #[test]
    fn latest_weight_prefers_newest_line() {
        let burst = ["ST,GS 64.90kg", "ST,GS 64.95kg", "ST,GS 65.01kg"];
        let (kg, raw) = latest_weight(burst).unwrap();
        assert_eq!(kg, 65.01);
        assert!(raw.contains("65.01"));
    }

    #[test]
    fn latest_weight_skips_noise_lines() {
        let burst = ["\r", "ok", "ST,GS 64.95kg", "???"];
        assert_eq!(latest_weight(burst).map(|(kg, _)| kg), Some(64.95));
    }

    #[test]
    fn latest_weight_none_when_nothing_parses() {
        assert_eq!(latest_weight(["OVERLOAD", "ERR"]), None);
    }
}
