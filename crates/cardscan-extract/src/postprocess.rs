use crate::zone::FieldKind;

/// Filter raw recognized text by the field's expected character class.
///
/// Names keep alphabetic characters and interior whitespace; numbers keep
/// ASCII digits only. The result is trimmed at both ends. An empty result
/// is the "not detected" outcome, not an error.
///
/// The filter is idempotent: applying it twice changes nothing.
pub fn postprocess(raw: &str, kind: FieldKind) -> String {
    let filtered: String = match kind {
        FieldKind::Name => raw
            .chars()
            .filter(|c| c.is_alphabetic() || c.is_whitespace())
            .collect(),
        FieldKind::Number => raw.chars().filter(|c| c.is_ascii_digit()).collect(),
    };
    filtered.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_strips_digits_and_keeps_interior_spaces() {
        assert_eq!(postprocess("J0HN  DOE123", FieldKind::Name), "JHN  DOE");
    }

    #[test]
    fn number_keeps_digits_only() {
        assert_eq!(postprocess("ID: 20-21-045", FieldKind::Number), "2021045");
    }

    #[test]
    fn is_idempotent() {
        for (raw, kind) in [
            ("J0HN  DOE123", FieldKind::Name),
            ("ID: 20-21-045", FieldKind::Number),
            ("  spaced   out  ", FieldKind::Name),
            ("", FieldKind::Number),
        ] {
            let once = postprocess(raw, kind);
            assert_eq!(postprocess(&once, kind), once);
        }
    }

    #[test]
    fn garbage_collapses_to_not_detected() {
        assert_eq!(postprocess("#$%&!!", FieldKind::Name), "");
        assert_eq!(postprocess("no digits here", FieldKind::Number), "");
    }
}
