//! camelCase / PascalCase to snake_case conversion.

use crate::errors::IdentifierError;

/// Convert a camelCase or PascalCase identifier to snake_case.
///
/// Word boundaries fall before an uppercase letter when either
///
/// - the previous character is not uppercase (`AbC` -> `ab_c`), or
/// - the next character is lowercase, which splits an acronym so that its
///   last letter starts the following word (`ABCd` -> `ab_cd`,
///   `SomeIDOfEntity` -> `some_id_of_entity`).
///
/// Uppercase runs at the end of the input stay joined (`AbCD` -> `ab_cd`).
///
/// The function is total. Empty input yields an empty string, characters
/// other than ASCII uppercase are copied unchanged, and no separator is
/// inserted right after an existing `_`. Use [`validate_identifier`] when
/// the input must be a well-formed identifier.
pub fn to_snake(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut snake = String::with_capacity(identifier.len() + identifier.len() / 2);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            let prev_upper = chars[i - 1].is_ascii_uppercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if (!prev_upper || next_lower) && !snake.ends_with('_') {
                snake.push('_');
            }
        }
        snake.push(c.to_ascii_lowercase());
    }

    snake
}

/// Check that `identifier` is a non-empty run of ASCII letters, digits and
/// underscores that does not start with a digit.
pub fn validate_identifier(identifier: &str) -> Result<(), IdentifierError> {
    let first = identifier.chars().next().ok_or(IdentifierError::Empty)?;
    if first.is_ascii_digit() {
        return Err(IdentifierError::LeadingDigit(identifier.to_string()));
    }
    if let Some(ch) = identifier
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
    {
        return Err(IdentifierError::InvalidCharacter {
            identifier: identifier.to_string(),
            ch,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_cases() {
        let cases = [
            ("A", "a"),
            ("AB", "ab"),
            ("ABC", "abc"),
            ("ABCd", "ab_cd"),
            ("ABCdE", "ab_cd_e"),
            ("ABCde", "ab_cde"),
            ("Ab", "ab"),
            ("Abc", "abc"),
            ("AbC", "ab_c"),
            ("AbCd", "ab_cd"),
            ("AbCD", "ab_cd"),
            ("SomeIDOfEntity", "some_id_of_entity"),
        ];
        for (camel, snake) in cases {
            assert_eq!(to_snake(camel), snake, "{camel}");
        }
    }

    #[test]
    fn test_to_snake_common_identifiers() {
        assert_eq!(to_snake("userID"), "user_id");
        assert_eq!(to_snake("createdAt"), "created_at");
        assert_eq!(to_snake("HTTPServer"), "http_server");
        assert_eq!(to_snake("already_snake"), "already_snake");
    }

    #[test]
    fn test_to_snake_plural_acronym() {
        // The run "ID" gives its last letter to the trailing "s".
        assert_eq!(to_snake("itemIDs"), "item_i_ds");
        assert_eq!(to_snake("itemIds"), "item_ids");
    }

    #[test]
    fn test_to_snake_digits() {
        assert_eq!(to_snake("Field2Name"), "field2_name");
        assert_eq!(to_snake("ID2"), "id2");
        assert_eq!(to_snake("HTTP2Server"), "http2_server");
    }

    #[test]
    fn test_to_snake_outside_identifier_domain() {
        assert_eq!(to_snake(""), "");
        assert_eq!(to_snake("Some_ID"), "some_id");
        assert_eq!(to_snake("_Private"), "_private");
        assert_eq!(to_snake("ÉtéAt"), "Été_at");
    }

    /// Every identifier over {a, b, A, B} up to length 5.
    fn letter_identifiers() -> Vec<String> {
        let alphabet = ['a', 'b', 'A', 'B'];
        let mut all = Vec::new();
        let mut frontier = vec![String::new()];
        for _ in 0..5 {
            let mut next = Vec::new();
            for prefix in &frontier {
                for c in alphabet {
                    let mut s = prefix.clone();
                    s.push(c);
                    next.push(s);
                }
            }
            all.extend(next.iter().cloned());
            frontier = next;
        }
        all
    }

    #[test]
    fn test_to_snake_output_shape() {
        for ident in letter_identifiers() {
            let snake = to_snake(&ident);
            assert_eq!(snake, to_snake(&ident), "{ident}: not deterministic");
            assert!(
                snake
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "{ident} -> {snake}: bad character"
            );
            assert!(!snake.starts_with('_'), "{ident} -> {snake}: leading _");
            assert!(!snake.ends_with('_'), "{ident} -> {snake}: trailing _");
            assert!(!snake.contains("__"), "{ident} -> {snake}: double _");
            assert_eq!(snake.replace('_', ""), ident.to_ascii_lowercase());
        }
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("userID").is_ok());
        assert!(validate_identifier("_hidden2").is_ok());
        assert_eq!(validate_identifier(""), Err(IdentifierError::Empty));
        assert_eq!(
            validate_identifier("2fast"),
            Err(IdentifierError::LeadingDigit("2fast".into()))
        );
        assert_eq!(
            validate_identifier("user.id"),
            Err(IdentifierError::InvalidCharacter {
                identifier: "user.id".into(),
                ch: '.',
            })
        );
        assert!(validate_identifier("naïve").is_err());
    }
}
