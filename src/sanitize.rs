/// Canonical form of a description for equality checks. Never shown to the user.
///
/// Keeps ASCII letters, digits and `* : / . -`, drops everything else.
pub fn sanitize(description: &str) -> String {
    description
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '*' | ':' | '/' | '.' | '-'))
        .collect()
}

/// Coarser form used to group similar transactions, e.g. the same merchant with
/// different reference numbers.
pub fn letters_only(description: &str) -> String {
    description
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect()
}
