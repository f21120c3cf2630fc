/// Escape character used in every `LIKE ... ESCAPE '!'` clause.
pub const LIKE_ESCAPE: char = '!';

/// Builds a `%...%` LIKE pattern that matches `query` as a literal,
/// lower-cased substring.
pub fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.to_lowercase().chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
