pub mod material;
pub mod room;
pub mod user;

/// Escapes `%`, `_` and the escape character itself so a search term
/// matches literally inside a LIKE pattern.
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
