//! Database repositories for the data access layer
//!
//! `company` covers the `companies` table, `document` covers `uploaded_documents`.
//! Each file holds the store trait and its PostgreSQL implementation.

pub mod company;
pub mod document;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod migrations;

pub use company::{CompanyStore, PgCompanyRepository};
pub use document::{DocumentRecordStore, PgDocumentRepository, UpsertOutcome};
#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryStore;
pub use migrations::run_migrations;

/// Escape `%`, `_` and `\` so user input matches literally inside an ILIKE pattern.
pub(crate) fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("acme"), "%acme%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
