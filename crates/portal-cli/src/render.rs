//! Plain-text views printed by the CLI.

use portal_core::models::{Checklist, CompanyResponse, DocumentResponse, SweepReport};

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One line per document type, then the submission summary.
pub fn checklist(company_name: &str, checklist: &Checklist) -> String {
    let mut out = format!("Compliance documents for {}\n\n", company_name);
    for (position, entry) in checklist.entries().iter().enumerate() {
        let mark = if entry.checked { "[x]" } else { "[ ]" };
        out.push_str(&format!(
            "{:>2}. {} {:<24} {}",
            position + 1,
            mark,
            entry.doc_type.as_str(),
            entry.status.label()
        ));
        if let Some(ref file_name) = entry.file_name {
            out.push_str(&format!("  ({})", truncate_string(file_name, 48)));
        }
        if let Some(ref pending) = entry.pending_file {
            out.push_str(&format!("  selected: {}", pending));
        }
        if let Some(ref error) = entry.last_error {
            out.push_str(&format!("  error: {}", error));
        }
        out.push('\n');
    }

    let received = checklist.received_count();
    let total = checklist.entries().len();
    if checklist.all_submitted() {
        out.push_str(&format!("\nAll {} documents submitted.\n", total));
    } else {
        out.push_str(&format!(
            "\n{} of {} documents received.\n",
            received, total
        ));
    }
    out
}

pub fn documents(documents: &[DocumentResponse]) -> String {
    if documents.is_empty() {
        return "No documents uploaded.\n".to_string();
    }
    let mut out = String::new();
    for doc in documents {
        out.push_str(&format!(
            "{}  {:<24} {:<40} {}\n",
            doc.id,
            doc.doc_type,
            truncate_string(&doc.original_name, 40),
            doc.uploaded_at.format("%Y-%m-%d %H:%M")
        ));
        if let Some(ref url) = doc.download_url {
            out.push_str(&format!("    {}\n", url));
        }
    }
    out
}

pub fn companies(companies: &[CompanyResponse]) -> String {
    if companies.is_empty() {
        return "No companies found.\n".to_string();
    }
    let mut out = String::new();
    for company in companies {
        out.push_str(&format!(
            "{}  {:<20} {}\n",
            company.id,
            truncate_string(&company.username, 20),
            company.company_name
        ));
    }
    out
}

pub fn sweep(report: &SweepReport) -> String {
    let mut out = format!(
        "Scanned {} objects: {} referenced, {} too recent, {} removed, {} failed.\n",
        report.scanned,
        report.referenced,
        report.skipped_recent,
        report.removed.len(),
        report.failed.len()
    );
    for key in &report.failed {
        out.push_str(&format!("  could not remove {}\n", key));
    }
    out
}
