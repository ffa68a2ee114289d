//! Accepted-file filter.
//!
//! Parses the same comma-separated syntax HTML file inputs use:
//! `image/*` (MIME family), `application/pdf` (exact MIME type) and
//! `.pdf` (file extension). Matching is case-insensitive, and parameters
//! such as `; charset=utf-8` are ignored.

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Extension(String),
    MimeFamily(String),
    MimeType(String),
}

/// A parsed list of accepted file types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptFilter {
    rules: Vec<Rule>,
}

impl AcceptFilter {
    /// Parse a list like `"image/*, .pdf"`. Blank entries are ignored;
    /// a list with no entries accepts everything.
    pub fn parse(list: &str) -> Self {
        let rules = list
            .split(',')
            .map(|entry| entry.trim().to_lowercase())
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                if entry.starts_with('.') {
                    Rule::Extension(entry)
                } else if let Some(family) = entry.strip_suffix("/*") {
                    Rule::MimeFamily(family.to_string())
                } else {
                    Rule::MimeType(entry)
                }
            })
            .collect();
        Self { rules }
    }

    pub fn accepts(&self, file_name: &str, content_type: &str) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        let file_name = file_name.to_lowercase();
        let content_type = essence(content_type);
        let family = content_type.split('/').next().unwrap_or("");

        self.rules.iter().any(|rule| match rule {
            Rule::Extension(ext) => file_name.ends_with(ext.as_str()),
            Rule::MimeFamily(f) => family == f,
            Rule::MimeType(t) => content_type == *t,
        })
    }
}

/// The `type/subtype` part of a content type, lowercased.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}
