use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A document already stored for a polling location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub name: String,
    #[serde(rename = "lastModified", default)]
    pub last_modified: String,
}

impl StoredFile {
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.last_modified.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Local time in German notation, or the raw value if unparseable.
    pub fn modified_display(&self) -> String {
        match self.modified_at() {
            Some(dt) => dt.with_timezone(&Local).format("%d.%m.%Y, %H:%M:%S").to_string(),
            None => self.last_modified.clone(),
        }
    }
}

/// Sort newest first. Files without a parseable timestamp go last.
pub fn sort_newest_first(files: &mut [StoredFile]) {
    files.sort_by(|a, b| b.modified_at().cmp(&a.modified_at()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, modified: &str) -> StoredFile {
        StoredFile { name: name.to_string(), last_modified: modified.to_string() }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut files = vec![
            file("old.pdf", "2026-01-01T10:00:00Z"),
            file("broken.pdf", "yesterday"),
            file("new.pdf", "2026-03-01T08:30:00+01:00"),
        ];
        sort_newest_first(&mut files);
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["new.pdf", "old.pdf", "broken.pdf"]);
    }

    #[test]
    fn test_modified_display_falls_back_to_raw() {
        assert_eq!(file("x", "gestern").modified_display(), "gestern");
    }
}
