//! Batch upload of documents for one polling location.
//!
//! Files are uploaded one at a time. A failed file is recorded and the
//! batch continues; the report carries per-file outcomes and the
//! aggregate count.

use std::fmt;
use std::str::FromStr;

use tracing::{info, warn};

use crate::api::{ApiError, DataSource};

/// The document slots a polling location submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Wahlausschreiben,
    Niederschrift,
    Wahlvorschlag,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Wahlausschreiben,
        DocumentType::Niederschrift,
        DocumentType::Wahlvorschlag,
    ];

    /// Value of the `containers` form field.
    pub fn tag(&self) -> &'static str {
        match self {
            DocumentType::Wahlausschreiben => "wahlausschreiben",
            DocumentType::Niederschrift => "niederschrift",
            DocumentType::Wahlvorschlag => "wahlvorschlag",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.tag() == lower)
            .ok_or_else(|| format!("unknown document type: {}", s))
    }
}

/// A file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn size_display(&self) -> String {
        format!("{} KB", (self.bytes.len() as f64 / 1024.0).round() as u64)
    }
}

/// One multipart upload as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub district: String,
    pub location_code: String,
    pub document_type: DocumentType,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Files queued per document type for one location.
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    pub district: String,
    pub location_code: String,
    files: Vec<(DocumentType, UploadFile)>,
}

impl UploadBatch {
    pub fn new(district: impl Into<String>, location_code: impl Into<String>) -> Self {
        Self {
            district: district.into(),
            location_code: location_code.into(),
            files: Vec::new(),
        }
    }

    pub fn add(&mut self, document_type: DocumentType, file: UploadFile) {
        self.files.push((document_type, file));
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Queued files in document-type order, insertion order within a type.
    fn ordered(&self) -> Vec<&(DocumentType, UploadFile)> {
        DocumentType::ALL
            .iter()
            .flat_map(|t| self.files.iter().filter(move |(ft, _)| ft == t))
            .collect()
    }
}

#[derive(Debug)]
pub struct FileOutcome {
    pub document_type: DocumentType,
    pub file_name: String,
    pub result: Result<(), ApiError>,
}

impl FileOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.total()
    }

    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!("All {} files uploaded", self.total())
        } else {
            format!("{} of {} files uploaded", self.succeeded(), self.total())
        }
    }
}

/// Upload every queued file, continuing past failures.
pub async fn upload_batch(source: &dyn DataSource, batch: &UploadBatch) -> BatchReport {
    let district = batch.district.trim();
    let location_code = batch.location_code.trim();
    let mut report = BatchReport::default();

    for (document_type, file) in batch.ordered() {
        let result = if district.is_empty() {
            Err(ApiError::MissingInput("district"))
        } else if location_code.is_empty() {
            Err(ApiError::MissingInput("location code"))
        } else {
            let request = UploadRequest {
                district: district.to_string(),
                location_code: location_code.to_string(),
                document_type: *document_type,
                file_name: file.file_name.clone(),
                bytes: file.bytes.clone(),
            };
            source.upload_file(&request).await
        };

        match &result {
            Ok(()) => info!(file = %file.file_name, kind = %document_type, "Uploaded"),
            Err(e) => warn!(file = %file.file_name, kind = %document_type, error = %e, "Upload failed"),
        }
        report.outcomes.push(FileOutcome {
            document_type: *document_type,
            file_name: file.file_name.clone(),
            result,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::testing::FakeSource;

    fn batch_of_three() -> UploadBatch {
        let mut batch = UploadBatch::new("Nord", "42");
        batch.add(DocumentType::Wahlausschreiben, UploadFile::new("one.pdf", vec![1]));
        batch.add(DocumentType::Niederschrift, UploadFile::new("two.pdf", vec![2]));
        batch.add(DocumentType::Wahlvorschlag, UploadFile::new("three.pdf", vec![3]));
        batch
    }

    #[tokio::test]
    async fn test_failed_file_does_not_stop_batch() {
        let source = FakeSource::default();
        source.failing_uploads.lock().unwrap().insert("two.pdf".to_string());

        let report = upload_batch(&source, &batch_of_three()).await;

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.total(), 3);
        assert!(report.outcomes[0].succeeded());
        assert!(!report.outcomes[1].succeeded());
        assert!(report.outcomes[2].succeeded());
        assert_eq!(report.summary(), "2 of 3 files uploaded");

        let uploaded = source.uploaded.lock().unwrap();
        assert_eq!(uploaded.len(), 2);
        assert_eq!(uploaded[1].document_type, DocumentType::Wahlvorschlag);
        assert_eq!(uploaded[1].location_code, "42");
    }

    #[tokio::test]
    async fn test_missing_location_fails_each_file() {
        let source = FakeSource::default();
        let mut batch = UploadBatch::new("Nord", " ");
        batch.add(DocumentType::Niederschrift, UploadFile::new("a.pdf", vec![]));
        batch.add(DocumentType::Niederschrift, UploadFile::new("b.pdf", vec![]));

        let report = upload_batch(&source, &batch).await;

        assert_eq!(report.total(), 2);
        assert_eq!(report.succeeded(), 0);
        assert!(matches!(report.outcomes[0].result, Err(ApiError::MissingInput(_))));
        assert!(source.uploaded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uploads_follow_document_type_order() {
        let source = FakeSource::default();
        let mut batch = UploadBatch::new("Nord", "1");
        batch.add(DocumentType::Wahlvorschlag, UploadFile::new("v.pdf", vec![]));
        batch.add(DocumentType::Wahlausschreiben, UploadFile::new("a.pdf", vec![]));

        let report = upload_batch(&source, &batch).await;

        assert!(report.all_succeeded());
        assert_eq!(report.summary(), "All 2 files uploaded");
        let names: Vec<_> = report.outcomes.iter().map(|o| o.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "v.pdf"]);
    }

    #[test]
    fn test_document_type_parse() {
        assert_eq!("Niederschrift".parse::<DocumentType>(), Ok(DocumentType::Niederschrift));
        assert!("protokoll".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_size_display() {
        assert_eq!(UploadFile::new("x", vec![0; 2048]).size_display(), "2 KB");
    }
}
