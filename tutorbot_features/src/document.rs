//! Plain-text extraction from PDF documents.

use lopdf::Document;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to parse PDF: {0}")]
    Parse(#[source] lopdf::Error),
    #[error("Document has no extractable text")]
    Empty,
    #[error("Document extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Reads the text of a bounded number of leading pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfExtractor {
    max_pages: Option<usize>,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self {
            max_pages: Some(2),
        }
    }
}

impl PdfExtractor {
    /// `None` reads every page.
    #[must_use]
    pub const fn new(max_pages: Option<usize>) -> Self {
        Self { max_pages }
    }

    #[must_use]
    pub const fn all_pages() -> Self {
        Self { max_pages: None }
    }

    #[must_use]
    pub const fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    pub async fn extract_path(&self, path: &Path) -> Result<String, DocumentError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }
        info!("Extracting text from {}", path.display());

        let owned = path.to_path_buf();
        let max_pages = self.max_pages;
        tokio::task::spawn_blocking(move || {
            let doc = Document::load(&owned).map_err(DocumentError::Parse)?;
            page_text(&doc, max_pages)
        })
        .await?
    }

    pub async fn extract_bytes(&self, bytes: Vec<u8>) -> Result<String, DocumentError> {
        debug!("Extracting text from {} uploaded bytes", bytes.len());
        let max_pages = self.max_pages;
        tokio::task::spawn_blocking(move || {
            let doc = Document::load_mem(&bytes).map_err(DocumentError::Parse)?;
            page_text(&doc, max_pages)
        })
        .await?
    }
}

fn page_text(doc: &Document, max_pages: Option<usize>) -> Result<String, DocumentError> {
    let numbers: Vec<u32> = doc.get_pages().into_keys().collect();
    let take = max_pages.unwrap_or(numbers.len());

    let mut pages = Vec::with_capacity(take.min(numbers.len()));
    for number in numbers.into_iter().take(take) {
        let text = doc.extract_text(&[number]).map_err(DocumentError::Parse)?;
        pages.push(text.trim().to_string());
    }

    let joined = pages.join("\n");
    if joined.trim().is_empty() {
        return Err(DocumentError::Empty);
    }
    debug!("Extracted {} chars from {} pages", joined.len(), pages.len());
    Ok(joined)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// A PDF with one page per entry of `texts`.
    pub fn pdf_with_pages(texts: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = i64::try_from(kids.len()).unwrap();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }
}
