//! Document ingestion into the vector store.
//!
//! Two sources are supported:
//! - a directory of PDFs (public MMELs, regulations, human-factors handbooks,
//!   tenant-uploaded company procedures), tagged with caller-supplied metadata;
//! - a folder tree of markdown references, where the airframe is inferred from
//!   the parent folder and the document type from the file name.
//!
//! Proprietary OEM manuals are refused by file name before any content is read.

use aerobrain_core::error::StoreError;
use aerobrain_core::retrieval::{DocumentChunk, DocumentMetadata, TenantId, VectorStore};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Maximum characters per chunk.
pub const DEFAULT_CHUNK_CHARS: usize = 1000;

const FORBIDDEN_PREFIXES: [&str; 6] = ["AMM", "SRM", "IPC", "FCOM", "TSM", "WDM"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("PDF extraction failed for {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Metadata applied to every document of a PDF ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub tenant_id: TenantId,
    pub aircraft_model: Option<String>,
    pub ata_chapter: Option<String>,
    /// MMEL, MEL, MOE, REG, HF, COMPANY_PROC, RELIABILITY
    pub doc_type: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            tenant_id: TenantId::default(),
            aircraft_model: None,
            ata_chapter: None,
            doc_type: "MMEL".into(),
        }
    }
}

/// Outcome of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub ingested: Vec<PathBuf>,
    pub skipped: Vec<(PathBuf, String)>,
    pub chunks: usize,
}

/// True when a file name looks like a proprietary OEM manual.
pub fn is_forbidden_filename(name: &str) -> bool {
    let upper = name.to_uppercase();
    FORBIDDEN_PREFIXES
        .iter()
        .any(|p| upper.starts_with(p) || upper.contains(&format!("_{p}")))
}

/// Extract plain text from PDF bytes.
pub fn extract_pdf_text(path: &Path, bytes: &[u8]) -> Result<String, IngestError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| IngestError::Pdf {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Infer the airframe tag from a folder name.
pub fn detect_aircraft(folder_name: &str) -> Option<&'static str> {
    let upper = folder_name.to_uppercase();
    if upper.contains("737MAX") {
        Some("B737MAX")
    } else if upper.contains("737NG") {
        Some("B737NG")
    } else if upper.contains("767") {
        Some("B767")
    } else if upper.contains("777") {
        Some("B777")
    } else if upper.contains("787") {
        Some("B787")
    } else if upper.contains("COMMON") {
        Some("COMMON")
    } else {
        None
    }
}

/// Infer the document type of a markdown reference from its file stem.
pub fn detect_doc_type(stem: &str) -> &'static str {
    let lower = stem.to_lowercase();
    if lower.contains("translator") {
        "TRANSLATOR"
    } else if lower.contains("few_shot") {
        "FEW_SHOT"
    } else if lower.contains("acronym") {
        "ACRONYMS"
    } else {
        "REFERENCE"
    }
}

/// Deterministic chunk id; re-ingesting a document replaces its chunks.
pub fn chunk_id(tenant_id: TenantId, doc_title: &str, aircraft_model: &str, index: usize) -> String {
    let aircraft = if aircraft_model.is_empty() {
        "unknown"
    } else {
        aircraft_model
    };
    format!("{tenant_id}_{doc_title}_{aircraft}_{index}")
}

/// Split text on paragraph boundaries into pieces of at most `max_chars`.
///
/// Oversized paragraphs are hard-split at whitespace where possible.
/// Blank input yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for para in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let para_len = para.chars().count();
        let would_be = if current.is_empty() {
            para_len
        } else {
            current.chars().count() + 2 + para_len
        };

        if would_be > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if para_len > max_chars {
            split_long(para, max_chars, &mut chunks);
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(para);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_long(para: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut remaining = para;
    while !remaining.is_empty() {
        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        let split_at = if limit < remaining.len() {
            remaining[..limit]
                .rfind(char::is_whitespace)
                .filter(|&pos| pos > 0)
                .unwrap_or(limit)
        } else {
            limit
        };
        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        remaining = remaining[split_at..].trim_start();
    }
}

fn build_chunks(text: &str, metadata: DocumentMetadata) -> Vec<DocumentChunk> {
    chunk_text(text, DEFAULT_CHUNK_CHARS)
        .into_iter()
        .enumerate()
        .map(|(i, content)| DocumentChunk {
            id: chunk_id(
                metadata.tenant_id,
                &metadata.doc_title,
                &metadata.aircraft_model,
                i,
            ),
            content,
            metadata: metadata.clone(),
        })
        .collect()
}

fn normalized_aircraft(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_uppercase()).unwrap_or_default()
}

fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::NotADirectory(dir.to_path_buf()));
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|x| x.to_str())
                .is_some_and(|x| x.eq_ignore_ascii_case(ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Ingest every PDF under `dir` with the metadata in `options`.
pub async fn ingest_pdf_dir(
    store: &dyn VectorStore,
    dir: &Path,
    options: &IngestOptions,
) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();

    for path in files_with_extension(dir, "pdf")? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_forbidden_filename(&name) {
            warn!(file = %name, "Skipping possible OEM manual");
            report.skipped.push((path, "forbidden OEM manual name".into()));
            continue;
        }

        let text = match tokio::fs::read(&path)
            .await
            .map_err(|e| IngestError::Read {
                path: path.clone(),
                reason: e.to_string(),
            })
            .and_then(|bytes| extract_pdf_text(&path, &bytes))
        {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable PDF");
                report.skipped.push((path, e.to_string()));
                continue;
            }
        };

        let metadata = DocumentMetadata {
            tenant_id: options.tenant_id,
            aircraft_model: normalized_aircraft(options.aircraft_model.as_deref()),
            ata_chapter: options.ata_chapter.clone().unwrap_or_default(),
            doc_type: options.doc_type.clone(),
            source_path: path.display().to_string(),
            doc_title: file_stem(&path),
        };
        let chunks = build_chunks(&text, metadata);
        if chunks.is_empty() {
            report.skipped.push((path, "no extractable text".into()));
            continue;
        }

        report.chunks += store.upsert(chunks).await?;
        info!(file = %name, tenant = %options.tenant_id, "Ingested PDF");
        report.ingested.push(path);
    }

    Ok(report)
}

/// Ingest every markdown file under `dir`.
///
/// When `aircraft_model` is absent the airframe is detected from each file's
/// parent folder name.
pub async fn ingest_markdown_dir(
    store: &dyn VectorStore,
    dir: &Path,
    tenant_id: TenantId,
    aircraft_model: Option<&str>,
) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport::default();
    let fixed_aircraft = normalized_aircraft(aircraft_model);

    for path in files_with_extension(dir, "md")? {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping unreadable markdown");
                report.skipped.push((path, e.to_string()));
                continue;
            }
        };

        let aircraft = if fixed_aircraft.is_empty() {
            path.parent()
                .and_then(|p| p.file_name())
                .and_then(|n| detect_aircraft(&n.to_string_lossy()))
                .unwrap_or_default()
                .to_string()
        } else {
            fixed_aircraft.clone()
        };
        let stem = file_stem(&path);

        let metadata = DocumentMetadata {
            tenant_id,
            aircraft_model: aircraft.clone(),
            ata_chapter: String::new(),
            doc_type: detect_doc_type(&stem).into(),
            source_path: path.display().to_string(),
            doc_title: stem,
        };
        let chunks = build_chunks(&content, metadata);
        if chunks.is_empty() {
            report.skipped.push((path, "empty document".into()));
            continue;
        }

        report.chunks += store.upsert(chunks).await?;
        info!(file = %path.display(), aircraft = %aircraft, "Ingested markdown");
        report.ingested.push(path);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryVectorStore;
    use crate::test_support::KeywordEmbedder;
    use aerobrain_core::retrieval::SearchFilter;
    use std::sync::Arc;

    #[test]
    fn forbidden_names() {
        assert!(is_forbidden_filename("AMM_A320_Chapter29.pdf"));
        assert!(is_forbidden_filename("fcom-vol1.pdf"));
        assert!(is_forbidden_filename("A320_SRM_53.pdf"));
        assert!(is_forbidden_filename("b737_tsm.pdf"));
        assert!(!is_forbidden_filename("A320_MMEL_rev12.pdf"));
        assert!(!is_forbidden_filename("EASA_AMC_Part145.pdf"));
    }

    #[test]
    fn aircraft_detection() {
        assert_eq!(detect_aircraft("B737MAX_refs"), Some("B737MAX"));
        assert_eq!(detect_aircraft("737ng"), Some("B737NG"));
        assert_eq!(detect_aircraft("Boeing_777"), Some("B777"));
        assert_eq!(detect_aircraft("common"), Some("COMMON"));
        assert_eq!(detect_aircraft("misc"), None);
    }

    #[test]
    fn doc_type_detection() {
        assert_eq!(detect_doc_type("EICAS_Translator"), "TRANSLATOR");
        assert_eq!(detect_doc_type("few_shot_examples"), "FEW_SHOT");
        assert_eq!(detect_doc_type("Acronyms"), "ACRONYMS");
        assert_eq!(detect_doc_type("hydraulics"), "REFERENCE");
    }

    #[test]
    fn chunk_ids_are_tenant_prefixed() {
        assert_eq!(chunk_id(TenantId(3), "mmel", "A320", 2), "3_mmel_A320_2");
        assert_eq!(chunk_id(TenantId(3), "mmel", "", 0), "3_mmel_unknown_0");
    }

    #[test]
    fn small_text_is_one_chunk() {
        let chunks = chunk_text("First.\n\nSecond.", 100);
        assert_eq!(chunks, vec!["First.\n\nSecond.".to_string()]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text("  \n\n ", 100).is_empty());
    }

    #[test]
    fn paragraphs_flush_at_limit() {
        let text = format!("{}\n\n{}", "a".repeat(60), "b".repeat(60));
        let chunks = chunk_text(&text, 100);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn long_paragraph_splits_on_whitespace() {
        let text = "word ".repeat(50);
        let chunks = chunk_text(&text, 32);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 32));
        assert!(chunks.iter().all(|c| !c.starts_with(' ') && c.contains("word")));
    }

    #[test]
    fn long_paragraph_is_char_boundary_safe() {
        let text = "é".repeat(25);
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 10);
    }

    #[tokio::test]
    async fn markdown_folder_ingestion_detects_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let max = dir.path().join("B737MAX");
        std::fs::create_dir_all(&max).unwrap();
        std::fs::write(max.join("acronyms.md"), "LGCIU: landing gear control interface unit").unwrap();
        std::fs::write(max.join("empty.md"), "   ").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = InMemoryVectorStore::new(Arc::new(KeywordEmbedder));
        let report = ingest_markdown_dir(&store, dir.path(), TenantId(1), None)
            .await
            .unwrap();

        assert_eq!(report.ingested.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.chunks, 1);

        let hits = store
            .query(
                "landing gear",
                5,
                &SearchFilter::tenant(TenantId(1)).with_aircraft(Some("B737MAX")),
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.doc_type, "ACRONYMS");
        assert_eq!(hits[0].metadata.doc_title, "acronyms");
    }

    #[tokio::test]
    async fn explicit_aircraft_overrides_folder() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("777");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("apu.md"), "APU start sequence").unwrap();

        let store = InMemoryVectorStore::new(Arc::new(KeywordEmbedder));
        ingest_markdown_dir(&store, dir.path(), TenantId(1), Some("a330"))
            .await
            .unwrap();

        let hits = store
            .query("apu", 5, &SearchFilter::tenant(TenantId(1)).with_aircraft(Some("A330")))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn pdf_ingestion_skips_forbidden_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("AMM_chapter29.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("A320_MMEL.pdf"), b"not really a pdf").unwrap();

        let store = InMemoryVectorStore::new(Arc::new(KeywordEmbedder));
        let report = ingest_pdf_dir(&store, dir.path(), &IngestOptions::default())
            .await
            .unwrap();

        assert!(report.ingested.is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().any(|(_, why)| why.contains("OEM")));
        assert_eq!(store.count(TenantId::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let store = InMemoryVectorStore::new(Arc::new(KeywordEmbedder));
        let err = ingest_pdf_dir(&store, Path::new("/nonexistent/docs"), &IngestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotADirectory(_)));
    }
}
