//! Document ingestion: discover source files, extract text, chunk, index.
//!
//! ```text
//! raw_docs/ ──walk──▶ [.pdf .txt .md] ──extract──▶ text ──split──▶ chunks
//!                                                                   │
//!                        EvidenceIndex::build + persist ◀───────────┘
//! ```

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use debate_core::index::{Embedder, EvidenceIndex, IndexError, Metadata};
use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{error, info, warn};

/// File extensions picked up from the documents directory.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "txt", "md"];

/// Separators tried in order by [`TextSplitter`]; `""` splits per char.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("documents directory {} did not exist; created it, add files and run again", .0.display())]
    MissingDirectory(PathBuf),

    #[error("no .pdf, .txt or .md files found in {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("no text chunks extracted from {files} file(s)")]
    NoChunks { files: usize },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract PDF text from {}: {reason}", path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Supported files under `dir`, sorted by path.
pub fn discover_documents(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkBuilder::new(dir).hidden(true).git_ignore(true).build();

    for entry in walker.flatten() {
        let path = entry.path();
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SUPPORTED_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
            .unwrap_or(false);
        if path.is_file() && supported {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}

/// Plain text of one document. PDFs are read page by page.
pub fn extract_text(path: &Path) -> Result<String, IngestError> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if !is_pdf {
        return std::fs::read_to_string(path).map_err(|source| IngestError::Read {
            path: path.to_path_buf(),
            source,
        });
    }

    let pdf_err = |reason: String| IngestError::Pdf {
        path: path.to_path_buf(),
        reason,
    };
    let doc = lopdf::Document::load(path).map_err(|e| pdf_err(e.to_string()))?;

    let mut text = String::new();
    for page in doc.get_pages().keys() {
        match doc.extract_text(&[*page]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => warn!(path = %path.display(), page, "Skipping unreadable page: {e}"),
        }
    }
    info!(path = %path.display(), chars = text.len(), "Extracted PDF text");
    Ok(text)
}

/// Recursive character splitter.
///
/// Splits on the first separator present in the text, merges the pieces
/// back into chunks of at most `chunk_size` chars carrying up to
/// `chunk_overlap` chars of the previous chunk, and recurses with the next
/// separator into any piece that is still too long.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, rest): (&str, &[&str]) = match separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
        {
            Some(i) => (separators[i], &separators[i + 1..]),
            None => ("", &[]),
        };

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut short: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                short.push(piece);
                continue;
            }
            if !short.is_empty() {
                chunks.extend(self.merge(&short, separator));
                short.clear();
            }
            if rest.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, rest));
            }
        }
        if !short.is_empty() {
            chunks.extend(self.merge(&short, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        let joiner = |window: &VecDeque<&str>| if window.is_empty() { 0 } else { sep_len };

        for &piece in pieces {
            let len = char_len(piece);

            if !window.is_empty() && total + len + joiner(&window) > self.chunk_size {
                chunks.extend(join(&window, separator));
                // Drop from the front until only the overlap remains
                while total > self.chunk_overlap
                    || (total > 0 && total + len + joiner(&window) > self.chunk_size)
                {
                    let Some(first) = window.pop_front() else {
                        break;
                    };
                    total -= char_len(first) + joiner(&window);
                }
            }

            total += len + joiner(&window);
            window.push_back(piece);
        }

        chunks.extend(join(&window, separator));
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join(window: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Chunks and their metadata, ready for [`EvidenceIndex::build`].
#[derive(Debug, Default)]
pub struct Corpus {
    pub texts: Vec<String>,
    pub metadata: Vec<Metadata>,
    pub files: usize,
}

impl Corpus {
    fn push_file(&mut self, source: &str, chunks: Vec<String>) {
        for chunk in chunks {
            let mut meta = Metadata::new();
            meta.insert("source".to_string(), source.to_string());
            meta.insert("chunk_index".to_string(), self.texts.len().to_string());
            self.texts.push(chunk);
            self.metadata.push(meta);
        }
        self.files += 1;
    }
}

/// Extract and chunk every supported file under `dir`.
///
/// A missing directory is created and reported as an error so the caller
/// can tell the user where to put documents. Unreadable files are skipped.
pub fn collect_corpus(dir: &Path, splitter: &TextSplitter) -> Result<Corpus, IngestError> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "Documents directory does not exist. Creating it...");
        std::fs::create_dir_all(dir).map_err(|source| IngestError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        return Err(IngestError::MissingDirectory(dir.to_path_buf()));
    }

    let files = discover_documents(dir);
    if files.is_empty() {
        warn!(dir = %dir.display(), "No documents found");
        return Err(IngestError::NoDocuments(dir.to_path_buf()));
    }
    info!(count = files.len(), "Found documents to process");

    let mut corpus = Corpus::default();
    for path in &files {
        let text = match extract_text(path) {
            Ok(text) => text,
            Err(e) => {
                error!("Error processing {}: {e}", path.display());
                continue;
            }
        };
        let chunks = splitter.split(&text);
        info!(path = %path.display(), chunks = chunks.len(), "Split document into chunks");

        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        corpus.push_file(&source, chunks);
    }

    if corpus.texts.is_empty() {
        return Err(IngestError::NoChunks { files: files.len() });
    }
    Ok(corpus)
}

/// Build an index from the documents under `dir` and persist it at `base`.
pub async fn ingest(
    dir: &Path,
    base: &Path,
    splitter: &TextSplitter,
    embedder: Arc<dyn Embedder>,
) -> Result<EvidenceIndex, IngestError> {
    let corpus = collect_corpus(dir, splitter)?;
    let files = corpus.files;

    let mut index = EvidenceIndex::new(embedder);
    index.build(corpus.texts, Some(corpus.metadata)).await?;
    index.persist(base)?;

    info!(
        files,
        chunks = index.len(),
        base = %base.display(),
        "Successfully ingested documents into evidence index"
    );
    Ok(index)
}
