use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use axum::http::StatusCode;
use thiserror::Error;

use crate::error::CmsError;

/// A stored file, identified by its name (extension included)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub content: Vec<u8>,
}

impl Document {
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_name(&self.name)
    }

    /// The content as text, invalid UTF-8 sequences replaced
    pub fn content_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }
}

/// The document formats that can be created and displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Markdown,
    PlainText,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match Path::new(name).extension().and_then(OsStr::to_str) {
            Some("md") => Some(Self::Markdown),
            Some("txt") => Some(Self::PlainText),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("A name is required.")]
    NameRequired,
    #[error("Only '.md' or '.txt' documents are supported.")]
    UnsupportedExtension { name: String },
    #[error("'{name}' already exists.")]
    AlreadyExists { name: String },
    #[error("'{name}' is not a valid document name.")]
    InvalidName { name: String },
    #[error("{name} does not exist.")]
    NotFound { name: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Errors caused by a bad name submitted in the creation form
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NameRequired
                | Self::UnsupportedExtension { .. }
                | Self::AlreadyExists { .. }
                | Self::InvalidName { .. }
        )
    }
}

impl CmsError for DocumentError {
    fn get_status(&self) -> StatusCode {
        match self {
            Self::NameRequired | Self::UnsupportedExtension { .. } | Self::AlreadyExists { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::InvalidName { .. } | Self::NotFound { .. } => StatusCode::FOUND,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn get_type(&self) -> &str {
        match self {
            Self::NameRequired => "flatcms:documents:NameRequired",
            Self::UnsupportedExtension { .. } => "flatcms:documents:UnsupportedExtension",
            Self::AlreadyExists { .. } => "flatcms:documents:AlreadyExists",
            Self::InvalidName { .. } => "flatcms:documents:InvalidName",
            Self::NotFound { .. } => "flatcms:documents:NotFound",
            Self::Io(_) => "flatcms:documents:Io",
        }
    }
}

/// Flat directory of documents, one file per document
///
/// Every operation hits the filesystem: there is no cache and no locking,
/// concurrent writes to the same document are resolved by the last writer.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, DocumentError> {
        let single_component = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\', '\0']);
        if !single_component {
            return Err(DocumentError::InvalidName {
                name: name.to_owned(),
            });
        }
        Ok(self.root.join(name))
    }

    /// Every regular file of the store directory, sorted by name
    #[tracing::instrument(skip(self), fields(root = %self.root.display()), err, level = "debug")]
    pub async fn list(&self) -> Result<Vec<Document>, DocumentError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::warn!("document directory does not exist");
                return Ok(vec![]);
            }
            Err(err) => return Err(err.into()),
        };
        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => {
                    tracing::warn!(?name, "skipping file with a non UTF-8 name");
                    continue;
                }
            };
            let content = tokio::fs::read(entry.path()).await?;
            documents.push(Document { name, content });
        }
        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }

    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn find(&self, name: &str) -> Result<Document, DocumentError> {
        let path = self.path_for(name)?;
        let not_found = || DocumentError::NotFound {
            name: name.to_owned(),
        };
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(not_found()),
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(err) => return Err(err.into()),
        }
        let content = tokio::fs::read(&path).await?;
        Ok(Document {
            name: name.to_owned(),
            content,
        })
    }

    /// Creates an empty document
    ///
    /// Never overwrites an existing file, even if it appears between the
    /// checks and the creation.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn create(&self, name: &str) -> Result<Document, DocumentError> {
        if name.is_empty() {
            return Err(DocumentError::NameRequired);
        }
        let path = self.path_for(name)?;
        if DocumentKind::from_name(name).is_none() {
            return Err(DocumentError::UnsupportedExtension {
                name: name.to_owned(),
            });
        }
        tokio::fs::create_dir_all(&self.root).await?;
        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match created {
            Ok(_) => Ok(Document {
                name: name.to_owned(),
                content: vec![],
            }),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(DocumentError::AlreadyExists {
                    name: name.to_owned(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces the whole content, creating the document if it is missing
    #[tracing::instrument(skip(self, content), fields(len = content.len()), level = "debug")]
    pub async fn update(&self, name: &str, content: &[u8]) -> Result<(), DocumentError> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    /// Removes a document. Removing a missing document succeeds.
    #[tracing::instrument(skip(self), level = "debug")]
    pub async fn delete(&self, name: &str) -> Result<(), DocumentError> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("document was already gone");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, DocumentStore) {
        common::setup_tracing_for_test();
        let dir = tempfile::tempdir().expect("temporary directory should be created");
        let store = DocumentStore::new(dir.path());
        (dir, store)
    }

    fn names(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.name.as_str()).collect()
    }

    #[rstest]
    #[case("notes.md", Some(DocumentKind::Markdown))]
    #[case("changes.txt", Some(DocumentKind::PlainText))]
    #[case("archive.tar.md", Some(DocumentKind::Markdown))]
    #[case("page.html", None)]
    #[case("README", None)]
    #[case(".md", None)]
    #[case("NOTES.MD", None)]
    fn kind_from_extension(#[case] name: &str, #[case] expected: Option<DocumentKind>) {
        assert_eq!(DocumentKind::from_name(name), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn create_then_list_has_empty_document() {
        let (_dir, store) = store();
        store.create("about.md").await.unwrap();
        store.create("changes.txt").await.unwrap();

        let documents = store.list().await.unwrap();
        assert_eq!(names(&documents), vec!["about.md", "changes.txt"]);
        assert!(documents.iter().all(|d| d.content.is_empty()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn create_without_name() {
        let (_dir, store) = store();
        let err = store.create("").await.unwrap_err();
        assert!(matches!(err, DocumentError::NameRequired));
        assert_eq!(err.to_string(), "A name is required.");
    }

    #[rstest]
    #[case("page.html")]
    #[case("script.rb")]
    #[case("noextension")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn create_unsupported_extension_writes_nothing(#[case] name: &str) {
        let (dir, store) = store();
        let err = store.create(name).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only '.md' or '.txt' documents are supported."
        );
        assert_eq!(err.get_status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!dir.path().join(name).exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn create_duplicate_keeps_content() {
        let (_dir, store) = store();
        store.update("about.md", b"# Welcome!").await.unwrap();

        let err = store.create("about.md").await.unwrap_err();
        assert_eq!(err.to_string(), "'about.md' already exists.");
        assert!(err.is_validation());

        let document = store.find("about.md").await.unwrap();
        assert_eq!(document.content, b"# Welcome!");
    }

    #[rstest]
    #[case("../escape.md")]
    #[case("nested/file.txt")]
    #[case("..")]
    #[case("back\\slash.md")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn names_must_stay_in_the_directory(#[case] name: &str) {
        let (_dir, store) = store();
        assert!(matches!(
            store.create(name).await,
            Err(DocumentError::InvalidName { .. })
        ));
        assert!(matches!(
            store.update(name, b"x").await,
            Err(DocumentError::InvalidName { .. })
        ));
        assert!(matches!(
            store.find(name).await,
            Err(DocumentError::InvalidName { .. })
        ));
        assert!(matches!(
            store.delete(name).await,
            Err(DocumentError::InvalidName { .. })
        ));
    }

    #[rstest]
    #[case("")]
    #[case("new content")]
    #[case("line one\nline two\r\n\n# heading\n")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn update_then_find_round_trip(#[case] content: &str) {
        let (_dir, store) = store();
        store.update("changes.txt", b"Ruby 0.95 released").await.unwrap();
        store.update("changes.txt", content.as_bytes()).await.unwrap();

        let document = store.find("changes.txt").await.unwrap();
        assert_eq!(document.content_lossy(), content);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn update_creates_missing_document() {
        let (_dir, store) = store();
        store.update("fresh.md", b"hello").await.unwrap();
        assert_eq!(names(&store.list().await.unwrap()), vec!["fresh.md"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn delete_removes_document() {
        let (_dir, store) = store();
        store.create("about.md").await.unwrap();
        store.create("changes.txt").await.unwrap();

        store.delete("about.md").await.unwrap();

        assert_eq!(names(&store.list().await.unwrap()), vec!["changes.txt"]);
        let err = store.find("about.md").await.unwrap_err();
        assert_eq!(err.to_string(), "about.md does not exist.");
        assert_eq!(err.get_status(), StatusCode::FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn delete_missing_document_succeeds() {
        let (_dir, store) = store();
        store.delete("ghost.md").await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn list_skips_directories_and_keeps_other_extensions() {
        let (dir, store) = store();
        std::fs::create_dir(dir.path().join("drafts")).unwrap();
        std::fs::write(dir.path().join("legacy.html"), "<p>old</p>").unwrap();
        store.update("about.md", b"# Welcome!").await.unwrap();

        let documents = store.list().await.unwrap();
        assert_eq!(names(&documents), vec!["about.md", "legacy.html"]);
        assert!(matches!(
            store.find("drafts").await,
            Err(DocumentError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn missing_directory_lists_empty_and_is_created_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("data"));
        assert!(store.list().await.unwrap().is_empty());

        store.create("first.txt").await.unwrap();
        assert!(dir.path().join("data/first.txt").is_file());
    }
}
