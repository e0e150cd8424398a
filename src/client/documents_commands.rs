use clap::Subcommand;

use crate::models::DocumentStore;
use crate::views::StorageConfig;

#[derive(Subcommand, Debug)]
pub enum DocumentsCommands {
    /// List the stored documents with their size
    List,
}

pub async fn list_documents(storage: StorageConfig) -> anyhow::Result<()> {
    let store = DocumentStore::new(storage.data_path);
    let documents = store.list().await?;
    for document in &documents {
        let kind = match document.kind() {
            Some(_) => "",
            None => " (cannot be displayed)",
        };
        println!("{} ({} bytes){kind}", document.name, document.content.len());
    }
    if documents.is_empty() {
        tracing::info!(root = %store.root().display(), "No document found");
    }
    Ok(())
}
