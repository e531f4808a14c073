//! CLI route: single route table and run context. Dispatches to the container and presentation.

use crate::cli::parse::{Commands, ListFormat};
use crate::cli::presentation::{
    format_document, format_documents, format_info, ContainerInfo, DocumentRow,
};
use crate::cli::{command_name, is_mutation};
use crate::config::{ConfigLoader, StoreConfig};
use crate::container::Container;
use crate::cursor::ResultCursor;
use crate::engine::Manager;
use crate::error::StoreError;
use crate::query::EvaluationType;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Runtime context for CLI execution: one open container plus the loaded config.
pub struct RunContext {
    container: Container,
    config: StoreConfig,
}

impl RunContext {
    /// Load config (optionally from `config_path`) and open the container at `container_path`.
    pub fn new(container_path: PathBuf, config_path: Option<PathBuf>) -> Result<Self, StoreError> {
        let config = ConfigLoader::load_optional(config_path.as_deref())?;
        Self::with_config(container_path, config)
    }

    pub fn with_config(container_path: PathBuf, config: StoreConfig) -> Result<Self, StoreError> {
        let container =
            Container::open_with(&Manager::new(), &container_path, &config.open_options())?;
        Ok(Self { container, config })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&mut self, command: &Commands) -> Result<String, StoreError> {
        let started = Instant::now();
        let name = command_name(command);
        let span = tracing::info_span!("command", command = name);
        let _guard = span.enter();

        let result = self.execute_inner(command);
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(duration_ms, mutation = is_mutation(command), "Command finished"),
            Err(e) => warn!(duration_ms, error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&mut self, command: &Commands) -> Result<String, StoreError> {
        match command {
            Commands::PutFile {
                files,
                replace,
                name,
            } => self.handle_put_file(files, *replace, name.as_deref()),
            Commands::PutXml {
                name,
                content,
                replace,
                metadata,
            } => {
                let content = match content {
                    Some(content) => content.clone(),
                    None => read_stdin()?,
                };
                let metadata = parse_metadata(metadata)?;
                self.container
                    .put_xml_with_metadata(name, &content, metadata, *replace)?;
                Ok(format!("Stored {}", name))
            }
            Commands::Import {
                dir,
                replace,
                extension,
            } => self.handle_import(dir, *replace, extension),
            Commands::Merge { source, replace } => {
                let merged = self.container.merge(source, *replace)?;
                Ok(format!(
                    "Merged {} document(s) from {}",
                    merged,
                    source.display()
                ))
            }
            Commands::Remove { names } => {
                for name in names {
                    self.container.remove(name)?;
                }
                Ok(format!("Removed {} document(s)", names.len()))
            }
            Commands::Get { name, format } => {
                let doc = self.container.get_document(name)?;
                format_document(&DocumentRow::from_document(&doc)?, format)
            }
            Commands::Size => Ok(self.container.size().to_string()),
            Commands::All { format } => {
                let rows = collect_rows(self.container.get_all())?;
                format_documents(&rows, *format)
            }
            Commands::Query {
                expression,
                format,
                eager,
                strict,
            } => self.handle_query(expression, *format, *eager, *strict),
            Commands::Info { format } => {
                let info = ContainerInfo {
                    path: self.container.path().to_path_buf(),
                    alias: self.container.alias().to_string(),
                    mode: self.container.access_mode(),
                    documents: self.container.size(),
                };
                format_info(&info, format)
            }
        }
    }

    fn handle_put_file(
        &mut self,
        files: &[PathBuf],
        replace: bool,
        name: Option<&str>,
    ) -> Result<String, StoreError> {
        match (name, files) {
            (Some(name), [file]) => {
                self.container.put_file_as(name, file, replace)?;
                Ok(format!("Stored {}", name))
            }
            (Some(_), _) => Err(StoreError::InvalidName(
                "--name requires exactly one file".to_string(),
            )),
            (None, files) => {
                for file in files {
                    self.container.put_file(file, replace)?;
                }
                Ok(format!("Stored {} document(s)", files.len()))
            }
        }
    }

    /// Store every file under `dir` with the given extension, named by its
    /// path relative to `dir` with `/` separators.
    fn handle_import(
        &mut self,
        dir: &Path,
        replace: bool,
        extension: &str,
    ) -> Result<String, StoreError> {
        if !dir.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {}", dir.display()),
            )));
        }

        let mut imported = 0u64;
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(extension)
            {
                continue;
            }
            let name = document_name(dir, path);
            self.container.put_file_as(&name, path, replace)?;
            debug!(name = %name, "Imported");
            imported += 1;
        }
        info!(dir = %dir.display(), imported, "Import complete");
        Ok(format!("Imported {} document(s)", imported))
    }

    fn handle_query(
        &self,
        expression: &str,
        format: ListFormat,
        eager: bool,
        strict: bool,
    ) -> Result<String, StoreError> {
        let mut binder = self.container.binder();
        if eager {
            binder = binder.evaluation(EvaluationType::Eager);
        }
        if strict {
            binder = binder.well_formed_only(false);
        }
        let rows = collect_rows(binder.run(expression)?)?;
        format_documents(&rows, format)
    }
}

fn collect_rows(cursor: ResultCursor<'_>) -> Result<Vec<DocumentRow>, StoreError> {
    cursor
        .map(|doc| doc.and_then(|doc| DocumentRow::from_document(&doc)))
        .collect()
}

fn document_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse `KEY=VALUE` entries; later keys overwrite earlier ones.
fn parse_metadata(entries: &[String]) -> Result<BTreeMap<String, String>, StoreError> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(StoreError::InvalidName(format!(
                "Metadata must be KEY=VALUE, got {:?}",
                entry
            ))),
        })
        .collect()
}

fn read_stdin() -> Result<String, StoreError> {
    let mut content = String::new();
    std::io::stdin().read_to_string(&mut content)?;
    Ok(content)
}
