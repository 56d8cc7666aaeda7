//! Translation files stored as JSON documents in a directory on disk.

use std::{
    io::ErrorKind,
    path::{Path as FilePath, PathBuf},
};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};

use crate::{
    AppState, Error,
    auth::Claims,
    response::{Envelope, codes, success},
};

/// The files that ship with the application and cannot be deleted.
pub const DEFAULT_TRANSLATION_FILES: [&str; 2] = ["fa.json", "en.json"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationFile {
    pub name: String,
    pub label: String,
    /// The file name without the `.json` extension.
    pub language: String,
    pub is_default: bool,
}

impl TranslationFile {
    fn from_file_name(name: String) -> Self {
        let language = name.trim_end_matches(".json").to_owned();

        Self {
            label: name.clone(),
            is_default: DEFAULT_TRANSLATION_FILES.contains(&name.as_str()),
            language,
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTranslationFile {
    pub file_name: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationContent {
    pub content: Value,
}

/// The state needed by the translation endpoints.
#[derive(Debug, Clone)]
pub struct TranslationState {
    pub translations_dir: PathBuf,
}

impl FromRef<AppState> for TranslationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            translations_dir: state.translations_dir.clone(),
        }
    }
}

/// Check that `file_name` is a bare `.json` file name and return its path in `dir`.
fn translation_path(dir: &FilePath, file_name: &str) -> Result<PathBuf, Error> {
    let is_plain_name = !file_name.is_empty()
        && !file_name.contains(['/', '\\'])
        && !file_name.contains("..");

    if !is_plain_name || !file_name.ends_with(".json") || file_name == ".json" {
        return Err(Error::InvalidTranslationFileName(file_name.to_owned()));
    }

    Ok(dir.join(file_name))
}

fn map_io_error(error: std::io::Error, file_name: &str) -> Error {
    match error.kind() {
        ErrorKind::NotFound => Error::TranslationFileNotFound(file_name.to_owned()),
        ErrorKind::AlreadyExists => Error::TranslationFileExists(file_name.to_owned()),
        _ => {
            tracing::error!("could not access translation file {file_name}: {error}");
            Error::FileSystemError(error.to_string())
        }
    }
}

async fn ensure_translations_dir(dir: &FilePath) -> Result<(), Error> {
    fs::create_dir_all(dir).await.map_err(|error| {
        tracing::error!("could not create {}: {error}", dir.display());
        Error::FileSystemError(error.to_string())
    })
}

async fn write_json(path: &FilePath, content: &Value, file_name: &str) -> Result<(), Error> {
    let text = serde_json::to_string_pretty(content)?;

    fs::write(path, text)
        .await
        .map_err(|error| map_io_error(error, file_name))
}

/// Create the default translation files as empty documents if they are missing.
pub async fn initialize_default_translations(dir: &FilePath) -> Result<(), Error> {
    ensure_translations_dir(dir).await?;

    for file_name in DEFAULT_TRANSLATION_FILES {
        let path = dir.join(file_name);

        match fs::try_exists(&path).await {
            Ok(true) => {}
            Ok(false) => {
                write_json(&path, &Value::Object(Default::default()), file_name).await?;
                tracing::info!("created empty translation file {}", path.display());
            }
            Err(error) => return Err(map_io_error(error, file_name)),
        }
    }

    Ok(())
}

/// List the `.json` files in `dir` sorted by name.
pub async fn list_translation_files(dir: &FilePath) -> Result<Vec<TranslationFile>, Error> {
    ensure_translations_dir(dir).await?;

    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|error| Error::FileSystemError(error.to_string()))?;
    let mut files = Vec::new();

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|error| Error::FileSystemError(error.to_string()))?
    {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };

        if name.ends_with(".json") {
            files.push(TranslationFile::from_file_name(name));
        }
    }

    files.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(files)
}

/// Write a new translation file, failing if one with the same name exists.
pub async fn create_translation_file(
    dir: &FilePath,
    new_file: &NewTranslationFile,
) -> Result<TranslationFile, Error> {
    let path = translation_path(dir, &new_file.file_name)?;
    ensure_translations_dir(dir).await?;

    let text = serde_json::to_string_pretty(&new_file.content)?;
    let file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await
        .map_err(|error| map_io_error(error, &new_file.file_name))?;
    write_or_remove(file, &path, &text, &new_file.file_name).await?;

    Ok(TranslationFile::from_file_name(new_file.file_name.clone()))
}

/// Write `text` to the freshly created file at `path`.
///
/// A file that could not be written completely is removed again.
async fn write_or_remove<W: AsyncWrite + Unpin>(
    mut writer: W,
    path: &FilePath,
    text: &str,
    file_name: &str,
) -> Result<(), Error> {
    let written = match writer.write_all(text.as_bytes()).await {
        Ok(()) => writer.flush().await,
        Err(error) => Err(error),
    };

    let Err(error) = written else {
        return Ok(());
    };

    drop(writer);
    if let Err(remove_error) = fs::remove_file(path).await {
        tracing::error!(
            "could not remove incomplete translation file {}: {remove_error}",
            path.display()
        );
    }

    Err(map_io_error(error, file_name))
}

pub async fn read_translation_file(dir: &FilePath, file_name: &str) -> Result<Value, Error> {
    let path = translation_path(dir, file_name)?;

    let text = fs::read_to_string(&path)
        .await
        .map_err(|error| map_io_error(error, file_name))?;

    Ok(serde_json::from_str(&text)?)
}

/// Overwrite an existing translation file.
pub async fn update_translation_file(
    dir: &FilePath,
    file_name: &str,
    content: &Value,
) -> Result<(), Error> {
    let path = translation_path(dir, file_name)?;

    if !fs::try_exists(&path)
        .await
        .map_err(|error| map_io_error(error, file_name))?
    {
        return Err(Error::TranslationFileNotFound(file_name.to_owned()));
    }

    write_json(&path, content, file_name).await
}

pub async fn delete_translation_file(dir: &FilePath, file_name: &str) -> Result<(), Error> {
    if DEFAULT_TRANSLATION_FILES.contains(&file_name) {
        return Err(Error::ProtectedTranslationFile(file_name.to_owned()));
    }

    let path = translation_path(dir, file_name)?;

    fs::remove_file(&path)
        .await
        .map_err(|error| map_io_error(error, file_name))
}

pub async fn get_translation_files_endpoint(
    State(state): State<TranslationState>,
) -> Result<Json<Envelope<Vec<TranslationFile>>>, Error> {
    let files = list_translation_files(&state.translations_dir).await?;

    Ok(success(codes::TRANSLATION_FILE_LIST, files))
}

pub async fn create_translation_file_endpoint(
    State(state): State<TranslationState>,
    Extension(claims): Extension<Claims>,
    Json(new_file): Json<NewTranslationFile>,
) -> Result<Json<Envelope<TranslationFile>>, Error> {
    let file = create_translation_file(&state.translations_dir, &new_file).await?;
    tracing::info!("{} created translation file {}", claims.id, file.name);

    Ok(success(codes::RECORD_CREATED, file))
}

pub async fn get_translation_file_content_endpoint(
    State(state): State<TranslationState>,
    Path(file_name): Path<String>,
) -> Result<Json<Envelope<TranslationContent>>, Error> {
    let content = read_translation_file(&state.translations_dir, &file_name).await?;

    Ok(success(
        codes::TRANSLATION_FILE_CONTENT,
        TranslationContent { content },
    ))
}

pub async fn update_translation_file_endpoint(
    State(state): State<TranslationState>,
    Extension(claims): Extension<Claims>,
    Path(file_name): Path<String>,
    Json(body): Json<TranslationContent>,
) -> Result<Json<Envelope<()>>, Error> {
    update_translation_file(&state.translations_dir, &file_name, &body.content).await?;
    tracing::info!("{} updated translation file {file_name}", claims.id);

    Ok(success(codes::RECORD_UPDATED, ()))
}

pub async fn delete_translation_file_endpoint(
    State(state): State<TranslationState>,
    Extension(claims): Extension<Claims>,
    Path(file_name): Path<String>,
) -> Result<Json<Envelope<()>>, Error> {
    delete_translation_file(&state.translations_dir, &file_name).await?;
    tracing::info!("{} deleted translation file {file_name}", claims.id);

    Ok(success(codes::RECORD_DELETED, ()))
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };

    use serde_json::json;
    use tokio::io::AsyncWrite;

    use crate::Error;

    use super::{
        NewTranslationFile, create_translation_file, delete_translation_file,
        initialize_default_translations, list_translation_files, read_translation_file,
        update_translation_file, write_or_remove,
    };

    /// A writer that fails like a full disk.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn new_file(file_name: &str) -> NewTranslationFile {
        NewTranslationFile {
            file_name: file_name.to_owned(),
            language: Some("de".to_owned()),
            content: json!({"common": {"save": "Speichern"}}),
        }
    }

    #[tokio::test]
    async fn list_is_sorted_and_marks_defaults() {
        let dir = tempfile::tempdir().unwrap();
        initialize_default_translations(dir.path()).await.unwrap();
        create_translation_file(dir.path(), &new_file("de.json"))
            .await
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = list_translation_files(dir.path()).await.unwrap();

        let names: Vec<(&str, bool)> = files
            .iter()
            .map(|file| (file.name.as_str(), file.is_default))
            .collect();
        assert_eq!(
            names,
            vec![("de.json", false), ("en.json", true), ("fa.json", true)]
        );
        assert_eq!(files[0].language, "de");
    }

    #[tokio::test]
    async fn directory_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("translations");

        assert_eq!(list_translation_files(&nested).await, Ok(vec![]));
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn create_read_update_delete() {
        let dir = tempfile::tempdir().unwrap();
        create_translation_file(dir.path(), &new_file("de.json"))
            .await
            .unwrap();

        assert_eq!(
            read_translation_file(dir.path(), "de.json").await,
            Ok(json!({"common": {"save": "Speichern"}}))
        );

        update_translation_file(dir.path(), "de.json", &json!({"common": {}}))
            .await
            .unwrap();
        assert_eq!(
            read_translation_file(dir.path(), "de.json").await,
            Ok(json!({"common": {}}))
        );

        delete_translation_file(dir.path(), "de.json").await.unwrap();
        assert_eq!(
            read_translation_file(dir.path(), "de.json").await,
            Err(Error::TranslationFileNotFound("de.json".to_owned()))
        );
    }

    #[tokio::test]
    async fn create_rejects_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        create_translation_file(dir.path(), &new_file("de.json"))
            .await
            .unwrap();

        assert_eq!(
            create_translation_file(dir.path(), &new_file("de.json")).await,
            Err(Error::TranslationFileExists("de.json".to_owned()))
        );
    }

    #[tokio::test]
    async fn file_names_must_be_plain_json_names() {
        let dir = tempfile::tempdir().unwrap();

        for file_name in ["de.txt", "../de.json", "sub/de.json", ".json", ""] {
            assert_eq!(
                create_translation_file(dir.path(), &new_file(file_name)).await,
                Err(Error::InvalidTranslationFileName(file_name.to_owned())),
                "{file_name:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn default_files_cannot_be_deleted() {
        let dir = tempfile::tempdir().unwrap();
        initialize_default_translations(dir.path()).await.unwrap();

        assert_eq!(
            delete_translation_file(dir.path(), "fa.json").await,
            Err(Error::ProtectedTranslationFile("fa.json".to_owned()))
        );
    }

    #[tokio::test]
    async fn update_and_delete_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(
            update_translation_file(dir.path(), "de.json", &json!({})).await,
            Err(Error::TranslationFileNotFound("de.json".to_owned()))
        );
        assert_eq!(
            delete_translation_file(dir.path(), "de.json").await,
            Err(Error::TranslationFileNotFound("de.json".to_owned()))
        );
    }

    #[tokio::test]
    async fn failed_write_removes_the_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("de.json");
        std::fs::write(&path, "").unwrap();

        let result = write_or_remove(FullDisk, &path, "{}", "de.json").await;

        assert!(matches!(result, Err(Error::FileSystemError(_))));
        assert!(!path.exists());
    }
}
