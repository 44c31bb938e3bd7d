use bytes::BufMut;
use common::errors::ApiError;
use futures::TryStreamExt;
use lazy_static::lazy_static;
use mime::Mime;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tokio::fs;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::{multipart, Filter, Rejection};

/// Hard cap on a whole multipart request, matching the per-file limit.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp", "pdf"];

lazy_static! {
    static ref UPLOADS_ROOT: PathBuf =
        PathBuf::from(env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()));
}

#[derive(Clone, Copy, Debug)]
pub enum UploadKind {
    Avatar,
    Cover,
    Material,
}

impl UploadKind {
    fn dir(self) -> &'static str {
        match self {
            UploadKind::Avatar => "avatars",
            UploadKind::Cover => "covers",
            UploadKind::Material => "materials",
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub original_name: String,
    pub extension: String,
    pub mime: Mime,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn size(&self) -> i64 {
        self.bytes.len() as i64
    }

    pub fn is_image(&self) -> bool {
        self.mime.type_() == mime::IMAGE && self.extension != "pdf"
    }

    /// Images and PDFs only, checked against both extension and mime type.
    pub fn is_allowed(&self) -> bool {
        let extension_ok = ALLOWED_EXTENSIONS.contains(&self.extension.as_str());
        let mime_ok = self.mime.type_() == mime::IMAGE
            || (self.mime.type_() == mime::APPLICATION && self.mime.subtype() == "pdf");
        extension_ok && mime_ok
    }

    /// Picks a stored location under the uploads root without touching the
    /// disk. The bytes only land there once [`PendingFile::write`] is
    /// called, after the database work that records the path.
    pub fn reserve(&self, kind: UploadKind) -> PendingFile<'_> {
        let dir = UPLOADS_ROOT.join(kind.dir());
        let stored_name = format!("{}.{}", Uuid::new_v4(), self.extension);
        let path = format!(
            "{}/{}/{}",
            UPLOADS_ROOT.display(),
            kind.dir(),
            stored_name
        )
        .replace('\\', "/");

        PendingFile {
            file: self,
            dir,
            stored_name,
            path,
        }
    }
}

/// An upload with its location decided but nothing written yet, so a failed
/// request leaves no stray file behind.
#[derive(Debug)]
pub struct PendingFile<'a> {
    file: &'a UploadedFile,
    dir: PathBuf,
    stored_name: String,
    path: String,
}

impl PendingFile<'_> {
    /// The path as kept in the database.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn write(self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&self.stored_name), &self.file.bytes).await?;
        Ok(())
    }
}

/// All parts of a multipart form, split into plain text fields and files.
#[derive(Debug, Default)]
pub struct FormFields {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormFields {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name)
    }
}

async fn read_form(form: FormData) -> Result<FormFields, Rejection> {
    let parts: Vec<Part> = form.try_collect().await.map_err(|e| {
        ApiError::new_with_message_and_status(&e.to_string(), StatusCode::BAD_REQUEST)
            .into_rejection()
    })?;

    let mut fields = FormFields::default();

    for part in parts {
        let name = part.name().to_string();
        let file_name = part.filename().map(str::to_string);
        let content_type = part.content_type().map(str::to_string);

        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut vec, data| {
                vec.put(data);
                async move { Ok(vec) }
            })
            .await
            .map_err(|e| {
                ApiError::new_with_message_and_status(&e.to_string(), StatusCode::BAD_REQUEST)
                    .into_rejection()
            })?;

        match file_name {
            Some(file_name) => {
                let extension = file_name
                    .rsplit('.')
                    .next()
                    .unwrap_or_default()
                    .to_lowercase();
                let mime = content_type
                    .and_then(|it| Mime::from_str(&it).ok())
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM);

                fields.files.insert(
                    name,
                    UploadedFile {
                        original_name: file_name,
                        extension,
                        mime,
                        bytes,
                    },
                );
            }
            None => {
                fields
                    .texts
                    .insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }
    }

    Ok(fields)
}

pub fn multipart() -> impl Filter<Extract = (FormFields,), Error = Rejection> + Clone {
    multipart::form().max_length(MAX_UPLOAD_BYTES).and_then(read_form)
}
