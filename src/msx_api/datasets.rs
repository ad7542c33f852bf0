//! Dataset upload
//!
//! Local files are sent to the platform as a multipart form: one `file` part
//! plus any number of text fields, which the platform echoes back so callers
//! can attach their own metadata to an upload.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use reqwest::blocking::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::msx_api::client::MsxClient;
use crate::msx_api::envelope;
use crate::msx_api::types::MsxError;

/// Platform response to a dataset upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetUpload {
    /// Storage path assigned by the platform
    pub path: String,
    /// Pass-through fields and any other metadata returned with the upload
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Dataset operations, borrowed from a connected [`MsxClient`]
#[derive(Debug, Clone, Copy)]
pub struct Datasets<'a> {
    client: &'a MsxClient,
}

impl<'a> Datasets<'a> {
    pub(crate) fn new(client: &'a MsxClient) -> Self {
        Self { client }
    }

    /// Upload a local dataset file
    ///
    /// The extension must be one of
    /// [`Configuration::allowed_read_exts`](crate::config::Configuration::allowed_read_exts).
    /// Files of at least `min_stream_size` bytes are streamed from disk instead
    /// of being read into memory first.
    ///
    /// # Arguments
    ///
    /// * `file` - Path of the file to upload
    /// * `fields` - Extra form fields passed through to the platform
    ///
    /// # Example
    ///
    /// ```no_run
    /// use msx_sdk::{Identity, MsxClient};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = MsxClient::new(Identity::from_credentials("a@b.com", "secret"))?;
    /// let upload = client
    ///     .datasets()
    ///     .add("fixtures/nlp_train.csv", [("source", "nightly-export")])?;
    /// println!("Stored at {}", upload.path);
    /// # Ok(())
    /// # }
    /// ```
    pub fn add<I, K, V>(&self, file: impl AsRef<Path>, fields: I) -> Result<DatasetUpload, MsxError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let path = file.as_ref();
        self.check_extension(path)?;

        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(MsxError::UnsupportedFile(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("dataset")
            .to_string();

        self.upload(path, metadata.len(), file_name, fields)
    }

    /// Upload a dataset from any reader
    ///
    /// The reader is spooled into a scratch file under
    /// [`Configuration::temp_dir`](crate::config::Configuration::temp_dir) and
    /// sent like [`add`](Self::add). `file_name` is the name the platform sees
    /// and its extension must be allowed. The scratch file is removed when the
    /// upload finishes, whatever the outcome.
    pub fn add_reader<R, I, K, V>(
        &self,
        file_name: &str,
        mut reader: R,
        fields: I,
    ) -> Result<DatasetUpload, MsxError>
    where
        R: Read,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.check_extension(Path::new(file_name))?;
        let config = self.client.config();

        let mut spool = tempfile::Builder::new()
            .prefix("msx-")
            .tempfile_in(&config.temp_dir)?;
        let size = io::copy(&mut reader, &mut spool)?;
        spool.flush()?;

        tracing::debug!(
            "Spooled {} ({} bytes) to {}",
            file_name,
            size,
            spool.path().display()
        );

        self.upload(spool.path(), size, file_name.to_string(), fields)
    }

    fn check_extension(&self, path: &Path) -> Result<(), MsxError> {
        let config = self.client.config();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if extension.is_empty() || !config.is_allowed_extension(extension) {
            return Err(MsxError::UnsupportedFile(format!(
                "{} (allowed extensions: {})",
                path.display(),
                config.allowed_read_exts.join(", ")
            )));
        }
        Ok(())
    }

    fn upload<I, K, V>(
        &self,
        path: &Path,
        size: u64,
        file_name: String,
        fields: I,
    ) -> Result<DatasetUpload, MsxError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let part = if size >= self.client.config().min_stream_size {
            tracing::debug!("Streaming dataset {} ({} bytes)", path.display(), size);
            Part::reader_with_length(File::open(path)?, size)
        } else {
            Part::bytes(std::fs::read(path)?)
        };

        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.into(), value.into());
        }
        let form = form.part("file", part.file_name(file_name.clone()));

        let url = self.client.url("/datasets");
        let headers = self
            .client
            .with_org_header(self.client.authenticated_headers(false, true)?)?;

        tracing::info!("Uploading dataset {} to {}", file_name, url);

        let request = self.client.http().post(&url).headers(headers).multipart(form);
        let raw = self.client.execute(request, "dataset upload")?;
        let upload: DatasetUpload = envelope::classify(&raw, Some("dataset upload"))?;

        tracing::info!("Dataset uploaded: path={}", upload.path);
        Ok(upload)
    }
}
