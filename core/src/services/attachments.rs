//! `/attachments` endpoints.
//!
//! Uploads are a JSON array of `{name, content}` objects with the file bytes
//! base64-encoded in `content`. Files are read fully into memory first.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::http::HttpMethod;
use crate::response::Response;
use crate::types::Attachment;

pub trait AttachmentApi {
    fn upload(&self, files: &[UploadFile]) -> Result<(Vec<Attachment>, Response)>;
    /// Download the raw bytes of the attachment `attachment_id`.
    fn download(&self, attachment_id: &str) -> Result<(Vec<u8>, Response)>;
}

/// One entry of an upload payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFile {
    pub name: String,
    /// Base64 (standard alphabet, padded) encoding of the file bytes.
    pub content: String,
}

impl UploadFile {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            content: STANDARD.encode(bytes),
        }
    }

    /// Read `path` and name the upload after its final component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_bytes(name, &bytes))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Attachments<'a> {
    client: &'a Client,
}

impl<'a> Attachments<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Read every file in `paths` and upload them in one request.
    pub fn upload_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<(Vec<Attachment>, Response)> {
        let files = paths
            .iter()
            .map(UploadFile::from_path)
            .collect::<Result<Vec<_>>>()?;
        self.upload(&files)
    }
}

impl AttachmentApi for Attachments<'_> {
    fn upload(&self, files: &[UploadFile]) -> Result<(Vec<Attachment>, Response)> {
        let req = self
            .client
            .new_json_request(HttpMethod::Post, "/attachments", files)?;
        self.client.send_json(&req)
    }

    fn download(&self, attachment_id: &str) -> Result<(Vec<u8>, Response)> {
        let req = self
            .client
            .new_segment_request(HttpMethod::Get, "/attachments", attachment_id)?;
        self.client.send_bytes(&req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_standard_base64() {
        let file = UploadFile::from_bytes("a.txt", b"hello docbase");
        assert_eq!(file.content, "aGVsbG8gZG9jYmFzZQ==");
        assert_eq!(STANDARD.decode(&file.content).unwrap(), b"hello docbase");
    }

    #[test]
    fn from_path_uses_file_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image1.jpg");
        std::fs::write(&path, [0xff, 0xd8, 0xff, 0xe0]).unwrap();

        let file = UploadFile::from_path(&path).unwrap();
        assert_eq!(file.name, "image1.jpg");
        assert_eq!(STANDARD.decode(&file.content).unwrap(), vec![0xff, 0xd8, 0xff, 0xe0]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = UploadFile::from_path(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
