// File operations that do not fit the generic resource shape: multipart
// upload, copy/move between data providers, and bulk delete.

use super::{ApiClient, Body};
use crate::error::{Error, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::Method;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const FALLBACK_MIME: &str = "application/octet-stream";

/// One local file going to a data provider.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: PathBuf,
    pub data_provider_id: u64,
    pub group_id: u64,
    pub file_type: String,
}

impl UploadRequest {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string()
    }

    /// MIME type guessed from the extension.
    pub fn mime_type(&self) -> String {
        guess_mime(&self.path)
    }

    /// Read the file and build the form: text fields first, then the file
    /// part. Every part has a known length, so the request carries an exact
    /// Content-Length.
    pub fn to_form(&self) -> Result<Form> {
        if !self.path.is_file() {
            return Err(Error::Validation(format!(
                "File not found: {}",
                self.path.display()
            )));
        }
        let bytes = std::fs::read(&self.path)?;
        let part = Part::bytes(bytes)
            .file_name(self.file_name())
            .mime_str(&self.mime_type())
            .map_err(|e| Error::Validation(format!("Invalid MIME type: {}", e)))?;
        // Field names like `userfile[group_id]` go out verbatim.
        Ok(Form::new()
            .percent_encode_noop()
            .text("data_provider_id", self.data_provider_id.to_string())
            .text("userfile[group_id]", self.group_id.to_string())
            .text("file_type", self.file_type.clone())
            .part("upload_file", part))
    }
}

fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}

/// Whether a change-provider request copies or moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    /// Key whose mere presence selects the mode on the server.
    pub fn key(self) -> &'static str {
        match self {
            TransferMode::Copy => "copy",
            TransferMode::Move => "move",
        }
    }
}

/// Files to relocate and where to.
#[derive(Debug, Clone)]
pub struct ChangeProvider {
    pub file_ids: Vec<u64>,
    pub data_provider_id: u64,
    pub mode: TransferMode,
}

impl ChangeProvider {
    pub fn body(&self) -> Value {
        let mut body = json!({
            "file_ids": self.file_ids,
            "data_provider_id_for_mv_cp": self.data_provider_id,
        });
        body[self.mode.key()] = json!("");
        body
    }
}

impl ApiClient {
    /// POST a multipart upload to `userfiles`.
    pub fn upload_file(&self, req: &UploadRequest) -> Result<Value> {
        let form = req.to_form()?;
        self.request(
            Method::POST,
            "userfiles",
            &[] as &[(&str, &str)],
            Body::Multipart(form),
        )
    }

    /// Copy or move files to another data provider. The reply may carry a
    /// `background_activity_id` for the server-side job.
    pub fn change_provider(&self, req: &ChangeProvider) -> Result<Value> {
        if req.file_ids.is_empty() {
            return Err(Error::Validation("File ID(s) are required".into()));
        }
        self.post_json("userfiles/change_provider", &req.body())
    }

    /// Delete files by id.
    pub fn delete_files(&self, file_ids: &[u64]) -> Result<Value> {
        let ids: Vec<String> = file_ids.iter().map(u64::to_string).collect();
        let body = json!({ "file_ids": ids });
        self.request(
            Method::DELETE,
            "userfiles/delete_files",
            &[] as &[(&str, &str)],
            Body::Json(&body),
        )
    }
}
