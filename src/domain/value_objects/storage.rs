use bytes::Bytes;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UploadedObjectDto {
    pub path: String,
    pub url: String,
}

/// A file part pulled out of the multipart body, before validation.
#[derive(Debug, Clone, Default)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}
