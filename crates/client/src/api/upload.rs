//! Ticket upload (multipart).

use std::path::Path;

use extickets_core::{EventDateTime, Price, Ticket};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use super::{ApiClient, endpoint, read_json};
use crate::error::{ClientError, ValidationError};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// A file attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Build an attachment, inferring the content type from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_owned();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Read an attachment from disk.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    fn is_pdf(&self) -> bool {
        self.bytes.starts_with(PDF_MAGIC)
            || (self.bytes.is_empty() && self.content_type == "application/pdf")
    }

    fn into_part(self) -> Result<Part, ClientError> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?)
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Everything the upload form collects.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub event_name: String,
    pub event_date_time: EventDateTime,
    pub venue: String,
    pub price: Price,
    /// Sent as the `eventImage` field.
    pub event_image: Attachment,
    /// The ticket PDF, sent as the `file` field.
    pub file: Attachment,
}

impl UploadRequest {
    /// Check the request before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a blank event name or venue, an
    /// image attachment that is not an image, or a ticket file that is not
    /// a PDF.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.event_name.trim().is_empty() {
            return Err(ValidationError::MissingField("event name"));
        }
        if self.venue.trim().is_empty() {
            return Err(ValidationError::MissingField("venue"));
        }
        if !self.event_image.is_image() {
            return Err(ValidationError::NotAnImage(self.event_image.file_name.clone()));
        }
        if !self.file.is_pdf() {
            return Err(ValidationError::NotAPdf(self.file.file_name.clone()));
        }
        Ok(())
    }

    fn into_form(self) -> Result<Form, ClientError> {
        Ok(Form::new()
            .text("eventName", self.event_name.trim().to_owned())
            .text("eventDateTime", self.event_date_time.to_wire())
            .text("venue", self.venue.trim().to_owned())
            .text("price", self.price.to_string())
            .part("eventImage", self.event_image.into_part()?)
            .part("file", self.file.into_part()?))
    }
}

impl ApiClient {
    /// Upload a ticket for review and return the ticket the backend created.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` before sending if the request is
    /// incomplete, `ClientError::Status` if the backend rejects it,
    /// `ClientError::Decode` if the created ticket cannot be read, and
    /// `ClientError::Http` on network failures.
    #[instrument(skip(self, token, request), fields(event = %request.event_name))]
    pub async fn upload_ticket(
        &self,
        token: &SecretString,
        request: UploadRequest,
    ) -> Result<Ticket, ClientError> {
        request.validate()?;
        let url = endpoint(&self.api_url, &["api", "tickets", "upload"])?;
        let form = request.into_form()?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .multipart(form)
            .send()
            .await?;

        read_json(response).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> UploadRequest {
        UploadRequest {
            event_name: "Gig".to_string(),
            event_date_time: EventDateTime::parse("2025-06-01T19:30").unwrap(),
            venue: "Hall".to_string(),
            price: Price::from(10),
            event_image: Attachment::new("poster.PNG", vec![0x89, b'P', b'N', b'G']),
            file: Attachment::new("ticket.pdf", b"%PDF-1.7 ...".to_vec()),
        }
    }

    #[test]
    fn test_content_type_inference() {
        assert_eq!(content_type_for("a.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("poster.PNG"), "image/png");
        assert_eq!(content_type_for("ticket.pdf"), "application/pdf");
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }

    #[test]
    fn test_valid_request() {
        assert_eq!(request().validate(), Ok(()));
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut r = request();
        r.event_name = "   ".to_string();
        assert_eq!(r.validate(), Err(ValidationError::MissingField("event name")));

        let mut r = request();
        r.venue = String::new();
        assert_eq!(r.validate(), Err(ValidationError::MissingField("venue")));
    }

    #[test]
    fn test_attachment_kinds_checked() {
        let mut r = request();
        r.event_image = Attachment::new("poster.pdf", b"%PDF-1.7".to_vec());
        assert!(matches!(r.validate(), Err(ValidationError::NotAnImage(_))));

        let mut r = request();
        r.file = Attachment::new("ticket.pdf", b"<html>".to_vec());
        assert!(matches!(r.validate(), Err(ValidationError::NotAPdf(_))));

        let mut r = request();
        r.file = Attachment::new("ticket.bin", b"%PDF-1.4".to_vec());
        assert_eq!(r.validate(), Ok(()), "magic bytes win over the name");
    }
}
