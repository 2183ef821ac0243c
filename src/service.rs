//! # Service
//!
//! Client for the external slicing service. The service takes an STL as a
//! multipart upload, slices it and answers with the path of the generated
//! G-code, which is then downloaded separately.

use crate::{config::SlicingParameters, store::MeshFile, toolpaths::GcodeFile};
use log::{debug, info};
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use thiserror::Error;

pub const GCODE_EXTENSION: &str = ".gcode";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Slicing service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected reply from slicing service")]
    Json(#[from] serde_json::Error),
}

/// The two calls the slicing workflow needs from a service
pub trait SlicingService {
    /// Upload `model` for slicing, returns the path of the generated G-code
    fn submit(&self, model: &MeshFile, params: &SlicingParameters) -> Result<String, ServiceError>;

    /// Download the file at `path`
    fn fetch(&self, path: &str) -> Result<Vec<u8>, ServiceError>;
}

#[derive(Deserialize, Debug)]
struct SliceReply {
    #[serde(alias = "gcode")]
    gcode_path: String,
}

#[derive(Deserialize, Debug)]
struct ErrorReply {
    error: Option<String>,
    details: Option<String>,
}

/// Human readable message for a failed request, prefers the service's own
/// `error` and `details` fields
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorReply>(body) {
        Ok(ErrorReply {
            error: Some(error),
            details: Some(details),
        }) => format!("{}: {}", error, details.trim()),
        Ok(ErrorReply {
            error: Some(error),
            details: None,
        }) => error,
        _ => body.trim().to_string(),
    }
}

/// Error for a reply with a non success `status`
pub fn status_error(status: u16, body: &str) -> ServiceError {
    ServiceError::Status {
        status,
        message: error_message(body),
    }
}

/// Path of the generated G-code in a successful slice reply
///
/// # Examples
///
/// ```
/// use printer_plate::service::parse_reply;
/// let reply = r#"{"message": "Slicing complete", "gcode": "/files/a.gcode"}"#;
/// assert_eq!(parse_reply(reply).unwrap(), "/files/a.gcode");
/// ```
pub fn parse_reply(body: &str) -> Result<String, ServiceError> {
    let reply: SliceReply = serde_json::from_str(body)?;
    Ok(reply.gcode_path)
}

/// Form fields sent alongside the model
pub fn form_fields(params: &SlicingParameters) -> [(&'static str, String); 3] {
    [
        ("layer_height", params.layer_height.to_string()),
        ("infill", format!("{}%", params.infill_density)),
        ("nozzle", params.nozzle_size.to_string()),
    ]
}

pub struct HttpSlicingService {
    base: String,
    client: Client,
}

impl HttpSlicingService {
    pub fn new<S: Into<String>>(base: S) -> HttpSlicingService {
        HttpSlicingService {
            base: base.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base(&self) -> &str { &self.base }

    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(status_error(status.as_u16(), &body))
        }
    }
}

impl SlicingService for HttpSlicingService {
    fn submit(&self, model: &MeshFile, params: &SlicingParameters) -> Result<String, ServiceError> {
        let part = multipart::Part::bytes(model.bytes.clone())
            .file_name(model.name.clone())
            .mime_str("model/stl")?;
        let form = form_fields(params)
            .iter()
            .fold(multipart::Form::new().part("model", part), |form, (name, value)| {
                form.text(*name, value.clone())
            });
        let url = format!("{}/slice", self.base);
        info!("uploading {} ({} bytes) to {}", model.name, model.len(), url);
        let response = Self::check(self.client.post(&url).multipart(form).send()?)?;
        let gcode_path = parse_reply(&response.text()?)?;
        debug!("service generated {}", gcode_path);
        Ok(gcode_path)
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>, ServiceError> {
        let url = format!("{}{}", self.base, path);
        let response = Self::check(self.client.get(&url).send()?)?;
        Ok(response.bytes()?.to_vec())
    }
}

/// Name of the G-code produced from `mesh_name`
///
/// # Examples
///
/// ```
/// use printer_plate::service::gcode_name;
/// assert_eq!(gcode_name("benchy.STL"), "benchy.gcode");
/// assert_eq!(gcode_name("part"), "part.gcode");
/// ```
pub fn gcode_name(mesh_name: &str) -> String {
    let stem = match mesh_name.rfind('.') {
        Some(dot) if mesh_name[dot..].eq_ignore_ascii_case(".stl") => &mesh_name[..dot],
        _ => mesh_name,
    };
    format!("{}{}", stem, GCODE_EXTENSION)
}

/// Progress reported once the service accepted the model
pub const PROGRESS_SUBMITTED: u8 = 50;
/// Progress reported once the G-code is downloaded
pub const PROGRESS_FETCHED: u8 = 100;

/// Slice `file` and download the result
pub fn slice_file<S: SlicingService + ?Sized>(
    service: &S,
    file: &MeshFile,
    params: &SlicingParameters,
) -> Result<GcodeFile, ServiceError> {
    slice_file_reporting(service, file, params, |_| {})
}

/// Like [`slice_file`], calling `on_progress` after the upload and after the
/// download
pub fn slice_file_reporting<S, F>(
    service: &S,
    file: &MeshFile,
    params: &SlicingParameters,
    mut on_progress: F,
) -> Result<GcodeFile, ServiceError>
where
    S: SlicingService + ?Sized,
    F: FnMut(u8),
{
    let path = service.submit(file, params)?;
    on_progress(PROGRESS_SUBMITTED);
    let bytes = service.fetch(&path)?;
    on_progress(PROGRESS_FETCHED);
    info!("received {} bytes of G-code for {}", bytes.len(), file.name);
    Ok(GcodeFile::new(gcode_name(&file.name), bytes))
}
