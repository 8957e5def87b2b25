//! Shared test utilities for the fitting-room test suite.
//!
//! Provides in-memory image fixtures, canned backend responses and
//! hand-written collaborators that record how they were called.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let backend = Arc::new(ScriptedBackend::new(vec![Ok(text_response("L"))]));
//! // ... drive a GenerationClient over `backend` ...
//! assert_eq!(backend.calls().len(), 1);
//! ```

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use crate::credentials::KeySelector;
use crate::error::PipelineError;
use crate::fetch::ProductImageSource;
use crate::generation::GenerationBackend;
use crate::generation::dto::{
    Candidate, Content, FINISH_REASON_SAFETY, GenerateContentRequest, GenerateContentResponse,
    InlineData, Part,
};
use crate::payload::ImagePayload;
use crate::retry::CallFailure;
use crate::types::{ImageLocator, Product};

// =========================================================================
// Image fixtures
// =========================================================================

/// Opaque PNG of the given size with a simple gradient.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Fully transparent PNG; flattening it should yield the backdrop colour.
pub fn transparent_png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn png_payload(width: u32, height: u32) -> ImagePayload {
    ImagePayload::new("image/png", png_bytes(width, height))
}

pub fn sample_product(id: &str) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Organic Cotton {id}"),
        description: "Relaxed fit, heather grey".to_string(),
        image: ImageLocator::Embedded(png_payload(48, 48)),
    }
}

// =========================================================================
// Canned backend responses
// =========================================================================

fn response_with(finish_reason: &str, parts: Vec<Part>) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            finish_reason: Some(finish_reason.to_string()),
            content: Some(Content {
                role: Some("model".to_string()),
                parts,
            }),
        }],
    }
}

pub fn text_response(text: &str) -> GenerateContentResponse {
    response_with("STOP", vec![Part::text(text)])
}

/// A composite response: a text preamble followed by an inline PNG.
pub fn image_response() -> GenerateContentResponse {
    response_with(
        "STOP",
        vec![
            Part::text("Here is the result."),
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: "image/png".to_string(),
                    data: BASE64.encode(png_bytes(8, 8)),
                },
            },
        ],
    )
}

pub fn safety_response() -> GenerateContentResponse {
    response_with(FINISH_REASON_SAFETY, Vec::new())
}

// =========================================================================
// Recording collaborators
// =========================================================================

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api_key: String,
    pub model: String,
    pub request: GenerateContentRequest,
}

/// Generation backend that replays a fixed script of results in order.
///
/// Calls past the end of the script fail with a non-retryable error.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<GenerateContentResponse, CallFailure>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<GenerateContentResponse, CallFailure>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Models called, in order.
    pub fn models(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.model).collect()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, CallFailure> {
        self.calls.lock().unwrap().push(RecordedCall {
            api_key: api_key.to_string(),
            model: model.to_string(),
            request: request.clone(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CallFailure::new("script exhausted")))
    }
}

/// Product image source returning a fixed result and recording locators.
pub struct StubProductSource {
    result: Result<ImagePayload, PipelineError>,
    requests: Mutex<Vec<ImageLocator>>,
}

impl StubProductSource {
    pub fn returning(payload: ImagePayload) -> Self {
        Self {
            result: Ok(payload),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: PipelineError) -> Self {
        Self {
            result: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ImageLocator> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductImageSource for StubProductSource {
    async fn fetch(&self, locator: &ImageLocator) -> Result<ImagePayload, PipelineError> {
        self.requests.lock().unwrap().push(locator.clone());
        self.result.clone()
    }
}

/// Key selector with a fixed "selected" answer that counts prompts.
pub struct RecordingKeySelector {
    selected: AtomicBool,
    opened: AtomicUsize,
}

impl RecordingKeySelector {
    pub fn new(selected: bool) -> Self {
        Self {
            selected: AtomicBool::new(selected),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySelector for RecordingKeySelector {
    async fn has_selected_key(&self) -> bool {
        self.selected.load(Ordering::SeqCst)
    }

    async fn open_select_key(&self) {
        self.opened.fetch_add(1, Ordering::SeqCst);
    }
}

// =========================================================================
// Local HTTP server
// =========================================================================

/// Serve exactly one HTTP/1.1 response on a loopback port.
///
/// Returns the server's base URL and a handle resolving to the raw request
/// (head and body) the client sent.
pub async fn serve_once(
    status: &str,
    content_type: &str,
    body: Vec<u8>,
) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let head = format!(
        "HTTP/1.1 {status}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    let url = Url::parse(&format!("http://{addr}/")).unwrap();
    (url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
