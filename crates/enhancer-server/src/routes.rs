// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request routing for the enhancer service.
//
// Routing is synchronous: the server calls `Router::handle` on the blocking
// pool, so handlers may run the pipeline directly.

use enhancer_core::config::{EnhancementConfig, SuperResolution};
use enhancer_core::error::{EnhancerError, Result};
use enhancer_core::human_errors::{Severity, humanize_error};
use enhancer_imaging::Enhancer;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::http::{HttpRequest, HttpResponse, extract_upload};

/// Service version reported by `/` and `/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Routes requests to handlers and applies CORS headers.
#[derive(Debug)]
pub struct Router {
    enhancer: Enhancer,
    allowed_origins: Vec<String>,
}

impl Router {
    pub fn new(enhancer: Enhancer, allowed_origins: Vec<String>) -> Self {
        Self {
            enhancer,
            allowed_origins,
        }
    }

    /// Produce the response for `request`. Never fails; errors become JSON
    /// error bodies.
    pub fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let response = if request.method() == "OPTIONS" {
            preflight(request)
        } else {
            self.route(request)
        };
        self.apply_cors(request, response)
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let (allowed, result): (&str, Option<Result<HttpResponse>>) = match request.path() {
            "/" => ("GET", (request.method() == "GET").then(|| Ok(root()))),
            "/health" => ("GET", (request.method() == "GET").then(|| Ok(health()))),
            "/enhance" => (
                "POST",
                (request.method() == "POST").then(|| self.enhance(request)),
            ),
            "/enhance-advanced" => (
                "POST",
                (request.method() == "POST").then(|| self.enhance_advanced(request)),
            ),
            "/image-info" => (
                "POST",
                (request.method() == "POST").then(|| self.image_info(request)),
            ),
            "/preview" => (
                "POST",
                (request.method() == "POST").then(|| self.preview(request)),
            ),
            other => {
                debug!(path = other, "No route");
                return HttpResponse::detail(404, "Not Found");
            }
        };

        match result {
            Some(Ok(response)) => response,
            Some(Err(err)) => {
                let path = request.path();
                match humanize_error(&err).severity {
                    Severity::Transient => error!(path, error = %err, "Request failed"),
                    Severity::Rejected => warn!(path, error = %err, "Request rejected"),
                    Severity::Degraded => info!(path, error = %err, "Request degraded"),
                }
                HttpResponse::error(&err)
            }
            None => HttpResponse::detail(405, "Method Not Allowed").with_header("Allow", allowed),
        }
    }

    // -- Handlers -------------------------------------------------------------

    fn enhance(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let upload = extract_upload(request)?;
        let png = self
            .enhancer
            .enhance(&upload.data, &EnhancementConfig::default())?;
        Ok(HttpResponse::png(
            png,
            &format!("enhanced_{}", upload.filename),
        ))
    }

    fn enhance_advanced(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let config = config_from_query(&request.query_params())?;
        let upload = extract_upload(request)?;
        let png = self.enhancer.enhance(&upload.data, &config)?;
        Ok(HttpResponse::png(
            png,
            &format!(
                "enhanced_{}x_{}",
                config.super_resolution.factor(),
                upload.filename
            ),
        ))
    }

    fn image_info(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let upload = extract_upload(request)?;
        let info = match self.enhancer.image_info(&upload.data) {
            Some(info) => serde_json::to_value(info)?,
            None => json!({}),
        };
        Ok(HttpResponse::json(
            200,
            &json!({
                "filename": upload.filename,
                "content_type": upload.content_type,
                "size_bytes": upload.data.len(),
                "image_info": info,
            }),
        ))
    }

    fn preview(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let config = config_from_query(&request.query_params())?;
        let upload = extract_upload(request)?;
        let preview = self.enhancer.preview(&upload.data, &config)?;
        Ok(HttpResponse::json(200, &preview))
    }

    // -- CORS -----------------------------------------------------------------

    fn apply_cors(&self, request: &HttpRequest, response: HttpResponse) -> HttpResponse {
        match request.header("origin") {
            Some(origin) if self.allowed_origins.iter().any(|o| o == origin) => response
                .with_header("Access-Control-Allow-Origin", origin)
                .with_header("Access-Control-Allow-Credentials", "true")
                .with_header("Vary", "Origin"),
            _ => response,
        }
    }
}

fn preflight(request: &HttpRequest) -> HttpResponse {
    let headers = request
        .header("access-control-request-headers")
        .unwrap_or("Content-Type");
    HttpResponse::new(204)
        .with_header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .with_header("Access-Control-Allow-Headers", headers)
        .with_header("Access-Control-Max-Age", "600")
}

fn root() -> HttpResponse {
    HttpResponse::json(
        200,
        &json!({
            "message": "Image Enhancer API is running",
            "version": VERSION,
            "features": {
                "sharpness": "Adjust image sharpness (0.5-3.0)",
                "contrast": "Adjust image contrast (0.5-2.0)",
                "brightness": "Adjust image brightness (0.5-2.0)",
                "color": "Adjust color saturation (0.5-2.0)",
                "denoise": "Remove noise from images",
                "super_resolution": "2X, 4X, or 8X upscaling",
            },
            "endpoints": {
                "GET /health": "Check API health",
                "POST /enhance": "Basic enhancement",
                "POST /enhance-advanced": "Advanced enhancement with controls",
                "POST /image-info": "Image metadata",
                "POST /preview": "Original and enhanced previews as data URIs",
            },
        }),
    )
}

fn health() -> HttpResponse {
    HttpResponse::json(
        200,
        &json!({
            "status": "healthy",
            "service": "image-enhancer",
            "version": VERSION,
        }),
    )
}

/// Build an enhancement configuration from query parameters.
///
/// Absent parameters keep their defaults. The result is range-checked.
pub fn config_from_query(params: &[(String, String)]) -> Result<EnhancementConfig> {
    let mut config = EnhancementConfig::default();
    for (key, value) in params {
        match key.as_str() {
            "sharpness" => config.sharpness = parse_factor(key, value)?,
            "contrast" => config.contrast = parse_factor(key, value)?,
            "brightness" => config.brightness = parse_factor(key, value)?,
            "color" => config.color = parse_factor(key, value)?,
            "denoise" => config.denoise = parse_flag(key, value)?,
            "super_resolution" => {
                let factor: u32 = value.parse().map_err(|_| {
                    EnhancerError::InvalidConfig(format!(
                        "super_resolution must be an integer (got {value:?})"
                    ))
                })?;
                config.super_resolution = SuperResolution::try_from(factor)?;
            }
            _ => {}
        }
    }
    config.validate()?;
    Ok(config)
}

fn parse_factor(name: &str, value: &str) -> Result<f32> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            EnhancerError::InvalidConfig(format!("{name} must be a number (got {value:?})"))
        })
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EnhancerError::InvalidConfig(format!(
            "{name} must be true or false (got {value:?})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_request;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn router() -> Router {
        Router::new(
            Enhancer::new(),
            vec!["http://localhost:3000".to_string()],
        )
    }

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 20) as u8, (y * 30) as u8, 90]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn get(path: &str) -> HttpRequest {
        parse_request(format!("GET {path} HTTP/1.1\r\nHost: x\r\n\r\n").as_bytes()).unwrap()
    }

    fn post_image(target: &str, content_type: &str, body: &[u8]) -> HttpRequest {
        let mut raw = format!(
            "POST {target} HTTP/1.1\r\nHost: x\r\nContent-Type: {content_type}\r\nX-Filename: photo.png\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        raw.extend_from_slice(body);
        parse_request(&raw).unwrap()
    }

    fn json_body(response: &HttpResponse) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn health_reports_version() {
        let response = router().handle(&get("/health"));
        assert_eq!(response.status, 200);
        let body = json_body(&response);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "image-enhancer");
        assert_eq!(body["version"], VERSION);
    }

    #[test]
    fn root_lists_endpoints() {
        let body = json_body(&router().handle(&get("/")));
        assert!(body["endpoints"]["POST /enhance"].is_string());
        assert!(body["features"]["super_resolution"].is_string());
    }

    #[test]
    fn unknown_path_is_404_and_wrong_method_is_405() {
        assert_eq!(router().handle(&get("/nope")).status, 404);
        let response = router().handle(&get("/enhance"));
        assert_eq!(response.status, 405);
        assert_eq!(response.header("Allow"), Some("POST"));
    }

    #[test]
    fn enhance_returns_png_attachment() {
        let request = post_image("/enhance", "image/png", &png_fixture(8, 6));
        let response = router().handle(&request);
        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some("image/png"));
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=\"enhanced_photo.png\"")
        );
        assert_eq!(&response.body[1..4], b"PNG");
    }

    #[test]
    fn advanced_uses_query_and_names_factor() {
        let request = post_image(
            "/enhance-advanced?sharpness=1.0&super_resolution=2&denoise=false",
            "image/png",
            &png_fixture(8, 6),
        );
        let response = router().handle(&request);
        assert_eq!(response.status, 200);
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=\"enhanced_2x_photo.png\"")
        );
        let info = enhancer_imaging::image_info(&response.body).unwrap();
        assert_eq!((info.width, info.height), (16, 12));
    }

    #[test]
    fn advanced_rejects_out_of_range_parameters() {
        let request = post_image("/enhance-advanced?sharpness=5", "image/png", &png_fixture(4, 4));
        let response = router().handle(&request);
        assert_eq!(response.status, 400);
        assert_eq!(
            json_body(&response)["detail"],
            "sharpness must be between 0.5 and 3.0"
        );

        let request = post_image(
            "/enhance-advanced?super_resolution=3",
            "image/png",
            &png_fixture(4, 4),
        );
        assert_eq!(router().handle(&request).status, 400);
    }

    #[test]
    fn non_image_upload_is_400() {
        let request = post_image("/enhance", "text/plain", b"hello");
        let response = router().handle(&request);
        assert_eq!(response.status, 400);
        assert_eq!(json_body(&response)["detail"], "File must be an image");
    }

    #[test]
    fn corrupt_image_is_400() {
        let request = post_image("/enhance", "image/png", b"not really a png");
        assert_eq!(router().handle(&request).status, 400);
    }

    #[test]
    fn image_info_reports_metadata() {
        let png = png_fixture(12, 7);
        let response = router().handle(&post_image("/image-info", "image/png", &png));
        let body = json_body(&response);
        assert_eq!(body["filename"], "photo.png");
        assert_eq!(body["content_type"], "image/png");
        assert_eq!(body["size_bytes"], png.len());
        assert_eq!(body["image_info"]["width"], 12);
        assert_eq!(body["image_info"]["format"], "PNG");
    }

    #[test]
    fn image_info_on_corrupt_bytes_is_empty_object() {
        let response = router().handle(&post_image("/image-info", "image/png", b"garbage"));
        assert_eq!(response.status, 200);
        assert_eq!(json_body(&response)["image_info"], json!({}));
    }

    #[test]
    fn preview_returns_data_uris() {
        let response = router().handle(&post_image("/preview", "image/png", &png_fixture(4, 4)));
        assert_eq!(response.status, 200);
        let body = json_body(&response);
        for key in ["original", "enhanced", "enhanced_2x"] {
            assert!(body[key].as_str().unwrap().starts_with("data:image/png;base64,"));
        }
    }

    #[test]
    fn cors_echoes_allowed_origin_only() {
        let allowed = parse_request(
            b"GET /health HTTP/1.1\r\nOrigin: http://localhost:3000\r\n\r\n",
        )
        .unwrap();
        let response = router().handle(&allowed);
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some("http://localhost:3000")
        );
        assert_eq!(response.header("Access-Control-Allow-Credentials"), Some("true"));

        let denied =
            parse_request(b"GET /health HTTP/1.1\r\nOrigin: https://evil.example\r\n\r\n").unwrap();
        assert!(router().handle(&denied).header("Access-Control-Allow-Origin").is_none());
    }

    #[test]
    fn preflight_is_204() {
        let request = parse_request(
            b"OPTIONS /enhance HTTP/1.1\r\nOrigin: http://localhost:3000\r\nAccess-Control-Request-Method: POST\r\n\r\n",
        )
        .unwrap();
        let response = router().handle(&request);
        assert_eq!(response.status, 204);
        assert!(response.header("Access-Control-Allow-Methods").is_some());
        assert_eq!(
            response.header("Access-Control-Allow-Origin"),
            Some("http://localhost:3000")
        );
    }

    #[test]
    fn query_config_defaults_and_overrides() {
        let config = config_from_query(&[
            ("contrast".to_string(), "1.5".to_string()),
            ("denoise".to_string(), "true".to_string()),
            ("super_resolution".to_string(), "4".to_string()),
        ])
        .unwrap();
        assert_eq!(config.contrast, 1.5);
        assert_eq!(config.sharpness, 2.0);
        assert!(config.denoise);
        assert_eq!(config.super_resolution, SuperResolution::X4);

        assert!(config_from_query(&[("color".to_string(), "abc".to_string())]).is_err());
        assert!(config_from_query(&[("denoise".to_string(), "maybe".to_string())]).is_err());
    }
}
