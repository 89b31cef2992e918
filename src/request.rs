//! Method-call surface: the request a host sends and the response it gets.
//!
//! Hosts talk to pickscale the way a mobile plugin channel would, one JSON
//! object per call:
//!
//! ```json
//! { "path": "/picked/IMG_0001.jpg", "maxWidth": 1024, "imageQuality": 80 }
//! ```
//!
//! and receive either `{ "path": "..." }`, `{ "path": null }` for files that
//! are not decodable images, or `{ "error": { "code": ..., "message": ... } }`.
//! A call that is not a well-formed request gets an `invalid_argument` error.

use crate::imaging::{Constraints, ImageBackend, Quality};
use crate::resizer::{ImageResizer, ResizeError, ResizeOutcome};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Arguments of one resize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResizeRequest {
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f64>,
    /// Accepted as any integer; only 1..=99 has an effect.
    #[serde(
        default,
        alias = "quality",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_quality: Option<i64>,
}

impl ResizeRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_width: None,
            max_height: None,
            image_quality: None,
        }
    }

    pub fn max_width(mut self, value: f64) -> Self {
        self.max_width = Some(value);
        self
    }

    pub fn max_height(mut self, value: f64) -> Self {
        self.max_height = Some(value);
        self
    }

    pub fn quality(mut self, value: i64) -> Self {
        self.image_quality = Some(value);
        self
    }

    pub fn constraints(&self) -> Result<Constraints, ResizeError> {
        Ok(Constraints::new(self.max_width, self.max_height)?)
    }

    /// The requested quality, if it is one that triggers recompression.
    pub fn valid_quality(&self) -> Option<Quality> {
        Quality::from_request(self.image_quality)
    }
}

/// Reply to a resize call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResizeResponse {
    Path { path: Option<PathBuf> },
    Error { error: ErrorBody },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ResizeResponse {
    /// Answer one raw JSON call.
    pub fn from_call<B: ImageBackend>(resizer: &ImageResizer<B>, input: &str) -> Self {
        match serde_json::from_str::<ResizeRequest>(input) {
            Ok(request) => resizer.resize_image_if_needed(&request).into(),
            Err(e) => Self::Error {
                error: ErrorBody {
                    code: "invalid_argument".to_string(),
                    message: format!("Malformed request: {e}"),
                },
            },
        }
    }
}

impl From<Result<ResizeOutcome, ResizeError>> for ResizeResponse {
    fn from(result: Result<ResizeOutcome, ResizeError>) -> Self {
        match result {
            Ok(outcome) => Self::Path {
                path: outcome.output_path().map(|p| p.to_path_buf()),
            },
            Err(e) => Self::Error {
                error: ErrorBody {
                    code: e.code().to_string(),
                    message: e.to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::resizer::{ResizeOptions, SkipReason};

    #[test]
    fn parses_camel_case_call() {
        let req: ResizeRequest = serde_json::from_str(
            r#"{"path": "/p/a.jpg", "maxWidth": 1024.5, "maxHeight": 768, "imageQuality": 80}"#,
        )
        .unwrap();
        assert_eq!(
            req,
            ResizeRequest::new("/p/a.jpg")
                .max_width(1024.5)
                .max_height(768.0)
                .quality(80)
        );
    }

    #[test]
    fn optional_fields_default_to_none() {
        let req: ResizeRequest = serde_json::from_str(r#"{"path": "/p/a.jpg"}"#).unwrap();
        assert_eq!(req, ResizeRequest::new("/p/a.jpg"));
        assert!(req.constraints().unwrap().is_empty());
        assert!(req.valid_quality().is_none());
    }

    #[test]
    fn null_fields_are_accepted() {
        let req: ResizeRequest = serde_json::from_str(
            r#"{"path": "/p/a.jpg", "maxWidth": null, "imageQuality": null}"#,
        )
        .unwrap();
        assert_eq!(req, ResizeRequest::new("/p/a.jpg"));
    }

    #[test]
    fn quality_alias_accepted() {
        let req: ResizeRequest =
            serde_json::from_str(r#"{"path": "/p/a.jpg", "quality": 50}"#).unwrap();
        assert_eq!(req.image_quality, Some(50));
    }

    #[test]
    fn out_of_range_quality_is_not_valid() {
        assert!(ResizeRequest::new("a").quality(150).valid_quality().is_none());
        assert_eq!(
            ResizeRequest::new("a").quality(30).valid_quality(),
            Some(Quality::new(30))
        );
    }

    #[test]
    fn negative_bound_is_invalid_constraint() {
        let err = ResizeRequest::new("a").max_width(-3.0).constraints().unwrap_err();
        assert!(matches!(err, ResizeError::InvalidConstraint(_)));
    }

    #[test]
    fn response_serializes_path_or_null() {
        let ok: ResizeResponse = Ok(ResizeOutcome::Unchanged {
            path: "/p/a.svg".into(),
            reason: SkipReason::NonResizableExtension("svg".into()),
        })
        .into();
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"path":"/p/a.svg"}"#
        );

        let none: ResizeResponse = Ok(ResizeOutcome::Undecodable {
            path: "/p/a.bin".into(),
        })
        .into();
        assert_eq!(serde_json::to_string(&none).unwrap(), r#"{"path":null}"#);
    }

    fn mock_resizer() -> ImageResizer<MockBackend> {
        ImageResizer::new(
            MockBackend::with_source(100, 100, false),
            ResizeOptions::new("/out"),
        )
    }

    #[test]
    fn malformed_call_is_invalid_argument() {
        let r = mock_resizer();
        for input in ["", "not json", r#"{"maxWidth": 10}"#, r#"{"path": "a", "width": 3}"#] {
            let ResizeResponse::Error { error } = ResizeResponse::from_call(&r, input) else {
                panic!("expected error for {input:?}");
            };
            assert_eq!(error.code, "invalid_argument");
            assert!(error.message.starts_with("Malformed request"));
        }
        assert!(r.backend().get_operations().is_empty());
    }

    #[test]
    fn well_formed_call_is_resized() {
        let r = mock_resizer();
        let response =
            ResizeResponse::from_call(&r, r#"{"path": "/p/a.jpg", "maxWidth": 50}"#);
        assert_eq!(
            response,
            ResizeResponse::Path {
                path: Some("/out/scaled_a.jpg".into())
            }
        );
    }

    #[test]
    fn response_serializes_error() {
        let err: ResizeResponse =
            Err(ResizeError::from(Constraints::new(Some(0.0), None).unwrap_err())).into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["error"]["code"], "invalid_argument");
        assert!(
            json["error"]["message"]
                .as_str()
                .unwrap()
                .contains("max width")
        );
    }
}
