//! Structured diagnostics from registry error responses.
//!
//! A v2 registry reports failures as a JSON body with an `errors` array:
//! <https://github.com/docker/distribution/blob/master/docs/spec/api.md#errors>

use std::fmt;

use bytes::Bytes;
use serde::Deserialize;

use crate::response::RegistryResponse;

/// One entry from the `errors` array of a registry error response.
///
/// Every field is optional; equality is structural across all three.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Diagnostic {
    /// The machine-readable error code, such as `MANIFEST_UNKNOWN`.
    #[serde(default)]
    pub code: Option<String>,

    /// The human-readable message.
    #[serde(default)]
    pub message: Option<String>,

    /// Arbitrary extra detail supplied by the registry.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl Diagnostic {
    fn unknown(message: String) -> Self {
        Diagnostic {
            code: Some("UNKNOWN".to_owned()),
            message: Some(message),
            detail: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message)?,
            None => f.write_str(self.code.as_deref().unwrap_or("unknown error"))?,
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<Diagnostic>,
}

/// Extract the diagnostics from a response body.
///
/// A JSON body with an `errors` array maps to one [`Diagnostic`] per entry;
/// a JSON body without one maps to no diagnostics. Anything unparseable
/// degrades to a single `UNKNOWN` diagnostic carrying the raw body text.
/// Diagnosis itself never fails.
pub fn from_body(body: &[u8]) -> Vec<Diagnostic> {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.errors,
        Err(_) => vec![Diagnostic::unknown(
            String::from_utf8_lossy(body).into_owned(),
        )],
    }
}

/// A registry response outside the caller's accepted status codes.
///
/// Carries the original response status and headers along with the parsed
/// diagnostics, for programmatic inspection.
#[derive(Debug)]
pub struct DiagnosticError {
    response: http::response::Parts,
    body: Bytes,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticError {
    pub(crate) fn from_response(response: RegistryResponse) -> Self {
        let (response, body) = response.into_parts();
        let diagnostics = from_body(&body);
        DiagnosticError {
            response,
            body,
            diagnostics,
        }
    }

    /// The status of the rejected response.
    pub fn status(&self) -> http::StatusCode {
        self.response.status
    }

    /// The headers of the rejected response.
    pub fn headers(&self) -> &http::HeaderMap {
        &self.response.headers
    }

    /// The raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The diagnostics parsed from the response body, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for DiagnosticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registry responded {}", self.response.status)?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for DiagnosticError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_array_maps_to_diagnostics() {
        let body =
            br#"{"errors":[{"code":"DENIED","message":"access denied","detail":"repo:x"}]}"#;
        let diagnostics = from_body(body);

        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                code: Some("DENIED".to_owned()),
                message: Some("access denied".to_owned()),
                detail: Some(serde_json::Value::String("repo:x".to_owned())),
            }]
        );
    }

    #[test]
    fn every_diagnostic_field_is_optional() {
        let diagnostics = from_body(br#"{"errors":[{"code":"TOOMANYREQUESTS"},{}]}"#);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].code.as_deref(), Some("TOOMANYREQUESTS"));
        assert_eq!(diagnostics[1], Diagnostic { code: None, message: None, detail: None });
    }

    #[test]
    fn json_without_errors_yields_no_diagnostics() {
        assert!(from_body(br#"{"repositories":[]}"#).is_empty());
    }

    #[test]
    fn unparseable_bodies_degrade_to_unknown() {
        let diagnostics = from_body(b"<html>502 Bad Gateway</html>");

        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                code: Some("UNKNOWN".to_owned()),
                message: Some("<html>502 Bad Gateway</html>".to_owned()),
                detail: None,
            }]
        );
    }

    #[test]
    fn diagnosis_tolerates_invalid_utf8() {
        let diagnostics = from_body(&[0xff, 0xfe, 0xfd]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some("UNKNOWN"));
    }

    #[test]
    fn display_joins_message_and_detail() {
        let diagnostic = Diagnostic {
            code: Some("DENIED".to_owned()),
            message: Some("access denied".to_owned()),
            detail: Some(serde_json::Value::String("repo:x".to_owned())),
        };
        assert_eq!(diagnostic.to_string(), r#"access denied: "repo:x""#);

        let diagnostic = Diagnostic { code: None, message: None, detail: None };
        assert_eq!(diagnostic.to_string(), "unknown error");
    }
}
