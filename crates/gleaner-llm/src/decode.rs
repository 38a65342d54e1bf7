//! Decode raw model output into the requested response shape

use gleaner_domain::{GleaningStatus, Graph, ModelError, ModelResponse, ResponseKind};
use serde::de::DeserializeOwned;

/// Decode `raw` according to `kind`
///
/// Text replies pass through untouched. Structured replies are parsed as JSON,
/// tolerating a surrounding markdown code fence.
pub fn decode_response(kind: ResponseKind, raw: &str) -> Result<ModelResponse, ModelError> {
    match kind {
        ResponseKind::Text => Ok(ModelResponse::Text(raw.to_string())),
        ResponseKind::Graph => decode_json::<Graph>(raw).map(ModelResponse::Graph),
        ResponseKind::GleaningStatus => {
            decode_json::<GleaningStatus>(raw).map(ModelResponse::GleaningStatus)
        }
    }
}

fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, ModelError> {
    let json = strip_code_fence(raw)?;
    serde_json::from_str(json).map_err(|e| ModelError::Decode(format!("JSON parse error: {}", e)))
}

/// Extract JSON from a response, handling markdown code blocks
pub fn strip_code_fence(response: &str) -> Result<&str, ModelError> {
    let trimmed = response.trim();

    if !trimmed.starts_with("```") {
        return Ok(trimmed);
    }

    // Skip the opening fence line (``` or ```json) and the closing fence
    let body = match trimmed.find('\n') {
        Some(newline) => &trimmed[newline + 1..],
        None => return Err(ModelError::Decode("Empty code block".to_string())),
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);

    Ok(body.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_passthrough() {
        let response = decode_response(ResponseKind::Text, "  hello  ").unwrap();
        assert_eq!(response, ModelResponse::Text("  hello  ".to_string()));
    }

    #[test]
    fn test_decode_graph() {
        let raw = r#"{"entities": [{"name": "Scrooge", "type": "Character"}]}"#;
        match decode_response(ResponseKind::Graph, raw).unwrap() {
            ModelResponse::Graph(graph) => {
                assert_eq!(graph.entities.len(), 1);
                assert_eq!(graph.entities[0].name, "Scrooge");
            }
            other => panic!("Expected graph, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_graph_in_code_block() {
        let raw = "```json\n{\"entities\": [], \"relationships\": []}\n```";
        let response = decode_response(ResponseKind::Graph, raw).unwrap();
        assert_eq!(response, ModelResponse::Graph(Graph::default()));
    }

    #[test]
    fn test_decode_status() {
        let response = decode_response(ResponseKind::GleaningStatus, r#"{"status": "continue"}"#).unwrap();
        assert_eq!(response, ModelResponse::GleaningStatus(GleaningStatus::continuing()));
    }

    #[test]
    fn test_decode_invalid_json_is_decode_error() {
        let err = decode_response(ResponseKind::Graph, "This is not JSON").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_decode_wrong_shape_is_decode_error() {
        let err = decode_response(ResponseKind::GleaningStatus, r#"{"entities": []}"#).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_empty_code_block() {
        assert!(strip_code_fence("```").is_err());
    }
}
