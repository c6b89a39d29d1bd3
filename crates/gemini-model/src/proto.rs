use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use gemchat_model::{Image, ModelRequest};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorStatus {
    #[serde(default)]
    pub message: String,
    pub status: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let mut text: Option<String> = None;
        for part in parts {
            if let Part::Text { text: piece } = part {
                text.get_or_insert_default().push_str(piece);
            }
        }
        text
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

// ---------------------------------
// Types shared by both directions
// ---------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    // Function calls, code execution, etc. are not used by the chat.
    Other(serde_json::Value),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
}

// -----------
// Conversions
// -----------

/// Builds the request body. Images go before the text, the model reads
/// the prompt as a question about the images. An empty prompt is left out
/// when there are images.
#[inline]
pub fn create_request(req: &ModelRequest) -> GenerateContentRequest {
    let mut parts: Vec<Part> =
        req.images.iter().map(create_image_part).collect();
    if parts.is_empty() || !req.prompt.is_empty() {
        parts.push(Part::Text {
            text: req.prompt.clone(),
        });
    }
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_owned()),
            parts,
        }],
    }
}

#[inline]
fn create_image_part(image: &Image) -> Part {
    Part::InlineData {
        inline_data: Blob {
            mime_type: image.mime_type().essence_str().to_owned(),
            data: BASE64.encode(image.data()),
        },
    }
}

#[cfg(test)]
mod tests {
    use gemchat_model::Credential;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let mut request = ModelRequest::text(
            "gemini-pro-vision",
            Credential::new("xxx"),
            "What is in the picture?",
        );
        request.images = vec![Image::new(b"\x89PNG".to_vec(), mime::IMAGE_PNG)];

        let body = serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {
                            "inlineData": {
                                "mimeType": "image/png",
                                "data": "iVBORw=="
                            }
                        },
                        { "text": "What is in the picture?" }
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_create_request_images_only() {
        let mut request = ModelRequest::text(
            "gemini-pro-vision",
            Credential::new("xxx"),
            "",
        );
        request.images = vec![Image::new(b"GIF8".to_vec(), mime::IMAGE_GIF)];

        let body = serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(
            body["contents"][0]["parts"],
            json!([{
                "inlineData": { "mimeType": "image/gif", "data": "R0lGOA==" }
            }])
        );
    }

    #[test]
    fn test_parse_chunk() {
        let chunk: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Hi " },
                        { "functionCall": { "name": "noop", "args": {} } },
                        { "text": "there" }
                    ]
                },
                "finishReason": "STOP",
                "index": 0,
                "safetyRatings": []
            }],
            "usageMetadata": { "promptTokenCount": 2 }
        }))
        .unwrap();
        assert_eq!(chunk.text().as_deref(), Some("Hi there"));
        assert_eq!(chunk.finish_reason(), Some("STOP"));

        let blocked: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert_eq!(blocked.text(), None);
        assert_eq!(
            blocked.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }
}
