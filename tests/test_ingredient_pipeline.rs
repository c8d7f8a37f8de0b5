use std::io::Write;

use cookmate::media::ImageSource;
use cookmate::pipelines::caption::identify_ingredients;
use cookmate::providers::GeminiProvider;
use cookmate::{CookmateError, ExtractionError};
use mockito::{Matcher, Server};
use serde_json::json;

fn gemini_answer(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn photo() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .unwrap();
    file.write_all(b"not really a png").unwrap();
    file
}

#[tokio::test]
async fn test_identify_ingredients_from_photo() {
    let _ = env_logger::try_init();
    let mut server = Server::new_async().await;
    let answer = r#"Here is what I can see:
```json
{"ingredients": [
  {"name": "egg", "quantity": 6, "unit": "piece", "location": "door"},
  {"name": "spinach", "quantity": "1", "unit": "bag", "preparation": "washed"}
]}
```"#;
    let mock = server
        .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::Regex(r#""mimeType":"image/png""#.to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_answer(answer))
        .create_async()
        .await;

    let model = GeminiProvider::with_base_url(
        "test-key".to_string(),
        server.url(),
        "gemini-2.0-flash".to_string(),
    );
    let file = photo();
    let image = ImageSource::Path(file.path().to_string_lossy().to_string());

    let ingredients = identify_ingredients(&model, &image).await.unwrap();

    assert_eq!(ingredients.len(), 2);
    assert_eq!(ingredients[0].name, "egg");
    assert_eq!(ingredients[0].quantity, "6");
    assert_eq!(ingredients[0].location.as_deref(), Some("door"));
    assert_eq!(ingredients[1].preparation.as_deref(), Some("washed"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_answer_without_json() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_answer("Sorry, I cannot see any food in this picture."))
        .create_async()
        .await;

    let model = GeminiProvider::with_base_url(
        "test-key".to_string(),
        server.url(),
        "gemini-2.0-flash".to_string(),
    );
    let file = photo();
    let image = ImageSource::Path(file.path().to_string_lossy().to_string());

    let result = identify_ingredients(&model, &image).await;
    assert!(matches!(
        result,
        Err(CookmateError::Extraction(ExtractionError::NoPayload))
    ));
}

#[tokio::test]
async fn test_answer_with_wrong_schema() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_answer(r#"{"items": ["egg"]}"#))
        .create_async()
        .await;

    let model = GeminiProvider::with_base_url(
        "test-key".to_string(),
        server.url(),
        "gemini-2.0-flash".to_string(),
    );
    let image = ImageSource::Base64 {
        data: "aGVsbG8=".to_string(),
        mime_type: "image/jpeg".to_string(),
    };

    let result = identify_ingredients(&model, &image).await;
    assert!(matches!(
        result,
        Err(CookmateError::Extraction(ExtractionError::SchemaMismatch(_)))
    ));
}

#[tokio::test]
async fn test_missing_photo_never_reaches_model() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let model = GeminiProvider::with_base_url(
        "test-key".to_string(),
        server.url(),
        "gemini-2.0-flash".to_string(),
    );
    let dir = tempfile::tempdir().unwrap();
    let image = ImageSource::Path(
        dir.path()
            .join("missing.jpg")
            .to_string_lossy()
            .to_string(),
    );

    let result = identify_ingredients(&model, &image).await;
    assert!(matches!(result, Err(CookmateError::Io(_))));
    mock.assert_async().await;
}
