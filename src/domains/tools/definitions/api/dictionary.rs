//! English dictionary lookup via dictionaryapi.dev.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{field_or_empty, list_or_empty};
use crate::core::http::{FetchClient, endpoint};
use crate::domains::tools::contract::{Tool, ToolMetadata, ToolOutput, ToolParams};
use crate::domains::tools::{ToolError, ToolResult};

/// Parameters for the dictionary tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DictionaryParams {
    #[schemars(description = "English word to look up, e.g. 'hello', 'serendipity'")]
    pub word: String,
}

/// Dictionary lookup tool.
pub struct DictionaryTool {
    client: FetchClient,
    base_url: String,
}

impl DictionaryTool {
    pub const NAME: &'static str = "lookup_word";
    pub const BASE_URL: &'static str = "https://api.dictionaryapi.dev/api/v2/entries/en";

    const METADATA: ToolMetadata = ToolMetadata::new(
        Self::NAME,
        "Look up the definition of an English word. Returns definitions, \
         pronunciation, examples, synonyms and antonyms.",
    );

    pub fn new(client: FetchClient) -> Self {
        Self::with_base_url(client, Self::BASE_URL)
    }

    pub fn with_base_url(client: FetchClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn normalize(word: &str, entry: &Value) -> Value {
        let phonetics: Vec<Value> = entry
            .get("phonetics")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter(|p| non_empty_str(p, "text") || non_empty_str(p, "audio"))
            .map(|p| {
                json!({
                    "text": field_or_empty(p, "text"),
                    "audio": field_or_empty(p, "audio"),
                })
            })
            .collect();

        let meanings: Vec<Value> = entry
            .get("meanings")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|meaning| {
                let definitions: Vec<Value> = meaning
                    .get("definitions")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .map(|d| {
                        json!({
                            "definition": field_or_empty(d, "definition"),
                            "example": field_or_empty(d, "example"),
                            "synonyms": list_or_empty(d, "synonyms"),
                            "antonyms": list_or_empty(d, "antonyms"),
                        })
                    })
                    .collect();

                json!({
                    "part_of_speech": field_or_empty(meaning, "partOfSpeech"),
                    "definitions": definitions,
                    "synonyms": list_or_empty(meaning, "synonyms"),
                    "antonyms": list_or_empty(meaning, "antonyms"),
                })
            })
            .collect();

        json!({
            "word": entry.get("word").cloned().unwrap_or_else(|| json!(word)),
            "phonetics": phonetics,
            "meanings": meanings,
            "source_urls": list_or_empty(entry, "sourceUrls"),
        })
    }
}

fn non_empty_str(obj: &Value, key: &str) -> bool {
    obj.get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

#[async_trait]
impl Tool for DictionaryTool {
    fn metadata(&self) -> &ToolMetadata {
        &Self::METADATA
    }

    fn input_schema(&self) -> Arc<JsonObject> {
        cached_schema_for_type::<DictionaryParams>()
    }

    fn validate(&self, params: &ToolParams) -> ToolResult<()> {
        let word = params.required_str("word")?.trim();
        if word.is_empty() {
            return Err(ToolError::validation("word cannot be empty"));
        }
        let letters: Vec<char> = word.chars().filter(|c| *c != '-' && *c != '\'').collect();
        if letters.is_empty() || !letters.iter().all(|c| c.is_alphabetic()) {
            return Err(ToolError::validation(
                "word must contain only letters, hyphens, or apostrophes",
            ));
        }
        Ok(())
    }

    async fn execute(&self, params: &ToolParams) -> ToolResult<ToolOutput> {
        let params: DictionaryParams = params.deserialize()?;
        let word = params.word.trim().to_lowercase();
        let url = endpoint(&self.base_url, &[word.as_str()])?;

        let data = self.client.get(url.as_str(), &[], &[]).await?;
        let entry = data
            .as_array()
            .and_then(|entries| entries.first())
            .ok_or_else(|| ToolError::execution(format!("No definition found for '{}'", word)))?;

        Ok(ToolOutput::Structured(Self::normalize(&word, entry)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::testing::{ScriptedTransport, client};

    fn params(value: Value) -> ToolParams {
        ToolParams::from_value(value).unwrap()
    }

    fn hello() -> Value {
        json!([{
            "word": "hello",
            "phonetics": [
                {"text": "/həˈləʊ/", "audio": "https://example.test/hello.mp3"},
                {"text": "", "audio": ""},
                {"audio": "https://example.test/hello-us.mp3"}
            ],
            "meanings": [{
                "partOfSpeech": "interjection",
                "definitions": [{
                    "definition": "A greeting.",
                    "example": "Hello, everyone.",
                    "synonyms": ["hi"],
                    "antonyms": ["bye"]
                }],
                "synonyms": ["greeting"],
                "antonyms": []
            }],
            "sourceUrls": ["https://en.wiktionary.org/wiki/hello"]
        }])
    }

    #[tokio::test]
    async fn test_dictionary_mapping() {
        let transport = ScriptedTransport::json(hello());
        let tool = DictionaryTool::new(client(transport.clone()));

        let output = tool.invoke(&params(json!({"word": "  Hello "}))).await.unwrap();
        let result = output.value();
        assert_eq!(result["word"], "hello");
        assert_eq!(result["meanings"][0]["part_of_speech"], "interjection");
        assert_eq!(result["meanings"][0]["definitions"][0]["example"], "Hello, everyone.");
        assert_eq!(result["meanings"][0]["synonyms"], json!(["greeting"]));
        assert_eq!(result["phonetics"].as_array().unwrap().len(), 2);
        assert_eq!(result["phonetics"][1]["text"], "");
        assert_eq!(result["source_urls"][0], "https://en.wiktionary.org/wiki/hello");
        assert_eq!(
            transport.last_url().as_deref(),
            Some("https://api.dictionaryapi.dev/api/v2/entries/en/hello")
        );
    }

    #[tokio::test]
    async fn test_missing_definition_fields_default() {
        let transport = ScriptedTransport::json(json!([{
            "meanings": [{"partOfSpeech": "noun", "definitions": [{"definition": "x"}]}]
        }]));
        let tool = DictionaryTool::new(client(transport));
        let output = tool.invoke(&params(json!({"word": "thing"}))).await.unwrap();
        let definition = &output.value()["meanings"][0]["definitions"][0];
        assert_eq!(definition["example"], "");
        assert_eq!(definition["synonyms"], json!([]));
        assert_eq!(output.value()["word"], "thing");
    }

    #[tokio::test]
    async fn test_empty_list_is_execution_error() {
        let transport = ScriptedTransport::json(json!([]));
        let tool = DictionaryTool::new(client(transport));
        let err = tool.invoke(&params(json!({"word": "zzz"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
        assert_eq!(err.message(), "No definition found for 'zzz'");
    }

    #[tokio::test]
    async fn test_non_list_is_execution_error() {
        let transport = ScriptedTransport::json(json!({"title": "No Definitions Found"}));
        let tool = DictionaryTool::new(client(transport));
        let err = tool.invoke(&params(json!({"word": "zzz"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
    }

    #[tokio::test]
    async fn test_word_validation() {
        let transport = ScriptedTransport::json(hello());
        let tool = DictionaryTool::new(client(transport.clone()));

        for bad in ["", "   ", "hello world", "abc123", "--"] {
            let err = tool.invoke(&params(json!({"word": bad}))).await.unwrap_err();
            assert!(err.is_validation(), "{:?}", bad);
        }
        assert_eq!(transport.calls(), 0);

        assert!(tool.validate(&params(json!({"word": "mother-in-law"}))).is_ok());
        assert!(tool.validate(&params(json!({"word": "o'clock"}))).is_ok());
    }
}
