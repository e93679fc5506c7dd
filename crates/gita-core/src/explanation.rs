//! The structured explanation of a verse: prompt, output schema and parsing.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ExplainError;

/// A complete explanation of one verse. All six fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub sanskrit: String,
    pub transliteration: String,
    pub translation: String,
    pub modern_context: String,
    pub practical_application: String,
    pub key_takeaway: String,
}

/// Wire form of the backend output; fields are optional so a missing one can
/// be reported by name.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExplanation {
    sanskrit: Option<String>,
    transliteration: Option<String>,
    translation: Option<String>,
    modern_context: Option<String>,
    practical_application: Option<String>,
    key_takeaway: Option<String>,
}

pub const REQUIRED_FIELDS: [&str; 6] = [
    "sanskrit",
    "transliteration",
    "translation",
    "modernContext",
    "practicalApplication",
    "keyTakeaway",
];

/// Build the instruction sent to the model for one verse.
pub fn build_prompt(chapter: u8, verse: u16, language: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("Explain Bhagavad Gita Chapter {}, Verse {}.\n\n", chapter, verse));
    prompt.push_str(&format!("Target Language: {}.\n\n", language));
    prompt.push_str("Output Instructions:\n");
    prompt.push_str("1. **Sanskrit**: Provide original text in Devanagari.\n");
    prompt.push_str(
        "2. **Transliteration**: Provide in English characters (ISO 15919 or standard common usage).\n",
    );
    prompt.push_str(&format!("3. **Translation**: Literal meaning in {}.\n", language));
    prompt.push_str(&format!(
        "4. **Modern Interpretation**: Explain the concept in {} using modern contexts (work, stress, lifestyle).\n",
        language
    ));
    prompt.push_str(&format!("5. **Practical Application**: Actionable advice in {}.\n", language));
    prompt.push_str(&format!("6. **Key Takeaway**: A short summary motto in {}.\n\n", language));
    prompt.push_str("Make the tone wise, empathetic, and accessible, acting like a modern mentor.\n");
    prompt.push_str(
        "Respond only with a JSON object with the keys sanskrit, transliteration, translation, \
         modernContext, practicalApplication and keyTakeaway.",
    );

    prompt
}

/// JSON schema the backend output must conform to.
pub fn explanation_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sanskrit": {
                "type": "string",
                "description": "The original Sanskrit text of the sloka in Devanagari script."
            },
            "transliteration": {
                "type": "string",
                "description": "English transliteration of the Sanskrit text."
            },
            "translation": {
                "type": "string",
                "description": "Literal translation of the sloka in the requested language."
            },
            "modernContext": {
                "type": "string",
                "description": "A detailed explanation of the verse in the requested language using a modern-day scenario (e.g., corporate life, student stress, relationships) that makes it relatable."
            },
            "practicalApplication": {
                "type": "string",
                "description": "A specific, actionable piece of advice in the requested language derived from this verse for daily life."
            },
            "keyTakeaway": {
                "type": "string",
                "description": "A short, punchy summary phrase or motto from this verse in the requested language."
            }
        },
        "required": REQUIRED_FIELDS,
        "additionalProperties": false
    })
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("code fence pattern is valid")
    })
}

/// Parse backend text into an [`Explanation`].
///
/// Either all six fields are present and non-blank, or this fails.
pub fn parse_explanation(text: &str) -> Result<Explanation, ExplainError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExplainError::EmptyContent);
    }

    let body = code_fence()
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    let raw: RawExplanation = serde_json::from_str(body)?;

    fn required(value: Option<String>, name: &'static str) -> Result<String, ExplainError> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(ExplainError::MissingField(name)),
        }
    }

    Ok(Explanation {
        sanskrit: required(raw.sanskrit, "sanskrit")?,
        transliteration: required(raw.transliteration, "transliteration")?,
        translation: required(raw.translation, "translation")?,
        modern_context: required(raw.modern_context, "modernContext")?,
        practical_application: required(raw.practical_application, "practicalApplication")?,
        key_takeaway: required(raw.key_takeaway, "keyTakeaway")?,
    })
}

#[cfg(test)]
pub(crate) fn sample_json() -> String {
    json!({
        "sanskrit": "कर्मण्येवाधिकारस्ते मा फलेषु कदाचन",
        "transliteration": "karmaṇy evādhikāras te mā phaleṣu kadācana",
        "translation": "You have a right to your actions, never to their fruits.",
        "modernContext": "Focus on the quality of your work rather than the appraisal.",
        "practicalApplication": "Before your next task, write down the effort you control.",
        "keyTakeaway": "Do the work, release the result."
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_verse_and_language() {
        let prompt = build_prompt(2, 47, "English");
        assert!(prompt.contains("Bhagavad Gita Chapter 2, Verse 47"));
        assert!(prompt.contains("Target Language: English."));
        assert!(prompt.contains("Literal meaning in English"));
    }

    #[test]
    fn test_prompt_forwards_unknown_language() {
        let prompt = build_prompt(18, 66, "Esperanto");
        assert!(prompt.contains("Target Language: Esperanto."));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = explanation_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(required, REQUIRED_FIELDS);
        for field in REQUIRED_FIELDS {
            assert_eq!(schema["properties"][field]["type"], "string");
        }
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_parse_complete_response() {
        let explanation = parse_explanation(&sample_json()).unwrap();
        assert_eq!(explanation.key_takeaway, "Do the work, release the result.");
        assert!(explanation.sanskrit.starts_with("कर्मण्येवा"));
    }

    #[test]
    fn test_parse_ignores_extra_properties() {
        let mut value: Value = serde_json::from_str(&sample_json()).unwrap();
        value["mood"] = json!("calm");
        assert!(parse_explanation(&value.to_string()).is_ok());
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let fenced = format!("```json\n{}\n```", sample_json());
        assert!(parse_explanation(&fenced).is_ok());
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(matches!(parse_explanation("  \n"), Err(ExplainError::EmptyContent)));
    }

    #[test]
    fn test_parse_malformed_json() {
        assert!(matches!(
            parse_explanation("{\"sanskrit\": "),
            Err(ExplainError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_missing_field() {
        let mut value: Value = serde_json::from_str(&sample_json()).unwrap();
        value.as_object_mut().unwrap().remove("practicalApplication");
        match parse_explanation(&value.to_string()) {
            Err(ExplainError::MissingField(name)) => assert_eq!(name, "practicalApplication"),
            other => panic!("expected missing field, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_blank_field_is_missing() {
        let mut value: Value = serde_json::from_str(&sample_json()).unwrap();
        value["keyTakeaway"] = json!("   ");
        assert!(matches!(
            parse_explanation(&value.to_string()),
            Err(ExplainError::MissingField("keyTakeaway"))
        ));
    }
}
