//! Prompt templates and response schemas.

use serde_json::{Value, json};

pub(crate) fn analysis_prompt(text: &str) -> String {
    format!(
        "You are a professional screenwriting assistant. Analyse the user's text.\n\
         1. Decide whether it is a 'novel', a 'script' or an 'idea'.\n\
         2. Adapt a novel or idea into standard screenplay form; normalise a script.\n\
         3. Split the result into scene, dialogue and action segments in story order.\n\
         4. For every segment write a detailed English visualPrompt for image generation.\n\n\
         User text:\n{}",
        text
    )
}

pub(crate) fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "inputType": { "type": "STRING", "enum": ["novel", "script", "idea"] },
            "segments": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "type": { "type": "STRING", "enum": ["scene", "dialogue", "action"] },
                        "content": { "type": "STRING" },
                        "visualPrompt": {
                            "type": "STRING",
                            "description": "English visual prompt for image generation"
                        }
                    }
                }
            }
        }
    })
}

pub(crate) fn extraction_prompt(context: &str) -> String {
    format!(
        "Extract the main characters from the screenplay below. For each one write a \
         detailed English visualPrompt describing appearance, clothing, style and face, \
         suitable for concept art.\n\nContext:\n{}",
        context
    )
}

pub(crate) fn extraction_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "name": { "type": "STRING" },
                "description": { "type": "STRING" },
                "visualPrompt": {
                    "type": "STRING",
                    "description": "Detailed English visual description: appearance, clothing, style, face"
                }
            }
        }
    })
}
