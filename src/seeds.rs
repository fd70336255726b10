//! On-demand seed generation.
//!
//! Seeds are short, typed writing suggestions derived from the active
//! document and the context files. The model is asked for a JSON array; a
//! reply that can't be parsed is kept as a single "similar" seed rather than
//! surfaced as an error.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::ai::{AiError, Completer, Message};
use crate::markup::truncate_chars;
use crate::models::{ContextFile, Seed, SeedType};

/// Characters of the active document included in the prompt.
pub const DOCUMENT_EXCERPT_CHARS: usize = 1000;
/// Characters of each context file included in the prompt.
pub const CONTEXT_EXCERPT_CHARS: usize = 500;
/// Characters kept when a raw reply is wrapped as a fallback seed.
pub const FALLBACK_PREVIEW_CHARS: usize = 300;

const FALLBACK_FILENAME: &str = "AI Suggestion";

#[derive(Debug, Error)]
pub enum SeedParseError {
    #[error("no JSON array in response")]
    MissingArray,

    #[error("invalid seed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawSeed {
    #[serde(rename = "type", default)]
    seed_type: String,
    #[serde(default)]
    preview: String,
    #[serde(default)]
    filename: String,
}

/// Ask for four categorized suggestions.
///
/// Fails fast with [`AiError::Config`] when no key is configured, before any
/// prompt is built. Request failures propagate; parse failures fall back.
pub async fn generate_seeds(
    completer: &dyn Completer,
    document_text: &str,
    context_files: &[ContextFile],
) -> Result<Vec<Seed>, AiError> {
    if !completer.is_configured() {
        return Err(AiError::Config);
    }

    let prompt = build_prompt(document_text, context_files);
    let response = completer.complete(vec![Message::user(prompt)], None).await?;

    let seeds = parse_seeds(&response).unwrap_or_else(|e| {
        tracing::debug!("Seed response not structured ({}), wrapping raw text", e);
        vec![fallback_seed(&response)]
    });
    tracing::info!("Generated {} seeds", seeds.len());
    Ok(seeds)
}

pub fn build_prompt(document_text: &str, context_files: &[ContextFile]) -> String {
    let context = context_files
        .iter()
        .map(|f| format!("[{}]\n{}", f.filename, truncate_chars(&f.content, CONTEXT_EXCERPT_CHARS)))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on the following document and context files, generate 4 writing suggestions:\n\
         1. \"similar\" - an idea similar to what is being written\n\
         2. \"related\" - related material from the context files\n\
         3. \"challenge\" - a counterpoint or challenge to the argument\n\
         4. \"extend\" - a direction to extend the writing\n\n\
         Document:\n{}\n\n\
         Context files:\n{}\n\n\
         Respond with a JSON array of objects with \"type\", \"preview\" and \"filename\" \
         fields, where filename names the source file it draws on.",
        truncate_chars(document_text, DOCUMENT_EXCERPT_CHARS),
        if context.is_empty() { "(none)" } else { context.as_str() },
    )
}

/// Parse the first JSON array found in `response`.
pub fn parse_seeds(response: &str) -> Result<Vec<Seed>, SeedParseError> {
    let start = response.find('[').ok_or(SeedParseError::MissingArray)?;
    let end = response.rfind(']').ok_or(SeedParseError::MissingArray)?;
    if end < start {
        return Err(SeedParseError::MissingArray);
    }

    let raw: Vec<RawSeed> = serde_json::from_str(&response[start..=end])?;
    Ok(raw.into_iter().map(RawSeed::into_seed).collect())
}

impl RawSeed {
    fn into_seed(self) -> Seed {
        let (filename, filetype) = split_filename(&self.filename);
        Seed {
            id: Uuid::new_v4(),
            seed_type: SeedType::from_str(self.seed_type.trim()).unwrap_or(SeedType::Similar),
            filename,
            filetype,
            preview: self.preview,
        }
    }
}

fn fallback_seed(response: &str) -> Seed {
    Seed {
        id: Uuid::new_v4(),
        seed_type: SeedType::Similar,
        filename: FALLBACK_FILENAME.to_string(),
        filetype: "txt".to_string(),
        preview: truncate_chars(response.trim(), FALLBACK_PREVIEW_CHARS),
    }
}

/// `"notes.md"` becomes `("notes", "md")`; no extension means "txt".
fn split_filename(filename: &str) -> (String, String) {
    match filename.trim().rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem.to_string(), ext.to_string()),
        _ => (filename.trim().to_string(), "txt".to_string()),
    }
}
