//! Style and framework rewrites of a text selection.

use crate::ai::{AiError, Completer, Message};
use crate::models::{Framework, Style};

/// Analyze or rework `selection` through a framework's lens.
pub async fn apply_framework(
    completer: &dyn Completer,
    framework: &Framework,
    selection: &str,
) -> Result<String, AiError> {
    if !completer.is_configured() {
        return Err(AiError::Config);
    }

    let instruction = match framework.prompt.as_deref().map(str::trim) {
        Some(prompt) if !prompt.is_empty() => prompt.to_string(),
        _ => format!(
            "Apply the {} framework to the text below. {}",
            framework.name, framework.description
        ),
    };
    let message = format!("{}\n\nText:\n{}", instruction, selection);

    tracing::debug!("Applying framework '{}'", framework.name);
    let result = completer.complete(vec![Message::user(message)], None).await?;
    Ok(result.trim().to_string())
}

/// Rewrite `selection` in a style. The style's system prompt replaces the default one.
pub async fn apply_style(
    completer: &dyn Completer,
    style: &Style,
    selection: &str,
) -> Result<String, AiError> {
    if !completer.is_configured() {
        return Err(AiError::Config);
    }

    let system = match style.system_prompt.as_deref().map(str::trim) {
        Some(prompt) if !prompt.is_empty() => prompt.to_string(),
        _ => format!(
            "You are a writing assistant who rewrites text in the voice of {}. \
             Example of the voice: {}",
            style.author_name, style.preview
        ),
    };
    let message = format!(
        "Rewrite the following text in this style. Only output the rewritten text.\n\n{}",
        selection
    );

    tracing::debug!("Applying style '{}'", style.author_name);
    let result = completer
        .complete(vec![Message::user(message)], Some(system))
        .await?;
    Ok(result.trim().to_string())
}
