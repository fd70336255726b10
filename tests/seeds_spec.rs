use std::sync::Mutex;

use async_trait::async_trait;
use scriptorium::ai::{AiError, Completer, Message};
use scriptorium::models::{ContextFile, Framework, SeedType, Style};
use scriptorium::seeds::{generate_seeds, parse_seeds, SeedParseError};
use scriptorium::transform::{apply_framework, apply_style};
use uuid::Uuid;

/// Completer returning a canned reply and recording what it was sent.
struct CannedCompleter {
    configured: bool,
    reply: String,
    requests: Mutex<Vec<(Vec<Message>, Option<String>)>>,
}

impl CannedCompleter {
    fn new(reply: &str) -> Self {
        Self {
            configured: true,
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new("")
        }
    }

    fn last_request(&self) -> (Vec<Message>, Option<String>) {
        self.requests.lock().unwrap().last().cloned().expect("No request sent")
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Completer for CannedCompleter {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, messages: Vec<Message>, system: Option<String>) -> Result<String, AiError> {
        self.requests.lock().unwrap().push((messages, system));
        Ok(self.reply.clone())
    }
}

fn context_file(filename: &str, content: &str) -> ContextFile {
    ContextFile {
        id: Uuid::new_v4(),
        filename: filename.to_string(),
        filetype: "md".to_string(),
        metadata: String::new(),
        content: content.to_string(),
    }
}

mod seed_generation {
    use super::*;

    #[tokio::test]
    async fn parses_a_structured_reply() {
        let completer =
            CannedCompleter::new(r#"[{"type":"similar","preview":"x","filename":"a.md"}]"#);

        let seeds = generate_seeds(&completer, "Some writing", &[])
            .await
            .expect("Seed generation failed");

        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].seed_type, SeedType::Similar);
        assert_eq!(seeds[0].filename, "a");
        assert_eq!(seeds[0].filetype, "md");
        assert_eq!(seeds[0].preview, "x");
    }

    #[tokio::test]
    async fn finds_the_array_inside_surrounding_prose() {
        let completer = CannedCompleter::new(
            "Here you go:\n[{\"type\":\"challenge\",\"preview\":\"But why?\",\"filename\":\"notes.txt\"},\
             {\"type\":\"extend\",\"preview\":\"Next\",\"filename\":\"plan.md\"}]\nEnjoy.",
        );

        let seeds = generate_seeds(&completer, "Some writing", &[])
            .await
            .expect("Seed generation failed");

        let types: Vec<_> = seeds.iter().map(|s| s.seed_type).collect();
        assert_eq!(types, vec![SeedType::Challenge, SeedType::Extend]);
    }

    #[tokio::test]
    async fn wraps_an_unstructured_reply_as_one_seed() {
        let completer = CannedCompleter::new("  Try writing about the ocean.  ");

        let seeds = generate_seeds(&completer, "Some writing", &[])
            .await
            .expect("Seed generation failed");

        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].seed_type, SeedType::Similar);
        assert_eq!(seeds[0].filename, "AI Suggestion");
        assert_eq!(seeds[0].filetype, "txt");
        assert_eq!(seeds[0].preview, "Try writing about the ocean.");
    }

    #[tokio::test]
    async fn truncates_the_fallback_preview() {
        let completer = CannedCompleter::new(&"y".repeat(1000));

        let seeds = generate_seeds(&completer, "Some writing", &[])
            .await
            .expect("Seed generation failed");

        assert_eq!(seeds[0].preview.chars().count(), 300);
    }

    #[tokio::test]
    async fn fails_without_a_key_before_sending() {
        let completer = CannedCompleter::unconfigured();

        let result = generate_seeds(&completer, "Some writing", &[]).await;

        assert!(matches!(result, Err(AiError::Config)));
        assert_eq!(completer.request_count(), 0);
    }

    #[tokio::test]
    async fn includes_context_files_in_the_prompt() {
        let completer = CannedCompleter::new("[]");
        let context = [context_file("mcluhan.md", "The medium is the message")];

        generate_seeds(&completer, "My draft", &context)
            .await
            .expect("Seed generation failed");

        let (messages, system) = completer.last_request();
        assert!(system.is_none());
        assert!(messages[0].content.contains("My draft"));
        assert!(messages[0].content.contains("[mcluhan.md]"));
        assert!(messages[0].content.contains("The medium is the message"));
    }
}

mod seed_parsing {
    use super::*;

    #[test]
    fn reports_a_missing_array() {
        assert!(matches!(parse_seeds("no json here"), Err(SeedParseError::MissingArray)));
    }

    #[test]
    fn reports_malformed_json() {
        assert!(matches!(parse_seeds("[{\"type\": }]"), Err(SeedParseError::Json(_))));
    }
}

mod transforms {
    use super::*;

    #[tokio::test]
    async fn framework_prompt_names_the_framework() {
        let completer = CannedCompleter::new("  Enhances: speed.  ");
        let framework = Framework::new("McLuhan's Tetrad", "Laws of Media", "Four questions.");

        let result = apply_framework(&completer, &framework, "Cars")
            .await
            .expect("Transform failed");

        assert_eq!(result, "Enhances: speed.");
        let (messages, system) = completer.last_request();
        assert!(system.is_none());
        assert!(messages[0].content.contains("McLuhan's Tetrad"));
        assert!(messages[0].content.contains("Cars"));
    }

    #[tokio::test]
    async fn framework_custom_prompt_replaces_the_description() {
        let completer = CannedCompleter::new("ok");
        let mut framework = Framework::new("Custom", "", "Ignored description");
        framework.prompt = Some("List three risks.".to_string());

        apply_framework(&completer, &framework, "Plan")
            .await
            .expect("Transform failed");

        let (messages, _) = completer.last_request();
        assert!(messages[0].content.starts_with("List three risks."));
        assert!(!messages[0].content.contains("Ignored description"));
    }

    #[tokio::test]
    async fn style_sends_its_system_prompt() {
        let completer = CannedCompleter::new("Short. Clear.");
        let style = Style {
            id: Uuid::new_v4(),
            author_name: "Hemingway".to_string(),
            preview: "Short sentences.".to_string(),
            system_prompt: Some("Write like Hemingway.".to_string()),
        };

        let result = apply_style(&completer, &style, "A long winding sentence")
            .await
            .expect("Transform failed");

        assert_eq!(result, "Short. Clear.");
        let (messages, system) = completer.last_request();
        assert_eq!(system.as_deref(), Some("Write like Hemingway."));
        assert!(messages[0].content.contains("A long winding sentence"));
    }

    #[tokio::test]
    async fn style_without_a_prompt_derives_one_from_the_author() {
        let completer = CannedCompleter::new("ok");
        let style = Style {
            id: Uuid::new_v4(),
            author_name: "Woolf".to_string(),
            preview: "Streams of thought.".to_string(),
            system_prompt: None,
        };

        apply_style(&completer, &style, "Text").await.expect("Transform failed");

        let (_, system) = completer.last_request();
        assert!(system.unwrap_or_default().contains("Woolf"));
    }

    #[tokio::test]
    async fn transforms_require_a_key() {
        let completer = CannedCompleter::unconfigured();
        let framework = Framework::new("Any", "", "");

        let result = apply_framework(&completer, &framework, "Text").await;

        assert!(matches!(result, Err(AiError::Config)));
    }
}
