use apiwrap_core::error::Provider;
use apiwrap_core::groq::{build_chat_request, first_choice_text, Message, Sampling, API_ROOT};
use colored::Colorize;

use crate::error::{parse_env, require_env};
use crate::http::Transport;
use crate::prelude::{eprintln, println, *};

/// Groq module app - root command
#[derive(Debug, clap::Parser)]
#[command(name = "groq")]
#[command(about = "Groq inference API")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List available models
    #[clap(name = "models")]
    Models(ModelsOptions),

    /// Send a chat completion request
    #[clap(name = "chat")]
    Chat(ChatOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ModelsOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ChatOptions {
    /// User message
    pub prompt: String,

    /// System message
    #[arg(long, short = 's', default_value = "You are a helpful assistant.")]
    pub system: String,

    /// Model id (overrides GROQ_MODEL)
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Sampling temperature (overrides GROQ_TEMPERATURE)
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Completion token limit (overrides GROQ_MAX_TOKENS)
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Groq configuration from environment variables
#[derive(Debug, Clone)]
pub struct GroqConfig {
    pub api_token: String,
    pub defaults: Sampling,
}

impl GroqConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_token: require_env("GROQ_API_TOKEN")?,
            defaults: Sampling {
                model: std::env::var("GROQ_MODEL").ok().filter(|m| !m.is_empty()),
                temperature: parse_env("GROQ_TEMPERATURE")?,
                max_tokens: parse_env("GROQ_MAX_TOKENS")?,
            },
        })
    }
}

/// Adapter for the Groq API
#[derive(Debug, Clone)]
pub struct Groq {
    transport: Transport,
    defaults: Sampling,
}

impl Groq {
    pub fn new(config: &GroqConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(Provider::Groq, Some(&config.api_token))?,
            defaults: config.defaults.clone(),
        })
    }

    pub async fn get_models(&self) -> Result<serde_json::Value, ApiError> {
        let request = self.transport.get(&format!("{API_ROOT}/models"));
        self.transport.json(request, "get models").await
    }

    pub async fn chat_completion(
        &self,
        messages: Vec<Message>,
        overrides: &Sampling,
    ) -> Result<serde_json::Value, ApiError> {
        let body = build_chat_request(messages, &self.defaults, overrides)?;
        log::debug!("Chat completion with model {}", body.model);
        let request = self
            .transport
            .post(&format!("{API_ROOT}/chat/completions"))
            .json(&body);
        self.transport.json(request, "get chat completion").await
    }
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running Groq module...");
    }

    let groq = Groq::new(&GroqConfig::from_env()?)?;

    match app.command {
        Commands::Models(options) => {
            let models = groq.get_models().await?;
            if options.json {
                return print_json(&models);
            }

            let mut table = new_table();
            table.add_row(prettytable::row![
                "ID".bold().cyan(),
                "Owner".bold().cyan(),
                "Context".bold().cyan(),
            ]);
            let empty = Vec::new();
            for model in models
                .get("data")
                .and_then(|d| d.as_array())
                .unwrap_or(&empty)
            {
                let text = |key: &str| {
                    model
                        .get(key)
                        .map(|v| match v {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_default()
                };
                table.add_row(prettytable::row![
                    text("id").bright_white(),
                    text("owned_by").bright_black(),
                    text("context_window"),
                ]);
            }
            table.printstd();
        }
        Commands::Chat(options) => {
            let messages = vec![
                Message::new("system", options.system),
                Message::new("user", options.prompt),
            ];
            let overrides = Sampling {
                model: options.model,
                temperature: options.temperature,
                max_tokens: options.max_tokens,
            };
            let response = groq.chat_completion(messages, &overrides).await?;
            if options.json {
                return print_json(&response);
            }
            match first_choice_text(&response) {
                Some(text) => println!("{text}"),
                None => println!("{}", "The response contained no choices".yellow()),
            }
        }
    }

    Ok(())
}
