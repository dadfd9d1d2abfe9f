use apiwrap_core::error::Provider;
use apiwrap_core::hass::{
    annotate_light_state, build_service_data, ensure_scene_found, normalize_base_url, qualify,
    ServiceRef,
};
use colored::Colorize;

use crate::error::require_env;
use crate::http::{segment, Transport};
use crate::prelude::{eprintln, println, *};

/// Home Assistant module app - root command
#[derive(Debug, clap::Parser)]
#[command(name = "hass")]
#[command(about = "Home Assistant states, services, scripts and scenes")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,

    /// Home Assistant URL (overrides HASS_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Show the state of an entity
    #[clap(name = "state")]
    State(StateOptions),

    /// Call a service, e.g. light.turn_on
    #[clap(name = "service")]
    Service(ServiceOptions),

    /// Run a script
    #[clap(name = "script")]
    Script(ScriptOptions),

    /// Trigger an automation
    #[clap(name = "automation")]
    Automation(AutomationOptions),

    /// Activate a scene
    #[clap(name = "scene")]
    Scene(SceneOptions),

    /// Fire an event
    #[clap(name = "event")]
    Event(EventOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct StateOptions {
    /// Entity id, e.g. light.kitchen
    pub entity_id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ServiceOptions {
    /// Service in domain.service form
    pub service: String,

    /// Target entity; rewritten into the service's domain when needed
    #[arg(long)]
    pub entity_id: Option<String>,

    /// Service data as a JSON object
    #[arg(long)]
    pub data: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ScriptOptions {
    pub name: String,

    /// Start the script and return without waiting for it to finish
    #[arg(long)]
    pub no_wait: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct AutomationOptions {
    pub name: String,

    /// Run the actions without evaluating the conditions
    #[arg(long)]
    pub skip_condition: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct SceneOptions {
    pub name: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct EventOptions {
    pub event_type: String,

    /// Event data as a JSON object
    #[arg(long)]
    pub data: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Home Assistant configuration from environment variables
#[derive(Debug, Clone)]
pub struct HassConfig {
    pub base_url: String,
    pub access_token: String,
}

impl HassConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: require_env("HASS_BASE_URL")?,
            access_token: require_env("HASS_ACCESS_TOKEN")?,
        })
    }

    pub fn with_overrides(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }
}

/// Adapter for one Home Assistant instance
#[derive(Debug, Clone)]
pub struct Hass {
    transport: Transport,
    api_root: String,
}

impl Hass {
    pub fn new(config: &HassConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(Provider::Hass, Some(&config.access_token))?,
            api_root: normalize_base_url(&config.base_url),
        })
    }

    /// Entity state; lights also get `attributes.brightness_pct`.
    pub async fn get_state(&self, entity_id: &str) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}/states/{}", self.api_root, segment(entity_id));
        let state = self
            .transport
            .json(
                self.transport.get(&url),
                &format!("get state of \"{entity_id}\""),
            )
            .await?;
        Ok(annotate_light_state(entity_id, state))
    }

    pub async fn call_service(
        &self,
        service: &str,
        entity_id: Option<&str>,
        data: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let service_ref = ServiceRef::parse(service)?;
        let body = build_service_data(&service_ref, entity_id, data);
        let url = format!("{}{}", self.api_root, service_ref.path());
        self.transport
            .json(
                self.transport.post(&url).json(&body),
                &format!("call service \"{service_ref}\""),
            )
            .await
    }

    /// Run a script, either as its own service (waits) or through `script.turn_on`.
    pub async fn activate_script(
        &self,
        name: &str,
        await_response: bool,
    ) -> Result<serde_json::Value, ApiError> {
        let script = qualify("script", name);
        if await_response {
            self.call_service(&script, None, None).await
        } else {
            self.call_service("script.turn_on", Some(&script), None).await
        }
    }

    pub async fn trigger_automation(
        &self,
        name: &str,
        skip_condition: bool,
    ) -> Result<serde_json::Value, ApiError> {
        let automation = qualify("automation", name);
        self.call_service(
            "automation.trigger",
            Some(&automation),
            Some(serde_json::json!({ "skip_condition": skip_condition })),
        )
        .await
    }

    pub async fn activate_scene(&self, name: &str) -> Result<serde_json::Value, ApiError> {
        let scene = qualify("scene", name);
        let response = self
            .call_service("scene.turn_on", Some(&scene), None)
            .await?;
        ensure_scene_found(&scene, &response)?;
        Ok(response)
    }

    pub async fn fire_event(
        &self,
        event_type: &str,
        data: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, ApiError> {
        let url = format!("{}/events/{}", self.api_root, segment(event_type));
        let body = data.unwrap_or_else(|| serde_json::json!({}));
        self.transport
            .json(
                self.transport.post(&url).json(&body),
                &format!("fire event \"{event_type}\""),
            )
            .await
    }
}

fn parse_data(raw: Option<&str>) -> Result<Option<serde_json::Value>> {
    raw.map(|raw| {
        let value: serde_json::Value =
            serde_json::from_str(raw).wrap_err("--data must be a JSON object")?;
        if !value.is_object() {
            return Err(eyre!("--data must be a JSON object, got {value}"));
        }
        Ok(value)
    })
    .transpose()
}

/// Module entry point
pub async fn run(app: App, global: crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running Home Assistant module...");
    }

    let config = HassConfig::from_env()?.with_overrides(app.base_url);
    let hass = Hass::new(&config)?;

    let (response, json) = match app.command {
        Commands::State(options) => {
            let state = hass.get_state(&options.entity_id).await?;
            if options.json {
                return print_json(&state);
            }
            display_state(&state);
            return Ok(());
        }
        Commands::Service(options) => {
            let data = parse_data(options.data.as_deref())?;
            let response = hass
                .call_service(&options.service, options.entity_id.as_deref(), data)
                .await?;
            (response, options.json)
        }
        Commands::Script(options) => (
            hass.activate_script(&options.name, !options.no_wait).await?,
            options.json,
        ),
        Commands::Automation(options) => (
            hass.trigger_automation(&options.name, options.skip_condition)
                .await?,
            options.json,
        ),
        Commands::Scene(options) => (hass.activate_scene(&options.name).await?, options.json),
        Commands::Event(options) => {
            let data = parse_data(options.data.as_deref())?;
            (
                hass.fire_event(&options.event_type, data).await?,
                options.json,
            )
        }
    };

    if json {
        return print_json(&response);
    }

    match response.as_array() {
        Some(changed) => {
            println!("{} ({} state(s) changed)", "Done".green(), changed.len());
            for state in changed {
                display_state(state);
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&response)?),
    }

    Ok(())
}

fn display_state(state: &serde_json::Value) {
    let text = |key: &str| state.get(key).and_then(|v| v.as_str()).unwrap_or("");

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Entity".bold().cyan(),
        text("entity_id").bright_white()
    ]);
    table.add_row(prettytable::row!["State".bold().cyan(), text("state").green()]);
    if let Some(attributes) = state.get("attributes").and_then(|a| a.as_object()) {
        for (key, value) in attributes {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            table.add_row(prettytable::row![key.bright_black(), rendered]);
        }
    }
    table.add_row(prettytable::row![
        "Last changed".bold().cyan(),
        text("last_changed").bright_black()
    ]);
    table.printstd();
}
