use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use pitwall_core::{
    BuildNumber, FileSkipMemory, GateError, GateState, HostInfo, SkipMemory, StoreTarget,
    SystemStoreOpener, UpdateClient, UpdateGate, UpdateInfo, VersionString,
};

use crate::error::AppError;
use crate::settings::AppSettings;

/// Composition root: owns the settings and the session's update gate.
pub struct App {
    settings: AppSettings,
    gate: Arc<UpdateGate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptAction {
    Update,
    Skip,
    Later,
}

impl PromptAction {
    fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "u" | "update" => Self::Update,
            "s" | "skip" => Self::Skip,
            _ => Self::Later,
        }
    }
}

impl App {
    pub fn new(settings: AppSettings) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.http_timeout_secs))
            .user_agent(format!("pitwall/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AppError::HttpClient)?;

        let source = UpdateClient::new(http_client, &settings.api_base_url)?;
        let skip_memory: Arc<dyn SkipMemory> = match FileSkipMemory::at_default_location() {
            Ok(memory) => Arc::new(memory),
            Err(error) => {
                debug!(
                    "Config directory unavailable, keeping skip record in temp dir: {error}"
                );
                Arc::new(FileSkipMemory::new(
                    std::env::temp_dir().join("pitwall-skipped_version.json"),
                ))
            }
        };
        let platform = settings.platform();
        let store = SystemStoreOpener::new(StoreTarget::for_platform(
            platform,
            settings.store_app_name.clone(),
        ));

        let gate = UpdateGate::new(
            host_info(platform),
            Arc::new(source),
            skip_memory,
            Arc::new(store),
        );

        Ok(Self {
            settings,
            gate: Arc::new(gate),
        })
    }

    pub async fn run(&self) -> Result<(), AppError> {
        if !self.settings.check_for_updates {
            info!("Update checks disabled in settings");
            return Ok(());
        }

        let Some(state) = self.gate.run_startup_check().await else {
            return Ok(());
        };

        match state {
            GateState::PromptVisible(update) => self.prompt(&update).await,
            other => {
                debug!("Startup update check settled as {other}");
                Ok(())
            }
        }
    }

    async fn prompt(&self, update: &UpdateInfo) -> Result<(), AppError> {
        println!("{}", describe_update(update));

        loop {
            println!("[u]pdate now, [s]kip this version, anything else for later:");
            let input = read_line().await?;

            let result = match PromptAction::parse(&input) {
                PromptAction::Update => {
                    let gate = Arc::clone(&self.gate);
                    tokio::task::spawn_blocking(move || gate.accept_and_open_store())
                        .await
                        .map_err(std::io::Error::other)?
                }
                PromptAction::Skip => self.gate.skip(),
                PromptAction::Later => self.gate.dismiss(),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(GateError::StoreOpen(error)) => {
                    println!("Could not open the store ({error}). Try again?");
                }
                Err(error @ GateError::NoPrompt { .. }) => {
                    debug!("Prompt closed unexpectedly: {error}");
                    return Ok(());
                }
            }
        }
    }
}

fn host_info(platform: pitwall_platform::Platform) -> HostInfo {
    HostInfo {
        current_version: VersionString::new(env!("CARGO_PKG_VERSION")),
        platform,
        build_number: option_env!("PITWALL_BUILD_NUMBER")
            .map_or(BuildNumber::Number(0), BuildNumber::from),
    }
}

fn describe_update(update: &UpdateInfo) -> String {
    let mut text = format!(
        "Pitwall {} is available (you have {}).",
        update.latest_version, update.current_version
    );
    if update.is_required {
        text.push_str(" This update is required.");
    }
    if let Some(notes) = &update.release_notes {
        text.push_str("\n\n");
        text.push_str(notes);
    }
    text
}

async fn read_line() -> Result<String, AppError> {
    let line = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await
    .map_err(std::io::Error::other)??;
    Ok(line)
}
