mod app;
mod error;
mod logging;
mod settings;

use std::process::ExitCode;

use crate::app::App;
use crate::settings::AppSettings;

#[tokio::main]
async fn main() -> ExitCode {
    let settings = AppSettings::load();
    logging::init_logging(settings.debug_logging, settings.max_log_size_bytes);

    let app = match App::new(settings) {
        Ok(app) => app,
        Err(error) => {
            log::error!("Failed to start: {error}");
            eprintln!("pitwall: {error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = app.run().await {
        log::error!("{error}");
        eprintln!("pitwall: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
