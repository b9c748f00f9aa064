mod app;
mod config;
mod dashboard;
mod error;

use std::process::ExitCode;

use remote::SupabaseClient;

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let (config, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "financeflow={level},engine={level},remote={level}",
            level = config.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let client = SupabaseClient::new(&config.base_url, &config.api_key)?;
    let mut app = app::App::new(client.clone());

    if let Err(err) = app::sign_in(&client, &config).await {
        tracing::error!("sign in failed: {err}");
        app.sign_in_failed(err.to_string());
    }
    app.start().await?;

    let mut stdout = std::io::stdout().lock();
    let ok = app.run(command, &mut stdout).await?;
    app.shutdown();

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
