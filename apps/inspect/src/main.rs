//! Diagnostic entry point: detect the local Steam installation and dump
//! everything the plugin core can see.

use std::sync::Arc;

use steampad_steam::{AppCondition, Steam};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "steampad inspect");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run())
}

async fn run() -> anyhow::Result<()> {
    let steam = Steam::create().await?;

    let installation = steam.installation();
    println!("installation");
    println!("  exe:        {}", installation.exe_path.display());
    println!("  path:       {}", installation.install_path.display());
    println!(
        "  auto login: {}",
        steam.auto_login_account().unwrap_or("(none)")
    );

    println!("\nlibrary folders ({})", steam.library_folders().len());
    for folder in steam.library_folders() {
        println!(
            "  {} (content id {}, {} declared apps)",
            folder.path.display(),
            folder.content_id,
            folder.apps.len()
        );
    }

    println!("\ninstalled apps ({})", steam.installed_apps().len());
    for app in steam.installed_apps() {
        println!(
            "  {:>8}  {:<40} {}",
            app.id,
            app.name,
            condition_label(app.state_flags.condition())
        );
    }

    println!("\nuser profiles ({})", steam.user_profiles().len());
    for profile in steam.user_profiles() {
        println!(
            "  {}  {} ({}){}",
            profile.steam_id64,
            profile.persona_name,
            profile.account_name,
            if profile.avatar.is_some() {
                ", cached avatar"
            } else {
                ""
            }
        );
    }

    println!("\nlive status");
    println!("  client running:      {}", steam.is_client_running().await);
    println!(
        "  big picture running: {}",
        steam.is_big_picture_running().await
    );

    // Show what the remote catalog knows about the first installed app.
    if let Some(app) = steam.installed_apps().first() {
        let client = steampad_appmeta::Client::new()?;
        match client.app_info(app.id).await {
            Ok(Some(meta)) => {
                println!("\ncatalog metadata for {}", app.id);
                println!("  name:      {}", meta.name);
                println!(
                    "  icon hash: {}",
                    meta.icon_hash.as_deref().unwrap_or("(none)")
                );
                let resolver = steam.icon_resolver(Arc::new(client));
                let icon = resolver.resolve_app_icon(app.id).await;
                println!("  icon:      {}", if icon.is_some() { "resolved" } else { "unresolved" });
            }
            Ok(None) => println!("\nno catalog metadata for {}", app.id),
            Err(e) => tracing::warn!("catalog lookup failed: {e}"),
        }
    }

    Ok(())
}

fn condition_label(condition: AppCondition) -> &'static str {
    match condition {
        AppCondition::Running => "running",
        AppCondition::Updating => "updating",
        AppCondition::UpdateRequired => "update required",
        AppCondition::Idle => "idle",
    }
}
