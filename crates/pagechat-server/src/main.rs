//! PageChat: backend for the page-to-chat browser extension.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pagechat_chat::{Dispatcher, SettingsStore};
use pagechat_core::PageChatConfig;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("PAGECHAT_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

fn print_help() {
    println!("PageChat: send page content to a chat-completion endpoint");
    println!();
    println!("Usage: pagechat [command]");
    println!();
    println!("Commands:");
    println!("  (none)                   Start the server");
    println!("  extract <file.html>      Print the sanitized text of an HTML file");
    println!("  send <text...>           Send text to the configured endpoint");
    println!("  help                     Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "extract" => {
                let Some(path) = args.get(2) else {
                    eprintln!("Usage: pagechat extract <file.html>");
                    std::process::exit(1);
                };
                let html = std::fs::read_to_string(path)?;
                let text = pagechat_extract::extract_html(&html)?;
                if text.is_empty() {
                    eprintln!("No text content found in {}", path);
                    std::process::exit(1);
                }
                println!("{}", text);
                return Ok(());
            }
            "send" => {
                let content = args[2..].join(" ");
                let config = PageChatConfig::from_env(resolve_data_dir())?;
                let store = Arc::new(SettingsStore::open(&config.data_paths.settings_file));
                let dispatcher = Dispatcher::new(store, config.dispatch);
                match dispatcher.try_dispatch(&content).await {
                    Ok(reply) => {
                        println!("{}", reply);
                        return Ok(());
                    }
                    Err(e) => {
                        eprintln!("{}", e);
                        std::process::exit(1);
                    }
                }
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'pagechat help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = PageChatConfig::from_env(&data_dir)?;
    let port = config.port;
    info!(
        "Dispatch policy: timeout {:?}, overlap {:?}",
        config.dispatch.request_timeout, config.dispatch.overlap
    );

    let state = Arc::new(AppState::new(config));
    state::start_panel_sweeper(state.clone());
    let app = routes::build_router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("PageChat server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
