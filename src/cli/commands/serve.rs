//! Web server command.

use console::style;

use instante_scrape::config::Settings;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    println!(
        "{} Starting instante server at http://{}:{} ({:?} session)",
        style("→").cyan(),
        host,
        port,
        settings.session
    );
    println!("  Press Ctrl+C to stop");

    instante_scrape::server::serve(settings, host, port).await
}
