//! Web server command.

use console::style;

use crate::config::Settings;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let (host, port) = match bind {
        Some(bind) => parse_bind_address(bind, settings.port),
        None => (settings.host.clone(), settings.port),
    };

    println!(
        "{} Starting annobatch server at http://{}:{} ({} workers)",
        style("→").cyan(),
        host,
        port,
        settings.workers
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "8010" -> 127.0.0.1:8010
/// - Just a host: "0.0.0.0" -> 0.0.0.0:default_port
/// - Host and port: "0.0.0.0:8010" -> 0.0.0.0:8010
fn parse_bind_address(bind: &str, default_port: u16) -> (String, u16) {
    if let Ok(port) = bind.parse::<u16>() {
        return (crate::config::DEFAULT_HOST.to_string(), port);
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    (bind.to_string(), default_port)
}
