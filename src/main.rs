use zoezi_bridge::modules;
use zoezi_bridge::proxy;

#[tokio::main]
async fn main() -> Result<(), String> {
    modules::logger::init_logger();

    let mut bridge_config = match modules::config::load_bridge_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("failed to load bridge config: {}. using defaults", err);
            let cfg = proxy::BridgeConfig::default();
            let _ = modules::config::save_bridge_config(&cfg);
            cfg
        }
    };

    if let Ok(value) = std::env::var("ZOEZI_BRIDGE_ALLOW_LAN") {
        let enabled = matches!(value.as_str(), "1" | "true" | "yes" | "on");
        if enabled {
            bridge_config.allow_lan_access = true;
        }
    }

    if let Ok(value) = std::env::var("ZOEZI_BRIDGE_PORT") {
        match value.parse::<u16>() {
            Ok(port) => bridge_config.port = port,
            Err(_) => tracing::warn!("ignoring invalid ZOEZI_BRIDGE_PORT: {}", value),
        }
    }

    if let Ok(host) = std::env::var("ZOEZI_BRIDGE_UPSTREAM") {
        if !host.is_empty() {
            bridge_config.upstream_host = host;
        }
    }

    if let Ok(domain) = std::env::var("ZOEZI_BRIDGE_DOMAIN") {
        if !domain.is_empty() {
            bridge_config.site_domain = domain;
        }
    }

    if let Ok(web_root) = std::env::var("ZOEZI_BRIDGE_WEB_ROOT") {
        if !web_root.is_empty() {
            bridge_config.web_root = Some(web_root);
        }
    }

    let bind_address = if let Ok(addr) = std::env::var("ZOEZI_BRIDGE_BIND") {
        if addr != "127.0.0.1" && addr != "localhost" {
            bridge_config.allow_lan_access = true;
        }
        addr
    } else {
        bridge_config.get_bind_address().to_string()
    };

    let (server, handle) = proxy::AxumServer::start(bind_address.clone(), &bridge_config)
        .await
        .map_err(|e| format!("failed to start bridge server: {}", e))?;

    tracing::info!(
        "zoezi-bridge listening on http://{}:{} (upstream: {}, cookie domain: .{})",
        bind_address,
        bridge_config.port,
        bridge_config.upstream_host,
        bridge_config.site_domain
    );

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {}", e))?;

    tracing::info!("shutdown requested, stopping server...");
    server.stop();
    let _ = handle.await;

    Ok(())
}
