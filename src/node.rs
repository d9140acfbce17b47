//! Node wiring: configuration to session and role.

use std::future::Future;

use thiserror::Error;

use msd_config::{ConfigError, NodeConfig};
use msd_multicast::{
    Discoverer, DiscovererSettings, Instance, MulticastError, PeerEvent, Session, SessionConfig,
};
use msd_types::ValidationError;

/// Errors that can occur when starting or running a node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("multicast error: {0}")]
    Multicast(#[from] MulticastError),
    #[error("no host configured to announce")]
    MissingHost,
}

/// Build the session configuration for a node.
pub fn session_config(config: &NodeConfig) -> Result<SessionConfig, NodeError> {
    Ok(SessionConfig::new(config.group_id()?)
        .with_interface(config.multicast_interface.clone())
        .with_port(config.port)
        .with_multicast_hops(config.multicast_hops))
}

/// Build discoverer timing from a node configuration.
pub fn discoverer_settings(config: &NodeConfig) -> DiscovererSettings {
    DiscovererSettings {
        discover_interval: config.discover_interval(),
        cleanup_interval: config.cleanup_interval(),
        peer_ttl: config.peer_ttl(),
    }
}

/// Run a discoverer until `shutdown` resolves, passing each peer event to
/// `on_event`.
pub async fn run_discoverer<F, E>(
    config: &NodeConfig,
    shutdown: F,
    mut on_event: E,
) -> Result<(), NodeError>
where
    F: Future<Output = ()>,
    E: FnMut(PeerEvent),
{
    let session = Session::bind(&session_config(config)?)?;
    let (mut discoverer, mut events) = Discoverer::new(discoverer_settings(config));

    tracing::info!(
        address = %session.address(),
        discover_interval = ?discoverer.settings().discover_interval,
        peer_ttl = ?discoverer.settings().peer_ttl,
        "Starting discoverer"
    );

    let run = session.run(&mut discoverer, shutdown);
    tokio::pin!(run);

    loop {
        tokio::select! {
            result = &mut run => {
                while let Ok(event) = events.try_recv() {
                    on_event(event);
                }
                result?;
                break;
            }
            Some(event) = events.recv() => on_event(event),
        }
    }

    tracing::info!("Discoverer stopped");
    Ok(())
}

/// Run an instance announcing the configured host until `shutdown` resolves.
///
/// The host record is validated before any socket is bound.
pub async fn run_instance<F>(config: &NodeConfig, shutdown: F) -> Result<(), NodeError>
where
    F: Future<Output = ()>,
{
    let host = config.host_record().ok_or(NodeError::MissingHost)?;
    let mut instance = Instance::new(host)?;

    let session = Session::bind(&session_config(config)?)?;
    tracing::info!(
        address = %session.address(),
        id = %instance.host().id,
        url = %instance.host().url,
        "Starting instance"
    );

    session.run(&mut instance, shutdown).await?;

    tracing::info!("Instance stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use msd_config::HostConfig;

    #[test]
    fn test_session_config_from_node_config() {
        let mut config = NodeConfig::generate();
        config.multicast_interface = Some("eth0".to_string());
        config.port = 40000;
        config.multicast_hops = 4;

        let session = session_config(&config).unwrap();
        assert_eq!(session.group.to_hex(), "55c545258c440a731a50810425bc");
        assert_eq!(session.interface.as_deref(), Some("eth0"));
        assert_eq!(session.port, 40000);
        assert_eq!(session.multicast_hops, 4);
    }

    #[test]
    fn test_session_config_rejects_bad_group() {
        let mut config = NodeConfig::generate();
        config.multicast_group_id = "abcd".to_string();

        assert!(matches!(session_config(&config), Err(NodeError::Config(_))));
    }

    #[test]
    fn test_discoverer_settings_from_node_config() {
        let mut config = NodeConfig::generate();
        config.discover_interval = 5;
        config.cleanup_interval = 10;
        config.peer_ttl = 30;

        let settings = discoverer_settings(&config);
        assert_eq!(settings.discover_interval, Duration::from_secs(5));
        assert_eq!(settings.cleanup_interval, Duration::from_secs(10));
        assert_eq!(settings.peer_ttl, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_instance_requires_host() {
        let config = NodeConfig::generate();

        let result = run_instance(&config, std::future::pending()).await;
        assert!(matches!(result, Err(NodeError::MissingHost)));
    }

    #[tokio::test]
    async fn test_instance_validates_before_binding() {
        let mut config = NodeConfig::generate();
        config.host = Some(HostConfig {
            id: "short".to_string(),
            url: "not a url".to_string(),
        });

        match run_instance(&config, std::future::pending()).await {
            Err(NodeError::Validation(e)) => assert_eq!(e.violations.len(), 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
