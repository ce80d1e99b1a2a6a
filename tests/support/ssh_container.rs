// ABOUTME: SSH/SFTP server container helper for integration tests.
// ABOUTME: Uses bollard to run one shared password-auth openssh-server per test binary.

use bollard::Docker;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, RemoveContainerOptions, StartContainerOptions,
    StopContainerOptions,
};
use futures::StreamExt;
use sitepush::ssh::SessionConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

const IMAGE: &str = "lscr.io/linuxserver/openssh-server:latest";
const SSH_PORT: u16 = 2222;
const TEST_USER: &str = "deploy";
const TEST_PASSWORD: &str = "sitepush-test";

/// Home directory of the test user inside the container.
pub const HOME: &str = "/config";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Container id kept for removal at process exit.
static CONTAINER_ID: OnceLock<String> = OnceLock::new();

#[ctor::dtor]
fn remove_container_on_exit() {
    let Some(id) = CONTAINER_ID.get() else {
        return;
    };
    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return;
    };
    rt.block_on(async {
        if let Ok(docker) = Docker::connect_with_local_defaults() {
            let _ = docker
                .stop_container(id, None::<StopContainerOptions>)
                .await;
            let _ = docker
                .remove_container(
                    id,
                    Some(RemoveContainerOptions {
                        force: true,
                        ..Default::default()
                    }),
                )
                .await;
        }
    });
}

static SHARED_CONTAINER: tokio::sync::OnceCell<Option<SftpContainer>> =
    tokio::sync::OnceCell::const_new();

/// The shared SFTP server, or None when no container engine is reachable.
pub async fn shared_container() -> Option<&'static SftpContainer> {
    SHARED_CONTAINER
        .get_or_init(|| async {
            match SftpContainer::start().await {
                Ok(container) => Some(container),
                Err(e) => {
                    eprintln!("SFTP container unavailable, skipping: {}", e);
                    None
                }
            }
        })
        .await
        .as_ref()
}

/// Running SFTP server reachable on a local port.
pub struct SftpContainer {
    port: u16,
}

impl SftpContainer {
    async fn start() -> Result<Self, BoxError> {
        let docker = Docker::connect_with_local_defaults()?;
        docker.ping().await?;

        let mut pull = docker.create_image(
            Some(CreateImageOptions {
                from_image: Some(IMAGE.to_string()),
                ..Default::default()
            }),
            None,
            None,
        );
        while let Some(progress) = pull.next().await {
            progress?;
        }

        let port = free_port().await?;
        let env = vec![
            "PUID=1000".to_string(),
            "PGID=1000".to_string(),
            format!("USER_NAME={}", TEST_USER),
            format!("USER_PASSWORD={}", TEST_PASSWORD),
            "PASSWORD_ACCESS=true".to_string(),
        ];

        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            format!("{}/tcp", SSH_PORT),
            Some(vec![bollard::models::PortBinding {
                host_ip: Some("127.0.0.1".to_string()),
                host_port: Some(port.to_string()),
            }]),
        );

        let config = ContainerCreateBody {
            image: Some(IMAGE.to_string()),
            env: Some(env),
            host_config: Some(bollard::models::HostConfig {
                port_bindings: Some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };

        let container = docker
            .create_container(
                Some(CreateContainerOptions {
                    name: Some(format!("sitepush-sftp-test-{}", std::process::id())),
                    ..Default::default()
                }),
                config,
            )
            .await?;
        let _ = CONTAINER_ID.set(container.id.clone());

        docker
            .start_container(&container.id, None::<StartContainerOptions>)
            .await?;

        wait_for_banner(port).await?;
        Ok(Self { port })
    }

    /// Password-authenticated session settings for this server.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new("127.0.0.1", TEST_USER)
            .port(self.port)
            .password(TEST_PASSWORD)
            .trust_on_first_use(true)
            .known_hosts_path(known_hosts_path())
    }

    /// A fresh directory path under the test user's home.
    pub fn scratch_dir(&self, name: &str) -> String {
        format!("{}/{}-{}", HOME, name, std::process::id())
    }
}

/// Per-process known_hosts so tests never touch the user's file.
fn known_hosts_path() -> PathBuf {
    std::env::temp_dir().join(format!("sitepush-known-hosts-{}", std::process::id()))
}

async fn free_port() -> Result<u16, BoxError> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    Ok(port)
}

async fn wait_for_banner(port: u16) -> Result<(), BoxError> {
    use tokio::io::AsyncReadExt;

    let addr = format!("127.0.0.1:{}", port);
    for _ in 0..60 {
        if let Ok(mut stream) = tokio::net::TcpStream::connect(&addr).await {
            let mut buf = [0u8; 32];
            if let Ok(Ok(n)) =
                tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf)).await
                && n > 0
                && buf[..n].starts_with(b"SSH-")
            {
                // sshd accepts connections slightly before users are provisioned
                tokio::time::sleep(Duration::from_secs(1)).await;
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Err("SFTP container did not become ready in time".into())
}
