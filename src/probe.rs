// Sonde HTTP du serveur YouAudio.
// GET /api/ping avec delai maximal : le serveur est considere vivant uniquement sur un 200.
// La requete est mise en concurrence avec le delai et le jeton d'arret ; le perdant est abandonne.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::session::ServerProbe;

/// Delai maximal par defaut d'une sonde
pub const PING_TIMEOUT: Duration = Duration::from_millis(3000);

const PING_PATH: &str = "/api/ping";
const QUIT_PATH: &str = "/api/quit";

fn endpoint(port: u16, path: &str) -> String {
    format!("http://localhost:{}{}", port, path)
}

/// Client HTTP vers l'API locale du serveur
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl HttpProbe {
    /// `shutdown` annule les sondes et requetes d'arret encore en vol.
    pub fn new(shutdown: CancellationToken) -> Result<Self> {
        let client = Client::builder()
            .no_proxy()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            timeout: PING_TIMEOUT,
            shutdown,
        })
    }

    /// Interroge /api/ping et attend au plus `timeout`.
    /// La reponse doit etre recue en entier (corps compris) dans ce delai.
    pub async fn probe(&self, port: u16, timeout: Duration) -> bool {
        let url = endpoint(port, PING_PATH);
        let exchange = async {
            let response = self.client.get(&url).send().await?;
            let status = response.status();
            response.bytes().await?;
            Ok::<_, reqwest::Error>(status)
        };

        tokio::select! {
            _ = self.shutdown.cancelled() => {
                tracing::debug!("{}", crate::t!("probe.cancelled", &url));
                false
            }
            result = tokio::time::timeout(timeout, exchange) => match result {
                Ok(Ok(status)) => {
                    if status != StatusCode::OK {
                        tracing::debug!("{}", crate::t!("probe.bad_status", &url, status));
                    }
                    status == StatusCode::OK
                }
                Ok(Err(e)) => {
                    tracing::debug!("{}", crate::t!("probe.unreachable", &url, e));
                    false
                }
                Err(_) => {
                    tracing::debug!("{}", crate::t!("probe.timeout", &url, timeout.as_millis()));
                    false
                }
            }
        }
    }
}

impl ServerProbe for HttpProbe {
    async fn is_running(&self, port: u16) -> bool {
        self.probe(port, self.timeout).await
    }

    /// Envoie GET /api/quit sans attendre la reponse.
    /// Doit etre appele depuis le runtime tokio.
    fn request_quit(&self, port: u16) {
        let url = endpoint(port, QUIT_PATH);
        tracing::info!("{}", crate::t!("probe.quit_sent", &url));
        let request = self.client.get(&url).send();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                result = request => {
                    if let Err(e) = result {
                        tracing::debug!("{}", crate::t!("probe.unreachable", &url, e));
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_answering(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;
        server
    }

    fn probe() -> HttpProbe {
        HttpProbe::new(CancellationToken::new()).unwrap()
    }

    /// Port local sur lequel plus personne n'ecoute
    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn ok_status_means_running() {
        let server = server_answering(200).await;
        assert!(probe().is_running(server.address().port()).await);
    }

    #[tokio::test]
    async fn other_statuses_mean_not_running() {
        for status in [204, 404, 500] {
            let server = server_answering(status).await;
            assert!(
                !probe().is_running(server.address().port()).await,
                "status {} should not count as running",
                status
            );
        }
    }

    #[tokio::test]
    async fn no_listener_means_not_running() {
        assert!(!probe().is_running(closed_port()).await);
    }

    #[tokio::test]
    async fn stalled_server_is_bounded_by_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let started = Instant::now();
        let running = probe()
            .probe(server.address().port(), Duration::from_millis(300))
            .await;

        assert!(!running);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn stalled_body_is_bounded_by_timeout() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // En-tetes 200 envoyes, corps annonce mais jamais transmis
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 64\r\n\r\n{\"status\"")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let started = Instant::now();
        let running = probe().probe(port, Duration::from_millis(300)).await;

        assert!(!running);
        assert!(started.elapsed() < Duration::from_secs(3));
        server.abort();
    }

    #[tokio::test]
    async fn cancelled_probe_returns_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PING_PATH))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let shutdown = CancellationToken::new();
        let probe = HttpProbe::new(shutdown.clone()).unwrap();
        shutdown.cancel();

        let started = Instant::now();
        assert!(!probe.is_running(server.address().port()).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn quit_request_reaches_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(QUIT_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        probe().request_quit(server.address().port());

        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            let received = server.received_requests().await.unwrap_or_default();
            if !received.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        server.verify().await;
    }
}
