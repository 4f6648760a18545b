//! Session bootstrap, the notification socket, and the delivery loop.

use crate::constants::{
    DEFAULT_HOSTNAME, DEFAULT_USER_AGENT, DELIVERY_BUFFER, FETCH_PATH, SESSION_COOKIE, SOCKET_PATH,
};
use crate::error::{Error, Result};
use crate::models::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use rand::Rng;
use serde_json::Value;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as Frame};
use tracing::{debug, info, warn};

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Immutable client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Outbound `User-Agent` value.
    pub agent: String,
    /// Target service host.
    pub hostname: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent: DEFAULT_USER_AGENT.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
        }
    }
}

/// A live subscription to one public mailbox.
///
/// Construction bootstraps an anonymous session, connects the notification
/// socket, and starts the background delivery loop. Dropping the `Inbox`
/// stops the loop as well.
pub struct Inbox {
    conf: Config,
    mailbox: String,
    mail_rx: mpsc::Receiver<Message>,
    stop_tx: watch::Sender<bool>,
    err: Arc<Mutex<Option<Arc<Error>>>>,
}

impl Inbox {
    /// Subscribe to a public mailbox by name.
    ///
    /// Fails without starting anything if the session bootstrap or the
    /// socket handshake fails; there is no partially constructed inbox.
    pub async fn subscribe(mailbox: impl Into<String>, conf: Option<Config>) -> Result<Self> {
        let conf = conf.unwrap_or_default();
        let mailbox = mailbox.into();

        let client = http_client(&conf.agent)?;
        let session = fetch_session(&client, &root_url(&conf.hostname)).await?;
        debug!(host = %conf.hostname, "session cookie acquired");

        let request = socket_request(&conf, &session)?;
        let socket = open_socket(request).await?;
        debug!(mailbox = %mailbox, "notification socket connected");

        Ok(assemble(conf, mailbox, client, session, socket))
    }

    /// Receive the next accepted message.
    ///
    /// Returns `None` once the delivery loop has exited and the channel is
    /// closed, either after [`stop`](Self::stop) or on a terminal error
    /// (see [`last_error`](Self::last_error)).
    pub async fn recv(&mut self) -> Option<Message> {
        self.mail_rx.recv().await
    }

    /// Signal the delivery loop to stop.
    ///
    /// Safe to call any number of times. The loop observes the signal at
    /// its receive point, so shutdown can lag by up to one in-flight
    /// message fetch.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// The error the delivery loop terminated on, if any.
    ///
    /// A closed delivery channel with no recorded error means the loop
    /// stopped gracefully.
    pub fn last_error(&self) -> Option<Arc<Error>> {
        self.err.lock().unwrap().clone()
    }

    /// Name of the subscribed mailbox.
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Full disposable address of the subscribed mailbox.
    pub fn address(&self) -> String {
        format!("{}@{}", self.mailbox, self.conf.hostname.trim_start_matches("www."))
    }
}

/// Builder for an [`Inbox`], for callers that want to override parts of the
/// default configuration: `InboxBuilder::new().subscribe("name").await?`.
pub struct InboxBuilder {
    agent: Option<String>,
    hostname: Option<String>,
}

impl InboxBuilder {
    /// New builder with every field defaulted.
    pub fn new() -> Self {
        Self {
            agent: None,
            hostname: None,
        }
    }

    /// Set the outbound `User-Agent` value.
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Set the target service host.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Subscribe to `mailbox` with the collected configuration.
    pub async fn subscribe(self, mailbox: impl Into<String>) -> Result<Inbox> {
        let conf = self.into_config();
        Inbox::subscribe(mailbox, Some(conf)).await
    }

    fn into_config(self) -> Config {
        let mut conf = Config::default();
        if let Some(agent) = self.agent {
            conf.agent = agent;
        }
        if let Some(hostname) = self.hostname {
            conf.hostname = hostname;
        }
        conf
    }
}

/// Generate a random mailbox name (lowercase alphanumeric, 6 to 32 chars).
pub fn random_mailbox(len: usize) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    (0..len.clamp(6, 32))
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

fn root_url(hostname: &str) -> String {
    format!("https://{}/", hostname)
}

fn fetch_url(hostname: &str, id: &str) -> String {
    format!("https://{}{}?msgid={}", hostname, FETCH_PATH, id)
}

fn http_client(agent: &str) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(agent)
        .build()
        .map_err(Error::Http)
}

/// Obtain the anonymous session identifier from the service root.
async fn fetch_session(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?;
    resp.cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(Error::MissingSessionCookie)
}

/// Build the socket handshake request carrying the session cookie.
fn socket_request(conf: &Config, session: &str) -> Result<Request> {
    let url = format!("wss://{}{}", conf.hostname, SOCKET_PATH);
    let mut request = url.into_client_request().map_err(Error::Socket)?;

    let cookie = format!("{}={}", SESSION_COOKIE, session);
    let origin = format!("https://{}", conf.hostname);
    let headers = request.headers_mut();
    for (name, value) in [
        ("User-Agent", conf.agent.as_str()),
        ("Cookie", cookie.as_str()),
        ("Origin", origin.as_str()),
    ] {
        if let Ok(value) = value.parse() {
            headers.insert(name, value);
        }
    }
    Ok(request)
}

async fn open_socket(request: Request) -> Result<WsStream> {
    let (socket, _) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(Error::Socket)?;
    Ok(socket)
}

/// Fetch and decode the full message behind a notification identifier.
async fn fetch_message(client: &reqwest::Client, session: &str, url: &str) -> Result<Message> {
    info!(%url, "fetching full message");
    let body = client
        .get(url)
        .header(reqwest::header::COOKIE, format!("{}={}", SESSION_COOKIE, session))
        .send()
        .await?
        .text()
        .await?;
    serde_json::from_str(&body).map_err(Error::Decode)
}

fn frame_id(record: &Value) -> Option<String> {
    match record.get("id") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

/// Wire the delivery channel and stop signal together and start the loop.
fn assemble<S>(
    conf: Config,
    mailbox: String,
    client: reqwest::Client,
    session: String,
    socket: S,
) -> Inbox
where
    S: Stream<Item = std::result::Result<Frame, WsError>>
        + Sink<Frame, Error = WsError>
        + Unpin
        + Send
        + 'static,
{
    let (mail_tx, mail_rx) = mpsc::channel(DELIVERY_BUFFER);
    let (stop_tx, stop_rx) = watch::channel(false);
    let err = Arc::new(Mutex::new(None));

    let hostname = conf.hostname.clone();
    let fetch = move |id: String| {
        let client = client.clone();
        let session = session.clone();
        let url = fetch_url(&hostname, &id);
        async move { fetch_message(&client, &session, &url).await }
    };
    tokio::spawn(run(socket, mailbox.clone(), stop_rx, mail_tx, err.clone(), fetch));

    Inbox {
        conf,
        mailbox,
        mail_rx,
        stop_tx,
        err,
    }
}

/// Background task owning the socket for the lifetime of the subscription.
///
/// Sends the one-time subscribe command, then drives the delivery loop.
/// Any terminal error is recorded before the delivery channel closes, so a
/// consumer that sees the channel end can already read the cause.
async fn run<S, F, Fut>(
    mut socket: S,
    mailbox: String,
    stop: watch::Receiver<bool>,
    mail_tx: mpsc::Sender<Message>,
    err: Arc<Mutex<Option<Arc<Error>>>>,
    fetch: F,
) where
    S: Stream<Item = std::result::Result<Frame, WsError>> + Sink<Frame, Error = WsError> + Unpin,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Message>>,
{
    let command = serde_json::json!({ "cmd": "sub", "channel": mailbox.as_str() }).to_string();
    match socket.send(Frame::Text(command)).await {
        Ok(()) => debug!(mailbox = %mailbox, "subscribe command sent"),
        // The loop's first receive surfaces a genuinely dead socket.
        Err(e) => warn!(err = %e, "subscribe command failed to send"),
    }

    match deliver_frames(socket, stop, &mail_tx, fetch).await {
        Ok(()) => debug!("delivery loop stopped"),
        Err(e) => {
            warn!(err = %e, "delivery loop terminated");
            *err.lock().unwrap() = Some(Arc::new(e));
        }
    }
    // The error is visible before the channel closes.
    drop(mail_tx);
}

/// Receive notification frames, fetch each referenced message, and deliver
/// the ones with at least one body part, in receipt order.
///
/// Returns `Ok(())` on the stop signal (or once every stop handle is gone)
/// and an error when the socket or a fetch fails.
async fn deliver_frames<S, F, Fut>(
    mut frames: S,
    mut stop: watch::Receiver<bool>,
    mail_tx: &mpsc::Sender<Message>,
    fetch: F,
) -> Result<()>
where
    S: Stream<Item = std::result::Result<Frame, WsError>> + Unpin,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Message>>,
{
    loop {
        let frame = tokio::select! {
            _ = stop.changed() => return Ok(()),
            frame = frames.next() => frame,
        };

        let text = match frame {
            Some(Ok(Frame::Text(text))) => text,
            Some(Ok(Frame::Close(_))) | None => return Err(Error::Socket(WsError::ConnectionClosed)),
            Some(Err(e)) => return Err(Error::Socket(e)),
            Some(Ok(_)) => continue,
        };

        let record: Value = serde_json::from_str(&text).map_err(Error::MalformedFrame)?;
        let id = match frame_id(&record) {
            Some(id) => id,
            // Acks and other control chatter carry no message identifier.
            None => continue,
        };

        let message = fetch(id).await?;
        if message.data.parts.is_empty() {
            debug!("message without body parts discarded");
            continue;
        }
        if mail_tx.send(message).await.is_err() {
            // Receiver gone; nobody is listening anymore.
            return Ok(());
        }
    }
}
