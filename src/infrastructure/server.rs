//! # Core Server
//!
//! Front ends (one per platform) forward user events over TCP. A connection
//! carries exactly one JSON [`InboundMessage`] and ends at EOF. The server
//! routes it, delivers every reply through the dispatcher and closes the
//! connection once all deliveries were attempted. Bodies larger than the
//! configured limit are dropped unread past the limit.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::application::division::Dispatcher;
use crate::application::handler::MessageHandler;
use crate::domain::types::InboundMessage;

#[derive(Clone)]
pub struct Server {
    handler: Arc<MessageHandler>,
    dispatcher: Arc<Dispatcher>,
    max_message_bytes: usize,
}

impl Server {
    pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024 * 1024;

    pub fn new(handler: Arc<MessageHandler>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            handler,
            dispatcher,
            max_message_bytes: Self::DEFAULT_MAX_MESSAGE_BYTES,
        }
    }

    pub fn with_max_message_bytes(mut self, limit: usize) -> Self {
        self.max_message_bytes = limit;
        self
    }

    /// Binds `address` and serves until the listener fails.
    pub async fn run(self, address: &str) -> Result<()> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;
        tracing::info!("Listening on {}", address);
        self.serve(listener).await
    }

    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener.accept().await.context("Failed to accept")?;
            let server = self.clone();
            tokio::spawn(async move {
                if let Err(e) = server.handle_connection(stream).await {
                    tracing::warn!("Connection from {} failed: {:#}", peer, e);
                }
            });
        }
    }

    /// Handles one connection. Returns how many replies were delivered.
    async fn handle_connection(&self, mut stream: TcpStream) -> Result<usize> {
        let mut buffer = Vec::new();
        let limit = self.max_message_bytes as u64 + 1;
        (&mut stream)
            .take(limit)
            .read_to_end(&mut buffer)
            .await
            .context("Failed to read inbound message")?;
        if buffer.len() > self.max_message_bytes {
            anyhow::bail!(
                "Inbound message exceeds {} bytes",
                self.max_message_bytes
            );
        }
        let inbound: InboundMessage =
            serde_json::from_slice(&buffer).context("Malformed inbound message")?;

        let Some(message) = inbound.into_message() else {
            tracing::debug!("Ignoring empty message");
            stream.shutdown().await.ok();
            return Ok(0);
        };

        let replies = self.handler.get(message).await?;
        let results = join_all(replies.iter().map(|reply| self.dispatcher.dispatch(reply))).await;

        let mut delivered = 0;
        for result in results {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => tracing::error!("Delivery failed: {:#}", e),
            }
        }
        stream.shutdown().await.ok();
        Ok(delivered)
    }
}

/// Sends one message to a running server and waits until it is handled.
pub async fn send_to_server(address: &str, message: &InboundMessage) -> Result<()> {
    let mut stream = TcpStream::connect(address)
        .await
        .with_context(|| format!("Failed to connect to {address}"))?;
    let body = serde_json::to_vec(message).context("Failed to encode message")?;
    stream.write_all(&body).await?;
    stream.shutdown().await?;

    // the server closes the connection after delivery
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::division::ReplyDivision;
    use crate::application::route::Route;
    use crate::application::transitions::Transitions;
    use crate::domain::reply::{Replies, Reply};
    use crate::domain::traits::{Replier, page_fn};
    use crate::domain::types::Messenger;
    use crate::infrastructure::memory_store::MemoryUserStore;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Collect {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Replier for Collect {
        async fn reply(&self, reply: &Reply) -> anyhow::Result<()> {
            self.sent.lock().await.push(reply.text.clone());
            Ok(())
        }
    }

    async fn spawn_server(replier: Arc<Collect>) -> String {
        spawn_limited_server(replier, Server::DEFAULT_MAX_MESSAGE_BYTES).await
    }

    async fn spawn_limited_server(replier: Arc<Collect>, limit: usize) -> String {
        let hello = page_fn("hello", |id, messenger, _| async move {
            let mut replies = Replies::new();
            replies
                .add_reply(Reply::new(id, messenger.clone(), "hello"))
                .add_reply(Reply::new(id, messenger, "again"));
            replies
        });
        let error = page_fn("error", |id, messenger, _| async move {
            Replies::from(Reply::new(id, messenger, "error"))
        });

        let mut transitions = Transitions::new();
        transitions
            .add_transition(Some("hi"), "start", hello, Route::new().with_stage_id("start"))
            .unwrap();
        transitions.add_error_return(error).unwrap();
        let router = Arc::new(transitions.compile().unwrap());

        let handler = MessageHandler::new(router, Arc::new(MemoryUserStore::new("start")));
        let mut division = ReplyDivision::new();
        division
            .register_messenger(Messenger::from("tg"), replier, 100)
            .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let server = Server::new(Arc::new(handler), Arc::new(division.compile()))
            .with_max_message_bytes(limit);
        tokio::spawn(server.serve(listener));
        address
    }

    fn inbound(text: Option<&str>) -> InboundMessage {
        InboundMessage {
            user_id: 9,
            messenger: Messenger::from("tg"),
            text: text.map(str::to_string),
            payload: None,
            files: Vec::new(),
        }
    }

    #[tokio::test]
    async fn message_is_routed_and_delivered() {
        let replier = Arc::new(Collect::default());
        let address = spawn_server(replier.clone()).await;

        send_to_server(&address, &inbound(Some("Hi"))).await.unwrap();
        let mut sent = replier.sent.lock().await.clone();
        sent.sort();
        assert_eq!(sent, vec!["again", "hello"]);

        send_to_server(&address, &inbound(Some("what"))).await.unwrap();
        assert_eq!(replier.sent.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn empty_and_malformed_messages_are_dropped() {
        let replier = Arc::new(Collect::default());
        let address = spawn_server(replier.clone()).await;

        send_to_server(&address, &inbound(None)).await.unwrap();

        let mut stream = TcpStream::connect(&address).await.unwrap();
        stream.write_all(b"not json").await.unwrap();
        stream.shutdown().await.unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();

        assert!(replier.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn payload_with_odd_values_gets_error_page() {
        let replier = Arc::new(Collect::default());
        let address = spawn_server(replier.clone()).await;

        let mut stream = TcpStream::connect(&address).await.unwrap();
        stream
            .write_all(br#"{"user_id":9,"messenger":"tg","payload":{"t":"d","x":true}}"#)
            .await
            .unwrap();
        stream.shutdown().await.unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();

        assert_eq!(*replier.sent.lock().await, vec!["error"]);
    }

    #[tokio::test]
    async fn oversized_message_is_dropped() {
        let replier = Arc::new(Collect::default());
        let address = spawn_limited_server(replier.clone(), 96).await;

        let big = inbound(Some(&"hi ".repeat(64)));
        let mut stream = TcpStream::connect(&address).await.unwrap();
        // the server may close early, so write and read errors are fine here
        let _ = stream.write_all(&serde_json::to_vec(&big).unwrap()).await;
        let _ = stream.shutdown().await;
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
        assert!(replier.sent.lock().await.is_empty());

        send_to_server(&address, &inbound(Some("Hi"))).await.unwrap();
        assert_eq!(replier.sent.lock().await.len(), 2);
    }
}
