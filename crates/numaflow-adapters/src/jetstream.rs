//! JetStream Inter-Step Buffer adapter: one durable stream plus one durable
//! pull consumer per pipeline edge, with explicit ack and an in-flight
//! heartbeat so long-running processing does not trigger redelivery.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{
    self,
    consumer::{pull::Config as PullConsumerConfig, AckPolicy, DeliverPolicy, ReplayPolicy},
    stream::Config as StreamConfig,
    AckKind, Context as JetStreamContext,
};
use async_nats::{Client as NatsClient, HeaderMap};
use futures::StreamExt;
use numaflow_core::message::{Message, ReadMessage};
use numaflow_core::offset::Offset;
use numaflow_ports::errors::{AckError, LifecycleError, ReadError, WriteError};
use numaflow_ports::{BufferReader, BufferWriter, IsbLifecycle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::headers;
use crate::heartbeat;

/// Connection and durability settings for the JetStream ISB backend.
#[derive(Debug, Clone)]
pub struct JetStreamConfig {
    pub url: String,
    pub ack_wait_secs: u64,
    pub max_deliver: i64,
    pub max_buffer_length: u64,
}

impl Default for JetStreamConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            ack_wait_secs: 30,
            max_deliver: -1,
            max_buffer_length: 30_000,
        }
    }
}

impl JetStreamConfig {
    /// Build from `ISBSVC_JETSTREAM_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("ISBSVC_JETSTREAM_URL").unwrap_or(defaults.url),
            ack_wait_secs: std::env::var("ISBSVC_JETSTREAM_ACK_WAIT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ack_wait_secs),
            max_deliver: std::env::var("ISBSVC_JETSTREAM_MAX_DELIVER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_deliver),
            max_buffer_length: std::env::var("ISBSVC_JETSTREAM_MAX_BUFFER_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_buffer_length),
        }
    }

    #[must_use]
    pub fn ack_wait(&self) -> Duration {
        Duration::from_secs(self.ack_wait_secs)
    }
}

fn stream_name(buffer: &str) -> String {
    format!("isb-{buffer}")
}

fn subject_name(buffer: &str) -> String {
    format!("isb.{buffer}")
}

fn consumer_name(buffer: &str) -> String {
    format!("isb-{buffer}-processor")
}

/// A connected handle to the JetStream backend, shared by the lifecycle
/// commands and by buffer reader/writer construction.
#[derive(Clone)]
pub struct JetStreamIsb {
    #[allow(dead_code)]
    client: NatsClient,
    jetstream: JetStreamContext,
    config: JetStreamConfig,
}

impl JetStreamIsb {
    pub async fn connect(config: JetStreamConfig) -> Result<Self, LifecycleError> {
        info!(url = %config.url, "connecting to jetstream");
        let client = async_nats::connect(&config.url)
            .await
            .map_err(|e| LifecycleError::BrokerUnavailable { message: e.to_string() })?;
        let jetstream = jetstream::new(client.clone());
        Ok(Self { client, jetstream, config })
    }

    /// Construct a reader bound to one buffer's durable consumer, creating
    /// the consumer if it does not already exist.
    #[instrument(skip(self))]
    pub async fn buffer_reader(&self, buffer: &str) -> Result<JetStreamBufferReader, ReadError> {
        let stream = self
            .jetstream
            .get_stream(stream_name(buffer))
            .await
            .map_err(|e| ReadError::BrokerUnavailable { message: e.to_string() })?;

        let consumer_config = PullConsumerConfig {
            durable_name: Some(consumer_name(buffer)),
            ack_policy: AckPolicy::Explicit,
            ack_wait: self.config.ack_wait(),
            deliver_policy: DeliverPolicy::All,
            replay_policy: ReplayPolicy::Instant,
            max_deliver: self.config.max_deliver,
            filter_subject: subject_name(buffer),
            ..Default::default()
        };

        let consumer = stream
            .get_or_create_consumer(&consumer_name(buffer), consumer_config)
            .await
            .map_err(|e| ReadError::BrokerUnavailable { message: e.to_string() })?;

        Ok(JetStreamBufferReader {
            name: buffer.to_string(),
            consumer,
            ack_wait: self.config.ack_wait(),
        })
    }

    /// Construct a writer bound to one buffer's stream subject.
    #[must_use]
    pub fn buffer_writer(&self, buffer: &str) -> JetStreamBufferWriter {
        JetStreamBufferWriter {
            name: buffer.to_string(),
            jetstream: self.jetstream.clone(),
        }
    }
}

impl IsbLifecycle for JetStreamIsb {
    async fn create_buffers(&self, buffers: &[numaflow_core::spec::BufferSpec]) -> Result<(), LifecycleError> {
        if buffers.is_empty() {
            return Err(LifecycleError::EmptyBufferList);
        }
        for buffer in buffers {
            let name = stream_name(&buffer.name);
            let max_messages = buffer.max_length.unwrap_or(self.config.max_buffer_length);
            let config = StreamConfig {
                name: name.clone(),
                subjects: vec![subject_name(&buffer.name)],
                max_messages: max_messages as i64,
                ..Default::default()
            };
            match self.jetstream.get_stream(&name).await {
                Ok(_) => {
                    debug!(stream = %name, "stream already exists");
                }
                Err(_) => {
                    self.jetstream
                        .create_stream(config)
                        .await
                        .map_err(|e| LifecycleError::SetupFailed { message: e.to_string() })?;
                    info!(stream = %name, "created jetstream stream");
                }
            }
        }
        Ok(())
    }

    async fn delete_buffers(&self, buffers: &[String]) -> Result<(), LifecycleError> {
        if buffers.is_empty() {
            return Err(LifecycleError::EmptyBufferList);
        }
        for buffer in buffers {
            let name = stream_name(buffer);
            match self.jetstream.delete_stream(&name).await {
                Ok(_) => info!(stream = %name, "deleted jetstream stream"),
                Err(e) => {
                    // Already gone is not a failure; anything else is.
                    if self.jetstream.get_stream(&name).await.is_err() {
                        debug!(stream = %name, "stream already absent");
                    } else {
                        return Err(LifecycleError::SetupFailed { message: e.to_string() });
                    }
                }
            }
        }
        Ok(())
    }

    async fn validate_buffers(&self, buffers: &[String]) -> Result<(), LifecycleError> {
        if buffers.is_empty() {
            return Err(LifecycleError::EmptyBufferList);
        }
        for buffer in buffers {
            let name = stream_name(buffer);
            self.jetstream
                .get_stream(&name)
                .await
                .map_err(|e| LifecycleError::SetupFailed {
                    message: format!("stream {name} missing or misconfigured: {e}"),
                })?;
        }
        Ok(())
    }
}

/// An offset into a JetStream-backed buffer: the broker-assigned stream
/// sequence, a handle back to the delivered message for acking, and the
/// in-flight heartbeat task tracking this one delivery.
#[derive(Clone)]
pub struct JetStreamOffset {
    sequence: i64,
    msg: Arc<jetstream::Message>,
    heartbeat: CancellationToken,
}

impl std::fmt::Debug for JetStreamOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JetStreamOffset").field("sequence", &self.sequence).finish()
    }
}

impl Offset for JetStreamOffset {
    fn to_string_offset(&self) -> String {
        self.sequence.to_string()
    }

    fn sequence(&self) -> i64 {
        self.sequence
    }

    fn ack_it(&self) -> impl Future<Output = Result<(), numaflow_core::errors::OffsetError>> + Send {
        let msg = self.msg.clone();
        let heartbeat = self.heartbeat.clone();
        async move {
            heartbeat.cancel();
            msg.ack()
                .await
                .map_err(|e| numaflow_core::errors::OffsetError::AckFailed { message: e.to_string() })
        }
    }
}

/// JetStream-backed [`BufferReader`]. Each delivered message is wrapped with
/// an in-flight heartbeat so the consumer's ack-wait deadline never elapses
/// while the message is still being processed downstream.
pub struct JetStreamBufferReader {
    name: String,
    consumer: jetstream::consumer::Consumer<PullConsumerConfig>,
    ack_wait: Duration,
}

impl JetStreamBufferReader {
    /// Wrap a raw delivery in a heartbeat-guarded offset. The heartbeat is
    /// cancelled as soon as `ack_it`/nak/term completes since that removes
    /// the message from the broker's in-flight set.
    fn wrap(&self, msg: jetstream::Message) -> Result<ReadMessage<JetStreamOffset>, ReadError> {
        let info = msg
            .info()
            .map_err(|e| ReadError::FetchFailed { message: e.to_string() })?;
        let sequence = info.stream_sequence as i64;

        let header_map: HashMap<String, String> = msg
            .headers
            .as_ref()
            .map(|h| {
                h.iter()
                    .filter_map(|(k, v)| v.iter().next().map(|v| (k.to_string(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let header = headers::decode(|k| header_map.get(k).map(String::as_str))
            .map_err(|e| ReadError::FetchFailed { message: e.to_string() })?;

        let body = msg.payload.to_vec();
        let arc_msg = Arc::new(msg);

        let heartbeat_nudge = {
            let msg = arc_msg.clone();
            move || {
                let msg = msg.clone();
                async move {
                    msg.ack_with(AckKind::Progress)
                        .await
                        .map_err(|e| e.to_string())
                }
            }
        };
        let heartbeat = heartbeat::spawn(self.ack_wait, heartbeat_nudge);
        let offset = JetStreamOffset { sequence, msg: arc_msg, heartbeat };

        Ok(ReadMessage::new(
            Message { header, body },
            offset,
        ))
    }
}

impl BufferReader for JetStreamBufferReader {
    type Offset = JetStreamOffset;

    fn name(&self) -> &str {
        &self.name
    }

    fn read(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<ReadMessage<Self::Offset>>, ReadError>> + Send {
        async move {
            let mut batch = self
                .consumer
                .fetch()
                .max_messages(count)
                .messages()
                .await
                .map_err(|e| ReadError::FetchFailed { message: e.to_string() })?;

            let mut out = Vec::with_capacity(count);
            while let Some(msg) = batch.next().await {
                match msg {
                    Ok(msg) => out.push(self.wrap(msg)?),
                    Err(e) => {
                        warn!(error = %e, "dropped undeliverable jetstream message");
                    }
                }
            }
            Ok(out)
        }
    }

    fn ack(&self, offsets: &[Self::Offset]) -> impl Future<Output = Vec<Result<(), AckError>>> + Send {
        let offsets = offsets.to_vec();
        async move {
            futures::future::join_all(offsets.iter().map(Offset::ack_it))
                .await
                .into_iter()
                .map(|result| result.map_err(|e| AckError::AckFailed { message: e.to_string() }))
                .collect()
        }
    }

    fn close(&self) -> impl Future<Output = ()> + Send {
        async move {}
    }
}

/// JetStream-backed [`BufferWriter`].
pub struct JetStreamBufferWriter {
    name: String,
    jetstream: JetStreamContext,
}

impl BufferWriter for JetStreamBufferWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(
        &self,
        messages: Vec<Message>,
    ) -> impl Future<Output = Vec<Result<(), WriteError>>> + Send {
        async move {
            let subject = subject_name(&self.name);
            let mut results = Vec::with_capacity(messages.len());
            for message in messages {
                let mut header_map = HeaderMap::new();
                for (k, v) in headers::encode(&message.header) {
                    header_map.insert(k, v);
                }

                let publish = self
                    .jetstream
                    .publish_with_headers(subject.clone(), header_map, message.body.into())
                    .await;

                let result = match publish {
                    Ok(ack) => ack
                        .await
                        .map(|_| ())
                        .map_err(|e| WriteError::PublishFailed { message: e.to_string() }),
                    Err(e) => Err(WriteError::PublishFailed { message: e.to_string() }),
                };
                results.push(result);
            }
            results
        }
    }

    fn close(&self) -> impl Future<Output = ()> + Send {
        async move {}
    }
}
