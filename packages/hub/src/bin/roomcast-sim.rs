//! Load simulator for the room hub.
//!
//! Spawns simulated connections into a set of rooms, has every participant
//! broadcast a number of messages, and logs registry stats as JSON at a fixed
//! interval. Every `--slow-every`-th participant only reads its mailbox after
//! it has been closed, so it is evicted once its backlog exceeds the mailbox
//! capacity.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin roomcast-sim
//! cargo run --bin roomcast-sim -- --rooms 4 --participants 8 --mailbox-capacity 16
//! ```

use std::time::Duration;

use bytes::Bytes;
use clap::Parser;
use tokio::task::JoinSet;

use roomcast_hub::{
    HubConfig, Mailbox, Participant, ParticipantId, Registry, RoomHandle, RoomId,
    config::{DEFAULT_MAILBOX_CAPACITY, DEFAULT_REQUEST_QUEUE_CAPACITY},
};
use roomcast_shared::{logger::setup_logger, signal::shutdown_signal};

#[derive(Parser, Debug)]
#[command(name = "roomcast-sim")]
#[command(about = "Drive the room hub with simulated connections", long_about = None)]
struct Args {
    /// Number of rooms to create
    #[arg(short = 'r', long, default_value_t = 3)]
    rooms: usize,

    /// Participants per room
    #[arg(short = 'p', long, default_value_t = 4)]
    participants: usize,

    /// Broadcasts sent by each participant
    #[arg(short = 'm', long, default_value_t = 100)]
    messages: usize,

    /// Make every N-th participant a slow reader (0 disables)
    #[arg(long, default_value_t = 4)]
    slow_every: usize,

    /// Delay between broadcasts of one participant, in milliseconds
    #[arg(long, default_value_t = 10)]
    send_interval_ms: u64,

    /// Outbound mailbox capacity per participant
    #[arg(long, default_value_t = DEFAULT_MAILBOX_CAPACITY)]
    mailbox_capacity: usize,

    /// Request queue capacity per room
    #[arg(long, default_value_t = DEFAULT_REQUEST_QUEUE_CAPACITY)]
    request_queue_capacity: usize,

    /// Seconds an empty room is kept before reclamation (0 disables)
    #[arg(long, default_value_t = 300)]
    idle_ttl_secs: u64,

    /// Seconds between stats log lines
    #[arg(long, default_value_t = 5)]
    stats_interval_secs: u64,

    /// Keep running after every connection finished, until Ctrl+C
    #[arg(long)]
    linger: bool,
}

impl Args {
    fn hub_config(&self) -> HubConfig {
        let idle_room_ttl =
            (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs));
        HubConfig::default()
            .with_mailbox_capacity(self.mailbox_capacity)
            .with_request_queue_capacity(self.request_queue_capacity)
            .with_idle_room_ttl(idle_room_ttl)
    }

    fn is_slow(&self, index: usize) -> bool {
        self.slow_every > 0 && index % self.slow_every == self.slow_every - 1
    }
}

/// What one simulated connection saw
#[derive(Debug)]
struct ConnectionReport {
    id: ParticipantId,
    room: RoomId,
    slow: bool,
    received: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let registry = match Registry::new(args.hub_config()) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let send_interval = Duration::from_millis(args.send_interval_ms);
    let mut connections = JoinSet::new();
    for room_index in 0..args.rooms {
        let room_id = match RoomId::new(format!("room-{room_index}")) {
            Ok(room_id) => room_id,
            Err(e) => {
                tracing::error!("Invalid room id: {}", e);
                std::process::exit(1);
            }
        };
        let room = registry.get_or_create(&room_id).await;

        for participant_index in 0..args.participants {
            let connection = registry.new_participant(ParticipantId::generate());
            connections.spawn(run_connection(
                room.clone(),
                connection,
                args.is_slow(participant_index),
                args.messages,
                send_interval,
            ));
        }
    }
    tracing::info!(
        "Started {} connection(s) across {} room(s)",
        connections.len(),
        args.rooms
    );

    let mut stats_interval =
        tokio::time::interval(Duration::from_secs(args.stats_interval_secs.max(1)));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,

            _ = stats_interval.tick() => log_stats(&registry).await,

            Some(result) = connections.join_next() => {
                match result {
                    Ok(report) => tracing::info!(
                        "Connection '{}' in '{}' finished (slow: {}, received: {})",
                        report.id,
                        report.room,
                        report.slow,
                        report.received
                    ),
                    Err(e) => tracing::warn!("Connection task failed: {}", e),
                }
                if connections.is_empty() && !args.linger {
                    log_stats(&registry).await;
                    break;
                }
            }
        }
    }

    registry.shutdown().await;
    connections.shutdown().await;
    tracing::info!("Simulation stopped");
}

/// Join, broadcast `messages` times, then leave, while a reader drains the mailbox.
async fn run_connection(
    room: RoomHandle,
    (participant, mailbox): (Participant, Mailbox),
    slow: bool,
    messages: usize,
    send_interval: Duration,
) -> ConnectionReport {
    let id = participant.id().clone();
    room.join(participant).await;

    let reader = tokio::spawn(read_mailbox(mailbox, slow));

    for sequence in 0..messages {
        let payload = Bytes::from(format!("{id}: message {sequence}"));
        room.broadcast(Some(id.clone()), payload).await;
        tokio::time::sleep(send_interval).await;
    }
    room.leave(id.clone()).await;

    let received = match reader.await {
        Ok(received) => received,
        Err(e) => {
            tracing::warn!("Reader for '{}' failed: {}", id, e);
            0
        }
    };

    ConnectionReport {
        id,
        room: room.id().clone(),
        slow,
        received,
    }
}

/// Count payloads until the room closes the mailbox.
///
/// A slow reader touches nothing until the mailbox is closed.
async fn read_mailbox(mut mailbox: Mailbox, slow: bool) -> usize {
    if slow {
        while !mailbox.is_closed() {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        tracing::debug!("Slow reader '{}' saw its mailbox close", mailbox.id());
        return mailbox.drain().len();
    }

    let mut received = 0;
    while mailbox.recv().await.is_some() {
        received += 1;
    }
    received
}

async fn log_stats(registry: &Registry) {
    let stats = registry.stats().await;
    match serde_json::to_string(&stats) {
        Ok(json) => tracing::info!("Stats: {}", json),
        Err(e) => tracing::warn!("Failed to serialize stats: {}", e),
    }
}
