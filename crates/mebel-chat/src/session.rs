//! Interactive chat session: stdin in, room updates out.

use std::time::Instant;

use mebel_realtime::{
    CallOptions, ChannelConfig, ChannelState, ChatRoom, Envelope, RoomUpdate, SignalingChannel,
    TypingDebounce,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::command::{self, Command, USAGE};

pub struct ChatSession {
    channel: SignalingChannel,
    inbound: mpsc::UnboundedReceiver<Envelope>,
    room: ChatRoom,
    typing: TypingDebounce,
    call_options: CallOptions,
}

impl ChatSession {
    /// Connect and start routing inbound envelopes to the room.
    pub fn start(
        config: ChannelConfig,
        room: ChatRoom,
        typing: TypingDebounce,
        call_options: CallOptions,
    ) -> Self {
        let (tx, inbound) = mpsc::unbounded_channel();
        let channel = SignalingChannel::connect(config, move |envelope| {
            let _ = tx.send(envelope);
        });
        Self {
            channel,
            inbound,
            room,
            typing,
            call_options,
        }
    }

    /// Run until `/quit`, end of input or Ctrl-C.
    pub async fn run(mut self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut state = self.channel.subscribe_state();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        println!("{USAGE}");

        loop {
            let deadline = self.typing.deadline();
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Interrupted");
                    break;
                }

                Some(envelope) = self.inbound.recv() => self.on_envelope(&envelope),

                line = lines.next_line() => match line? {
                    Some(line) => {
                        if !self.on_line(&line) {
                            break;
                        }
                    }
                    None => {
                        debug!("stdin closed");
                        break;
                    }
                },

                Ok(()) = state.changed() => {
                    let current = *state.borrow_and_update();
                    println!("{}", render_state(current));
                }

                _ = wait_until(deadline) => {
                    if let Some(is_typing) = self.typing.poll(Instant::now()) {
                        self.channel.send(self.room.compose_typing(is_typing));
                    }
                }
            }
        }

        self.channel.disconnect();
        Ok(())
    }

    fn on_envelope(&mut self, envelope: &Envelope) {
        if let Some(update) = self.room.apply(envelope) {
            if let RoomUpdate::CallSignal { from, kind, .. } = &update {
                warn!(
                    %from,
                    %kind,
                    video = self.call_options.video,
                    audio = self.call_options.audio,
                    ice_servers = self.call_options.ice_servers.len(),
                    "Call signal received; this client has no media backend"
                );
            }
            if let Some(line) = render_update(&self.room, &update) {
                println!("{line}");
            }
        }
    }

    /// Returns false when the user asked to leave.
    fn on_line(&mut self, line: &str) -> bool {
        match command::parse(line) {
            Command::Quit => return false,
            Command::Nothing => {}
            Command::Help => println!("{USAGE}"),
            Command::Unknown(cmd) => println!("unknown command {cmd}; {USAGE}"),
            Command::Read(message_id) => {
                self.channel
                    .send(self.room.compose_read_receipt(message_id));
            }
            Command::Typing => {
                if let Some(is_typing) = self.typing.input(Instant::now()) {
                    self.channel.send(self.room.compose_typing(is_typing));
                }
            }
            Command::Message(text) => {
                let Some(envelope) = self.room.compose_message(&text) else {
                    return true;
                };
                if let Some(is_typing) = self.typing.message_sent() {
                    self.channel.send(self.room.compose_typing(is_typing));
                }
                if !self.channel.is_connected() {
                    warn!("Not connected; message not sent");
                }
                self.channel.send(envelope);
            }
        }
        true
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_state(state: ChannelState) -> &'static str {
    match state {
        ChannelState::Disconnected => "-- disconnected",
        ChannelState::Connecting => "-- connecting...",
        ChannelState::Connected => "-- connected",
    }
}

fn render_update(room: &ChatRoom, update: &RoomUpdate) -> Option<String> {
    match update {
        RoomUpdate::MessageAdded(message) => {
            let who = if message.sender_id == *room.user_id() {
                "you".to_string()
            } else {
                message.sender_id.to_string()
            };
            Some(format!(
                "[{}] {who}: {} ({})",
                message.created_at, message.content, message.id
            ))
        }
        RoomUpdate::TypingChanged { .. } => {
            let typing = room.typing_users();
            if typing.is_empty() {
                None
            } else {
                let names: Vec<&str> = typing.iter().map(|u| u.as_str()).collect();
                Some(format!("* {} typing...", names.join(", ")))
            }
        }
        RoomUpdate::MessageRead { message_id, reader } => {
            let own = room
                .message(message_id)
                .is_some_and(|m| m.sender_id == *room.user_id());
            own.then(|| format!("* {message_id} read by {reader}"))
        }
        RoomUpdate::CallSignal { from, kind, .. } => Some(format!(
            "* {from} is trying to call ({kind}), calls are not supported here"
        )),
    }
}
