//! Shared state and API to handle incoming commands.
//!
//! This module is split in several files:
//!
//! - `mod.rs`: public API of the server state and send utilities
//! - `rfc1459.rs`: handlers for the commands of the RFC 1459 subset vireo speaks
//! - `test.rs`: helpers for the handler tests

use crate::channel::Channel;
use crate::client::{Client, MessageQueue, MessageQueueItem};
use crate::config::StateConfig;
use crate::lines;
use crate::util::time_str;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::{cmp, io, net};
use tokio::sync::Mutex;
use vireo_tokens::{mode, rpl, Buffer, Command, Message, ReplyBuffer};

mod rfc1459;

#[macro_export]
macro_rules! server_version(() => {concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"))});

type ChannelMap = HashMap<String, Channel>;
type ClientMap = HashMap<net::SocketAddr, Client>;
type HandlerResult = Result<(), ()>;

struct CommandContext<'a> {
    addr: &'a net::SocketAddr,
    rb: &'a mut ReplyBuffer,
}

/// State of the IRC server.
///
/// This is used by vireo to maintain a consistent view of the network.  Note that this is
/// just an `Arc` to the real data, so it's cheap to clone and clones share the same data.
///
/// All operations are serialized behind one lock, and handlers run to completion while they
/// hold it; combined with the single-threaded runtime this gives the strict per-client and
/// broadcast ordering the protocol needs.
///
/// # Example
///
/// ```rust
/// # use vireo::State;
/// # use vireo::config::StateConfig;
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let state = State::new(StateConfig {
///     password: "conduct".to_owned(),
///     ..StateConfig::default()
/// });
///
/// // Each client is identified by its socket address.
/// let client_addr = std::net::SocketAddr::from(([127, 0, 0, 1], 12345));
///
/// // The state pushes the messages meant to be sent to the client onto a queue.
/// let (msg_queue, mut outgoing_msgs) = tokio::sync::mpsc::unbounded_channel();
/// state.peer_joined(client_addr, msg_queue).await;
///
/// // `handle_line` is used to pass lines from the client to the state.
/// state.handle_line(&client_addr, "PASS conduct").await;
/// state.handle_line(&client_addr, "NICK ada").await;
/// state.handle_line(&client_addr, "USER ada 0 * :Ada").await;
///
/// // The client has authenticated, so the state has pushed the welcome burst onto the
/// // queue.  Note that one queue item can contain multiple IRC lines.
/// let msg = outgoing_msgs.recv().await.unwrap();
/// let msg: &str = msg.as_ref();
/// let mut lines = msg.split("\r\n");
/// assert_eq!(lines.next().unwrap(),
///            ":localhost 001 ada :Welcome to the Internet Relay Network ada");
/// # });
/// ```
#[derive(Clone)]
pub struct State(Arc<Mutex<StateInner>>);

impl State {
    /// Initializes the IRC state from the given configuration.
    pub fn new(config: StateConfig) -> Self {
        Self(Arc::new(Mutex::new(StateInner::new(config))))
    }

    /// Adds a new connection to the state.
    ///
    /// Each connection is identified by its address.  The queue is used to push messages
    /// back to the peer.
    pub async fn peer_joined(&self, addr: net::SocketAddr, queue: MessageQueue) {
        self.0.lock().await.peer_joined(addr, queue);
    }

    /// Removes the given connection from the state, with an optional error.
    ///
    /// If the peer has quit unexpectedly, `err` should be set to the cause of the quit, so
    /// that other peers can be correctly informed.
    pub async fn peer_quit(&self, addr: &net::SocketAddr, err: Option<io::Error>) {
        self.0.lock().await.peer_quit(addr, err);
    }

    /// Updates the state according to the given raw line received from the given client.
    pub async fn handle_line(&self, addr: &net::SocketAddr, line: &str) {
        self.0.lock().await.handle_line(addr, line);
    }
}

/// The actual shared data (state) of the IRC server.
pub(crate) struct StateInner {
    /// The domain of the server.  This string is used as the prefix of replies sent to
    /// clients.
    pub(crate) domain: String,

    /// HashMap to associate a socket address to each client.
    pub(crate) clients: ClientMap,

    /// HashMap to associate the name of each channel with their metadata.
    ///
    /// Channels are created by the first JOIN and removed when their last member leaves;
    /// an empty channel is never reachable from here.
    pub(crate) channels: ChannelMap,

    /// The formatted time when this instance is created.  It is sent to the client when they
    /// authenticate (in a "003 RPL_CREATED" reply).
    created_at: String,

    /// The connection password.  Clients need to issue a PASS command with this password
    /// before their registration completes.
    password: String,
}

impl StateInner {
    pub fn new(config: StateConfig) -> Self {
        Self {
            domain: config.domain,
            clients: HashMap::new(),
            channels: HashMap::new(),
            created_at: time_str(),
            password: config.password,
        }
    }

    pub fn peer_joined(&mut self, addr: net::SocketAddr, queue: MessageQueue) {
        log::debug!("{}: Connected", addr);
        self.clients
            .insert(addr, Client::new(queue, addr.ip().to_string()));
    }

    pub fn peer_quit(&mut self, addr: &net::SocketAddr, err: Option<io::Error>) {
        log::debug!("{}: Disconnected", addr);
        if let Some(client) = self.clients.remove(addr) {
            match err {
                Some(err) => self.remove_client(addr, client, Some(&err.to_string())),
                None => self.remove_client(addr, client, None),
            }
        }
    }

    /// This function is called by `peer_quit` and `cmd_quit` to do the various cleanup
    /// needed when a client disconnects:
    ///
    /// - send a QUIT line to all clients that share a channel with it,
    /// - remove the client from each channel it was in,
    /// - remove it from the invite lists it is on,
    /// - remove channels that become empty.
    ///
    /// The caller must have removed the client from `clients` already.
    fn remove_client(&mut self, addr: &net::SocketAddr, client: Client, reason: Option<&str>) {
        let mut response = Buffer::new();
        {
            let msg = response.message(client.nick(), Command::Quit);
            if let Some(reason) = reason {
                msg.trailing_param(reason);
            }
        }
        let msg = MessageQueueItem::from(response);

        let mut notified = HashSet::new();
        for name in &client.channels {
            if let Some(channel) = self.channels.get(name) {
                for member in &channel.members {
                    if member != addr {
                        notified.insert(*member);
                    }
                }
            }
        }
        for member in notified {
            self.send(&member, msg.clone());
        }

        self.channels.retain(|_, channel| {
            channel.remove_member(addr);
            channel.invites.remove(addr);
            !channel.members.is_empty()
        });
    }

    pub fn handle_line(&mut self, addr: &net::SocketAddr, line: &str) {
        let client = match self.clients.get(addr) {
            Some(client) => client,
            None => return,
        };
        let msg = match Message::parse(line) {
            Some(msg) => msg,
            // Empty lines are silently ignored.
            None => return,
        };
        let mut rb = ReplyBuffer::new(&self.domain, client.reply_label());

        let command = match msg.command {
            Ok(command) => command,
            Err(unknown) => {
                log::debug!("{}: Unknown command {:?}", addr, unknown);
                rb.reply(rpl::ERR_UNKNOWNCOMMAND)
                    .param(unknown)
                    .trailing_param(lines::UNKNOWN_COMMAND);
                client.send(rb);
                return;
            }
        };

        if !msg.has_enough_params() {
            match command {
                Command::Nick => {
                    rb.reply(rpl::ERR_NONICKNAMEGIVEN)
                        .trailing_param(lines::NO_NICKNAME_GIVEN);
                }
                _ => {
                    rb.reply(rpl::ERR_NEEDMOREPARAMS)
                        .param(command.as_str())
                        .trailing_param(lines::NEED_MORE_PARAMS);
                }
            }
            client.send(rb);
            return;
        }

        if command.requires_auth() && !client.is_authenticated() {
            rb.reply(rpl::ERR_NOTREGISTERED)
                .trailing_param(lines::NOT_REGISTERED);
            client.send(rb);
            return;
        }

        let was_authenticated = client.is_authenticated();
        let ps = msg.params;
        let n = msg.num_params;
        log::debug!("{}: {} {:?}", addr, command, &ps[..n]);
        let ctx = CommandContext { addr, rb: &mut rb };
        let _ = match command {
            Command::Invite => self.cmd_invite(ctx, ps[0], ps[1]),
            Command::Join => self.cmd_join(ctx, ps[0], ps[1]),
            Command::Kick => self.cmd_kick(ctx, ps[0], ps[1], ps[2]),
            Command::Mode => self.cmd_mode(ctx, ps[0], ps[1], &ps[2..cmp::max(2, n)]),
            Command::Nick => self.cmd_nick(ctx, ps[0]),
            Command::Pass => self.cmd_pass(ctx, ps[0]),
            Command::PrivMsg => self.cmd_privmsg(ctx, ps[0], ps[1]),
            Command::Quit => self.cmd_quit(ctx, ps[0]),
            Command::Topic => self.cmd_topic(ctx, ps[0], if n == 1 { None } else { Some(ps[1]) }),
            Command::User => self.cmd_user(ctx, ps[0], ps[3]),
            Command::Reply(_) => Ok(()),
        };

        if !rb.is_empty() {
            self.send(addr, MessageQueueItem::from(rb));
        }

        // The authenticated flag is latched, so it changes at most once per connection;
        // this is where the client gets its welcome burst.
        if !was_authenticated {
            if let Some(client) = self.clients.get(addr) {
                if client.is_authenticated() {
                    log::info!(
                        "{}: Authenticated as {} ({}@{}, {:?})",
                        addr,
                        client.nick(),
                        client.user(),
                        client.host(),
                        client.real()
                    );
                    let mut rb = ReplyBuffer::new(&self.domain, client.nick());
                    self.write_welcome(&mut rb, client.nick());
                    client.send(rb);
                }
            }
        }
    }

    /// Removes the channel if it exists and has no members left.
    fn remove_if_empty(&mut self, name: &str) {
        if self.channels.get(name).map_or(false, |c| c.members.is_empty()) {
            log::debug!("Removed empty channel {}", name);
            self.channels.remove(name);
        }
    }
}

/// Returns `Ok(channel)` when `name` is an existing channel name.  Otherwise returns
/// `Err(())` and sends a 403 to the client.
fn find_channel<'a>(
    addr: &net::SocketAddr,
    rb: &mut ReplyBuffer,
    channels: &'a ChannelMap,
    name: &str,
) -> Result<&'a Channel, ()> {
    match channels.get(name) {
        Some(channel) => Ok(channel),
        None => {
            log::debug!("{}:         no such channel", addr);
            rb.reply(rpl::ERR_NOSUCHCHANNEL)
                .param(name)
                .trailing_param(lines::NO_SUCH_CHANNEL);
            Err(())
        }
    }
}

/// Returns `Ok(is_operator)` when the client identified by `addr` is in the given `channel`.
/// Otherwise returns `Err(())` and sends a 442 to the client.
///
/// `channel_name` is needed for the error reply.
fn find_member(
    addr: &net::SocketAddr,
    rb: &mut ReplyBuffer,
    channel: &Channel,
    channel_name: &str,
) -> Result<bool, ()> {
    if !channel.is_member(addr) {
        log::debug!("{}:         not on channel", addr);
        rb.reply(rpl::ERR_NOTONCHANNEL)
            .param(channel_name)
            .trailing_param(lines::NOT_ON_CHANNEL);
        return Err(());
    }
    Ok(channel.is_operator(addr))
}

/// Returns `Ok((address, client))` when a client with the nickname `nick` is connected.
/// Otherwise returns `Err(())` and sends a 401 to the client.
///
/// The empty string never resolves, so that clients which have not set a nickname yet cannot
/// be addressed.
fn find_nick<'a>(
    addr: &net::SocketAddr,
    rb: &mut ReplyBuffer,
    clients: &'a ClientMap,
    nick: &str,
) -> Result<(net::SocketAddr, &'a Client), ()> {
    let found = if nick.is_empty() {
        None
    } else {
        clients.iter().find(|(_, client)| client.nick() == nick)
    };
    match found {
        Some((addr, client)) => Ok((*addr, client)),
        None => {
            log::debug!("{}:         nick doesn't exist", addr);
            rb.reply(rpl::ERR_NOSUCHNICK)
                .param(nick)
                .trailing_param(lines::NO_SUCH_NICK);
            Err(())
        }
    }
}

// Send utilities
impl StateInner {
    /// Sends the given message to the given client.
    fn send(&self, addr: &net::SocketAddr, msg: MessageQueueItem) {
        if let Some(client) = self.clients.get(addr) {
            client.send(msg);
        }
    }

    /// Sends the given message to all members of the given channel, in join order, except
    /// `sender` when it is set.
    fn broadcast(&self, target: &str, msg: MessageQueueItem, except: Option<&net::SocketAddr>) {
        let channel = &self.channels[target];
        for member in &channel.members {
            if except.map_or(true, |addr| member != addr) {
                self.send(member, msg.clone());
            }
        }
    }

    /// Sends the welcome burst.  Called once per connection, when the client completes its
    /// authentication.
    fn write_welcome(&self, rb: &mut ReplyBuffer, nick: &str) {
        lines::welcome(rb.reply(rpl::WELCOME), nick);
        lines::your_host(rb.reply(rpl::YOURHOST), &self.domain);
        lines::created(rb.reply(rpl::CREATED), &self.created_at);
        rb.reply(rpl::MYINFO)
            .param(&self.domain)
            .param(server_version!())
            .param(mode::USER_MODES)
            .param(mode::SIMPLE_CHAN_MODES)
            .param(mode::EXTENDED_CHAN_MODES);
    }

    /// Sends the topic of the channel `channel_name` to the given client.
    fn write_topic(&self, rb: &mut ReplyBuffer, channel_name: &str) {
        let channel = &self.channels[channel_name];
        if channel.topic.is_empty() {
            rb.reply(rpl::NOTOPIC)
                .param(channel_name)
                .trailing_param(lines::NO_TOPIC);
        } else {
            rb.reply(rpl::TOPIC)
                .param(channel_name)
                .trailing_param(&channel.topic);
        }
    }
}
