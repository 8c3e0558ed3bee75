//! Client connection data and registration state.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use vireo_tokens::{Buffer, ReplyBuffer};

/// A message, or a batch of messages, ready to be sent to a client.
///
/// Cheap to clone, so that broadcasts share one allocation between all recipients.
#[derive(Clone, Debug)]
pub struct MessageQueueItem(Arc<String>);

impl From<Buffer> for MessageQueueItem {
    fn from(val: Buffer) -> Self {
        Self(Arc::new(val.build()))
    }
}

impl From<ReplyBuffer> for MessageQueueItem {
    fn from(val: ReplyBuffer) -> Self {
        Self(Arc::new(val.build()))
    }
}

impl AsRef<str> for MessageQueueItem {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<[u8]> for MessageQueueItem {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

pub type MessageQueue = mpsc::UnboundedSender<MessageQueueItem>;

/// Client data.
pub struct Client {
    /// The queue of messages to be sent to the client.
    ///
    /// This is the write end of a mpsc channel of messages.  It is unbounded, so that pushing
    /// messages never blocks; the peer's connection task drains it into the socket.
    queue: MessageQueue,

    nick: String,
    user: String,
    real: String,
    host: String,

    /// Whether the client has issued a PASS command with the right password.
    has_given_password: bool,

    /// Whether both the nickname and the username are set.
    registered: bool,

    /// Set when the client is registered and has given the password.  Once set, it stays set
    /// for the lifetime of the connection.
    authenticated: bool,

    /// The names of the channels the client has joined.
    pub channels: HashSet<String>,
}

impl Client {
    /// Initialize the data for a new client, given its message queue and the textual form of
    /// its peer address.
    pub fn new(queue: MessageQueue, host: String) -> Self {
        Self {
            queue,
            nick: String::new(),
            user: String::new(),
            real: String::new(),
            host,
            has_given_password: false,
            registered: false,
            authenticated: false,
            channels: HashSet::new(),
        }
    }

    /// Add a message to the client message queue.
    ///
    /// Use this function to send messages to the client.
    pub fn send(&self, msg: impl Into<MessageQueueItem>) {
        let _ = self.queue.send(msg.into());
    }

    /// The first parameter of replies sent to this client: its nickname once it has
    /// authenticated, `*` before that.
    pub fn reply_label(&self) -> &str {
        if self.authenticated {
            &self.nick
        } else {
            "*"
        }
    }

    /// The nickname of the client.  Empty until a NICK command succeeds.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Changes the nickname of the client and re-evaluates its registration state.
    pub fn set_nick(&mut self, nick: &str) {
        self.nick.clear();
        self.nick.push_str(nick);
        self.update_registration();
    }

    /// The username of the client.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The realname of the client.
    pub fn real(&self) -> &str {
        &self.real
    }

    /// Changes the username and the realname of the client and re-evaluates its registration
    /// state.
    pub fn set_user_real(&mut self, user: &str, real: &str) {
        self.user.clear();
        self.user.push_str(user);
        self.real.clear();
        self.real.push_str(real);
        self.update_registration();
    }

    /// The host of the client.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Records that the client has issued a PASS command with the right password.
    pub fn give_password(&mut self) {
        self.has_given_password = true;
        self.update_registration();
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn update_registration(&mut self) {
        self.registered = !self.nick.is_empty() && !self.user.is_empty();
        if self.registered && self.has_given_password {
            // Once set, `authenticated` is never reset.
            self.authenticated = true;
        }
    }
}
