use crate::{Command, MESSAGE_LENGTH};

/// Helper to build an IRC message.
///
/// Use with `Buffer::message`.
pub struct MessageBuffer<'a> {
    buf: &'a mut String,
}

impl<'a> MessageBuffer<'a> {
    fn with_prefix(buf: &'a mut String, prefix: &str, command: impl Into<Command>) -> Self {
        if !prefix.is_empty() {
            buf.push(':');
            buf.push_str(prefix);
            buf.push(' ');
        }
        buf.push_str(command.into().as_str());
        MessageBuffer { buf }
    }

    /// Appends a parameter to the message.
    ///
    /// The parameter is trimmed before insertion.  If `param` is whitespace, it is not appended.
    ///
    /// **Note**: It is up to the caller to make sure there is no remaning whitespace or newline in
    /// the parameter.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use vireo_tokens::{Command, Buffer};
    /// let mut response = Buffer::new();
    ///
    /// response.message("nick", Command::Quit)
    ///     .param("")
    ///     .param("  chiao ");
    ///
    /// assert_eq!(&response.build(), ":nick QUIT chiao\r\n");
    /// ```
    pub fn param(self, param: &str) -> Self {
        let param = param.trim();
        if param.is_empty() {
            return self;
        }
        self.buf.push(' ');
        self.buf.push_str(param);
        self
    }

    /// Appends the trailing parameter to the message and consumes the buffer.
    ///
    /// Contrary to `MessageBuffer::param`, the parameter is not trimmed before insertion.  Even if
    /// `param` is just whitespace, it is appended.
    ///
    /// **Note**: It is up to the caller to make sure there is no newline in the parameter.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use vireo_tokens::{Command, Buffer};
    /// let mut response = Buffer::new();
    ///
    /// response.message("nick", Command::Quit)
    ///     .trailing_param("long quit message");
    ///
    /// assert_eq!(&response.build(), ":nick QUIT :long quit message\r\n");
    /// ```
    pub fn trailing_param(self, param: &str) {
        self.buf.push(' ');
        self.buf.push(':');
        self.buf.push_str(param);
    }

    /// Returns a buffer the caller can use to append characters to an IRC message.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use vireo_tokens::{Command, Buffer};
    /// let mut response = Buffer::new();
    /// {
    ///     let mut msg = response.message("nick", Command::Mode)
    ///         .param("#my_channel");
    ///     let param = msg.raw_param();
    ///     param.push('+');
    ///     param.push('n');
    ///     param.push('t');
    /// }
    ///
    /// assert_eq!(&response.build(), ":nick MODE #my_channel +nt\r\n");
    /// ```
    pub fn raw_param(&mut self) -> &mut String {
        self.buf.push(' ');
        self.buf
    }

    /// Returns a buffer the caller can use to append characters to the trailing parameter of an
    /// IRC message.
    pub fn raw_trailing_param(&mut self) -> &mut String {
        self.buf.push(' ');
        self.buf.push(':');
        self.buf
    }
}

impl Drop for MessageBuffer<'_> {
    /// Auto-magically append "\r\n" when the `MessageBuffer` is dropped.
    fn drop(&mut self) {
        self.buf.push('\r');
        self.buf.push('\n');
    }
}

/// Helper to build IRC messages.
///
/// The `Buffer` is used to ease the creation of strings representing valid IRC messages.  If you
/// mainly need to send replies, `ReplyBuffer` might be a better fit for you.
///
/// # Example
///
/// ```rust
/// # use vireo_tokens::{Command, Buffer, rpl};
/// let mut response = Buffer::new();
///
/// response.message("nick", Command::Topic)
///     .param("#hall")
///     .trailing_param("Welcome to new users!");
/// response.message("vireo.example", rpl::TOPIC)
///     .param("nickname")
///     .param("#hall")
///     .trailing_param("Welcome to new users!");
///
/// let result = response.build();
/// assert_eq!(&result, ":nick TOPIC #hall :Welcome to new users!\r\n\
/// :vireo.example 332 nickname #hall :Welcome to new users!\r\n");
/// ```
#[derive(Debug, Default)]
pub struct Buffer {
    buf: String,
}

impl Buffer {
    /// Creates a `Buffer`.  Does not allocate.
    pub fn new() -> Self {
        Self { buf: String::new() }
    }

    /// Whether the buffer is empty.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use vireo_tokens::{Command, Buffer};
    /// let empty = Buffer::new();
    /// let mut not_empty = Buffer::new();
    ///
    /// not_empty.message("nick", Command::Quit);
    ///
    /// assert_eq!(empty.is_empty(), true);
    /// assert_eq!(not_empty.is_empty(), false);
    /// ```
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends an IRC message with a prefix to the buffer.
    ///
    /// This function may allocate to reserve space for the message.
    pub fn message(&mut self, prefix: &str, command: impl Into<Command>) -> MessageBuffer<'_> {
        self.buf.reserve(MESSAGE_LENGTH);
        MessageBuffer::with_prefix(&mut self.buf, prefix, command)
    }

    /// Consumes the `Buffer` and returns the underlying `String`.
    pub fn build(self) -> String {
        self.buf
    }
}

/// An helper to build IRC replies.
///
/// IRC replies are IRC messages that have the domain of the server as prefix, and the nickname of
/// the client as first parameter.
///
/// # Example
///
/// ```rust
/// # use vireo_tokens::{Command, ReplyBuffer, rpl};
/// let mut response = ReplyBuffer::new("vireo.example", "nickname");
///
/// response.message("nick", Command::Topic)
///     .param("#hall")
///     .trailing_param("Welcome to new users!");
/// response.reply(rpl::TOPIC)
///     .param("#hall")
///     .trailing_param("Welcome to new users!");
///
/// let result = response.build();
/// assert_eq!(&result, ":nick TOPIC #hall :Welcome to new users!\r\n\
/// :vireo.example 332 nickname #hall :Welcome to new users!\r\n");
/// ```
pub struct ReplyBuffer {
    domain: String,
    label: String,
    buf: Buffer,
}

impl ReplyBuffer {
    /// Creates a new `ReplyBuffer` with the given domain and client label.
    ///
    /// The label is the client's nickname, or `*` when the client has no nickname yet.
    pub fn new(domain: &str, label: &str) -> Self {
        Self {
            domain: domain.to_owned(),
            label: label.to_owned(),
            buf: Buffer::new(),
        }
    }

    /// Whether the buffer has messages in it or not.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use vireo_tokens::{ReplyBuffer, rpl};
    /// let empty = ReplyBuffer::new("vireo.example", "ada");
    /// let mut not_empty = ReplyBuffer::new("vireo.example", "ada");
    ///
    /// not_empty.reply(rpl::ERR_NOTREGISTERED);
    ///
    /// assert_eq!(empty.is_empty(), true);
    /// assert_eq!(not_empty.is_empty(), false);
    /// ```
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Appends a reply to the buffer.
    ///
    /// This will push the domain, the reply and the label of the client, and then return the
    /// resulting `MessageBuffer`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use vireo_tokens::{ReplyBuffer, rpl};
    /// let mut response = ReplyBuffer::new("vireo.example", "ada");
    ///
    /// response.reply(rpl::WELCOME).trailing_param("Welcome to IRC, ada");
    ///
    /// assert_eq!(&response.build(), ":vireo.example 001 ada :Welcome to IRC, ada\r\n");
    /// ```
    pub fn reply(&mut self, r: impl Into<Command>) -> MessageBuffer<'_> {
        self.buf.buf.reserve(MESSAGE_LENGTH);
        MessageBuffer::with_prefix(&mut self.buf.buf, &self.domain, r).param(&self.label)
    }

    /// Appends a prefixed message like you would do with a `Buffer`.
    pub fn message(&mut self, prefix: &str, command: impl Into<Command>) -> MessageBuffer<'_> {
        self.buf.message(prefix, command)
    }

    /// Consumes the buffer and returns the underlying `String`.
    pub fn build(self) -> String {
        self.buf.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpl;

    #[test]
    fn test_message_param_shapes() {
        let mut buf = Buffer::new();
        buf.message("", Command::Nick).param("ada");
        assert_eq!(&buf.build(), "NICK ada\r\n");

        let mut buf = Buffer::new();
        buf.message("ada", Command::Join).param("#dev");
        assert_eq!(&buf.build(), ":ada JOIN #dev\r\n");

        let mut buf = Buffer::new();
        buf.message("ada", Command::Kick)
            .param("#dev")
            .param("mal")
            .trailing_param("bye");
        assert_eq!(&buf.build(), ":ada KICK #dev mal :bye\r\n");
    }

    #[test]
    fn test_reply_label() {
        let mut rb = ReplyBuffer::new("vireo.example", "*");
        rb.reply(rpl::ERR_PASSWDMISMATCH).trailing_param("Password incorrect");
        assert_eq!(
            &rb.build(),
            ":vireo.example 464 * :Password incorrect\r\n"
        );
    }

    #[test]
    fn test_reply_accumulates_in_order() {
        let mut rb = ReplyBuffer::new("vireo.example", "ada");
        rb.reply(rpl::NOTOPIC).param("#dev").trailing_param("No topic is set");
        rb.reply(rpl::CHANNELMODEIS).param("#dev").param("+i");
        assert_eq!(
            &rb.build(),
            ":vireo.example 331 ada #dev :No topic is set\r\n\
             :vireo.example 324 ada #dev +i\r\n"
        );
    }
}
