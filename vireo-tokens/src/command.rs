use std::fmt;

macro_rules! commands {
    ( $( $cmd:ident $cmd_str:literal $n:literal $auth:literal )* ) => {
        /// The list of known commands.
        ///
        /// Unknown commands and replies are supported by `Message` directly, this enum just
        /// contains the supported commands.
        #[derive(Clone, Copy, Debug, PartialEq)]
        pub enum Command {
            $( $cmd, )*
            Reply(&'static str),
        }

        impl Command {
            /// From a given command string, returns the corresponding command, or `None`
            /// otherwise.
            ///
            /// It ignores the case of its argument.
            ///
            /// # Example
            ///
            /// ```rust
            /// # use vireo_tokens::Command;
            /// let join = Command::parse("join");
            /// let join2 = Command::parse("JOIN");
            /// let not_join = Command::parse("not_join");
            ///
            /// assert_eq!(join, Some(Command::Join));
            /// assert_eq!(join2, Some(Command::Join));
            /// assert_eq!(not_join, None);
            /// ```
            pub fn parse(s: &str) -> Option<Self> {
                $( if s.eq_ignore_ascii_case($cmd_str) {
                    Some(Command::$cmd)
                } else )* {
                    None
                }
            }

            /// Returns the number of required arguments for the command.
            ///
            /// The command may accept more arguments.
            ///
            /// # Example
            ///
            /// ```rust
            /// # use vireo_tokens::Command;
            /// let privmsg = Command::parse("Privmsg").unwrap();
            /// let topic = Command::parse("TOPIC").unwrap();
            ///
            /// assert_eq!(privmsg.required_params(), 2);
            /// assert_eq!(topic.required_params(), 1);
            /// ```
            pub fn required_params(&self) -> usize {
                match self {
                $(
                    Command::$cmd => $n,
                )*
                    Command::Reply(_) => 0,
                }
            }

            /// Whether the command can only be issued by clients that have completed the
            /// password + registration handshake.
            ///
            /// # Example
            ///
            /// ```rust
            /// # use vireo_tokens::Command;
            /// assert!(Command::Join.requires_auth());
            /// assert!(!Command::Pass.requires_auth());
            /// ```
            pub fn requires_auth(&self) -> bool {
                match self {
                $(
                    Command::$cmd => $auth,
                )*
                    Command::Reply(_) => false,
                }
            }

            /// Returns the command string. It is not the string that have been parsed.
            ///
            /// # Example
            ///
            /// ```rust
            /// # use vireo_tokens::Command;
            /// let privmsg = Command::parse("Privmsg").unwrap();
            ///
            /// assert_eq!(privmsg.as_str(), "PRIVMSG");
            /// ```
            pub fn as_str(&self) -> &'static str {
                match self {
                $(
                    Command::$cmd => $cmd_str,
                )*
                    Command::Reply(s) => s,
                }
            }
        }

        impl From<&'static str> for Command {
            /// `&'static str`s are converted to the `Command::Reply` variant.
            ///
            /// This trait is used by `Buffer` to accept both `Command` and `Reply` when
            /// building messages.
            fn from(reply: &'static str) -> Self {
                Command::Reply(reply)
            }
        }

        impl fmt::Display for Command {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.as_str().fmt(f)
            }
        }
    }
}

commands! {
//  Ident.   String     Min # of params   Needs auth
    Invite   "INVITE"   2                 true
    Join     "JOIN"     1                 true
    Kick     "KICK"     2                 true
    Mode     "MODE"     1                 true
    Nick     "NICK"     1                 false
    Pass     "PASS"     1                 false
    PrivMsg  "PRIVMSG"  2                 true
    Quit     "QUIT"     0                 false
    Topic    "TOPIC"    1                 true
    User     "USER"     4                 false
}
