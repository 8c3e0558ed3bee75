//! The texts of the replies sent by the server.

use vireo_tokens::MessageBuffer;

pub const BAD_CHAN_KEY: &str = "Cannot join channel (+k)";

pub const CANNOT_SEND_TO_CHAN: &str = "Cannot send to channel";

pub const CHAN_O_PRIVS_NEEDED: &str = "You're not channel operator";

pub const CHANNEL_IS_FULL: &str = "Cannot join channel (+l)";

pub const CLOSING_LINK: &str = "Closing link";

pub const INVITE_ONLY_CHAN: &str = "Cannot join channel (+i)";

pub const NEED_MORE_PARAMS: &str = "Not enough parameters";

pub const NICKNAME_IN_USE: &str = "Nickname is already in use";

pub const NO_NICKNAME_GIVEN: &str = "No nickname given";

pub const NO_SUCH_CHANNEL: &str = "No such channel";

pub const NO_SUCH_NICK: &str = "No such nick/channel";

pub const NO_TOPIC: &str = "No topic is set";

pub const NOT_ON_CHANNEL: &str = "You're not on that channel";

pub const NOT_REGISTERED: &str = "You have not registered";

pub const PASSWORD_MISMATCH: &str = "Password incorrect";

pub const UNKNOWN_COMMAND: &str = "Unknown command";

pub const UNKNOWN_MODE: &str = "is unknown mode char to me";

pub const USER_NOT_IN_CHANNEL: &str = "They aren't on that channel";

pub const USER_ON_CHANNEL: &str = "is already on channel";

// Welcome messages

pub fn welcome(mut r: MessageBuffer<'_>, nick: &str) {
    let trailing = r.raw_trailing_param();
    trailing.push_str("Welcome to the Internet Relay Network ");
    trailing.push_str(nick);
}

pub fn your_host(mut r: MessageBuffer<'_>, domain: &str) {
    let trailing = r.raw_trailing_param();
    trailing.push_str("Your host is ");
    trailing.push_str(domain);
    trailing.push_str(", running version ");
    trailing.push_str(crate::server_version!());
}

pub fn created(mut r: MessageBuffer<'_>, since: &str) {
    let trailing = r.raw_trailing_param();
    trailing.push_str("This server was created ");
    trailing.push_str(since);
}
