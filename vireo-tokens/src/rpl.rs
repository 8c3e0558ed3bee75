//! The list of IRC replies sent by vireo.
//!
//! Each reply must have the client's nick (or `*` before registration) as first parameter.
//!
//! Sources:
//!
//! - <https://tools.ietf.org/html/rfc1459.html#section-6>
//! - <https://modern.ircdocs.horse/#numerics>

pub const WELCOME: &str  = "001";  // :Welcome message
pub const YOURHOST: &str = "002";  // :Your host is...
pub const CREATED: &str  = "003";  // :This server was created...
pub const MYINFO: &str   = "004";  // <servername> <version> <umodes> <chan modes>

pub const CHANNELMODEIS: &str = "324";  // <channel> <modes> <mode params>
pub const NOTOPIC: &str       = "331";  // <channel> :No topic set
pub const TOPIC: &str         = "332";  // <channel> <topic>
pub const INVITING: &str      = "341";  // <nick> <channel>

pub const ERR_NOSUCHNICK: &str       = "401";  // <nick> :No such nick/channel
pub const ERR_NOSUCHCHANNEL: &str    = "403";  // <channel> :No such channel
pub const ERR_CANNOTSENDTOCHAN: &str = "404";  // <channel> :Cannot send to channel
pub const ERR_UNKNOWNCOMMAND: &str   = "421";  // <command> :Unknown command
pub const ERR_NONICKNAMEGIVEN: &str  = "431";  // :No nickname given
pub const ERR_NICKNAMEINUSE: &str    = "433";  // <nick> :Nickname in use
pub const ERR_USERNOTINCHANNEL: &str = "441";  // <nick> <channel> :User not in channel
pub const ERR_NOTONCHANNEL: &str     = "442";  // <channel> :You're not on that channel
pub const ERR_USERONCHANNEL: &str    = "443";  // <user> <channel> :is already on channel
pub const ERR_NOTREGISTERED: &str    = "451";  // :You have not registered
pub const ERR_NEEDMOREPARAMS: &str   = "461";  // <command> :Not enough parameters
pub const ERR_PASSWDMISMATCH: &str   = "464";  // :Password incorrect
pub const ERR_CHANNELISFULL: &str    = "471";  // <channel> :Cannot join channel (+l)
pub const ERR_UNKNOWNMODE: &str      = "472";  // <char> :Don't know this mode
pub const ERR_INVITEONLYCHAN: &str   = "473";  // <channel> :Cannot join channel (+i)
pub const ERR_BADCHANKEY: &str       = "475";  // <channel> :Cannot join channel (+k)
pub const ERR_CHANOPRIVSNEEDED: &str = "482";  // <channel> :You're not an operator
