//! Channel data.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use vireo_tokens::{mode, MessageBuffer};

/// Channel data.
#[derive(Default)]
pub struct Channel {
    /// Channel members, in join order.  Broadcasts walk this list front to back.
    pub members: Vec<SocketAddr>,

    /// The operator flag of each current member.
    operators: HashMap<SocketAddr, bool>,

    /// Clients that have been invited (via INVITE) and may pass the +i check once.
    pub invites: HashSet<SocketAddr>,

    /// The topic.  Empty means no topic is set.
    pub topic: String,

    // Modes: https://tools.ietf.org/html/rfc1459.html#section-4.2.3
    pub invite_only: bool,
    pub topic_restricted: bool,

    /// The channel key (+k).  Empty means no key.
    pub key: String,

    /// The member limit (+l).  Zero means no limit.
    pub user_limit: usize,
}

impl Channel {
    /// Adds a member.
    ///
    /// The first member of a channel becomes its operator.  Adding a member twice, or adding
    /// to a full channel, is a no-op; the JOIN handler makes the admission checks and owns
    /// the error replies.
    pub fn add_member(&mut self, addr: SocketAddr) {
        if self.is_member(&addr) {
            return;
        }
        if self.user_limit != 0 && self.user_limit <= self.members.len() {
            return;
        }
        let is_operator = self.members.is_empty();
        self.members.push(addr);
        self.operators.insert(addr, is_operator);
        self.invites.remove(&addr);
    }

    /// Removes a member along with its operator flag.
    pub fn remove_member(&mut self, addr: &SocketAddr) {
        self.members.retain(|member| member != addr);
        self.operators.remove(addr);
    }

    pub fn is_member(&self, addr: &SocketAddr) -> bool {
        self.members.contains(addr)
    }

    pub fn is_operator(&self, addr: &SocketAddr) -> bool {
        self.operators.get(addr).copied().unwrap_or(false)
    }

    pub fn is_invited(&self, addr: &SocketAddr) -> bool {
        !self.invite_only || self.invites.contains(addr)
    }

    /// Writes the channel modes, as answered to a MODE query.
    ///
    /// The key and the limit values are only written when `full_info` is set, that is, when
    /// the requester is a member.
    pub fn modes(&self, mut out: MessageBuffer<'_>, full_info: bool) {
        let modes = out.raw_param();
        modes.push('+');
        if self.invite_only {
            modes.push('i');
        }
        if self.topic_restricted {
            modes.push('t');
        }
        if self.user_limit != 0 {
            modes.push('l');
        }
        if !self.key.is_empty() {
            modes.push('k');
        }

        if full_info {
            if self.user_limit != 0 {
                out = out.param(&self.user_limit.to_string());
            }
            if !self.key.is_empty() {
                out.param(&self.key);
            }
        }
    }

    /// Applies a single mode change and returns whether it had an effect.
    ///
    /// `nick_of` resolves member addresses for +o/-o; a nickname that doesn't belong to a
    /// member makes this return an error so the caller can pick the right numeric.
    pub fn apply_mode_change<'a, F>(
        &mut self,
        change: mode::ChannelChange<'_>,
        nick_of: F,
    ) -> Result<bool, ()>
    where
        F: Fn(&SocketAddr) -> &'a str,
    {
        use mode::ChannelChange::*;
        let mut applied = false;
        match change {
            InviteOnly(value) => {
                applied = self.invite_only != value;
                self.invite_only = value;
            }
            TopicRestricted(value) => {
                applied = self.topic_restricted != value;
                self.topic_restricted = value;
            }
            Key(true, key) => {
                applied = self.key != key;
                self.key.clear();
                self.key.push_str(key);
            }
            Key(false, _) => {
                applied = !self.key.is_empty();
                self.key.clear();
            }
            UserLimit(Some(s)) => {
                // Limits must be positive integers; anything else is ignored.
                if let Ok(limit) = s.parse() {
                    if limit != 0 {
                        applied = self.user_limit != limit;
                        self.user_limit = limit;
                    }
                }
            }
            UserLimit(None) => {
                applied = self.user_limit != 0;
                self.user_limit = 0;
            }
            Operator(value, nick) => {
                let member = self
                    .members
                    .iter()
                    .find(|addr| nick_of(addr) == nick)
                    .copied();
                match member {
                    Some(addr) => {
                        applied = self.is_operator(&addr) != value;
                        self.operators.insert(addr, value);
                    }
                    None => return Err(()),
                }
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_first_member_is_operator() {
        let mut channel = Channel::default();
        channel.add_member(addr(1));
        channel.add_member(addr(2));
        assert!(channel.is_operator(&addr(1)));
        assert!(!channel.is_operator(&addr(2)));

        // Join order is preserved.
        assert_eq!(channel.members, vec![addr(1), addr(2)]);

        channel.remove_member(&addr(1));
        assert_eq!(channel.members, vec![addr(2)]);
        assert!(!channel.is_operator(&addr(1)));
    }

    #[test]
    fn test_add_member_is_idempotent_and_respects_limit() {
        let mut channel = Channel::default();
        channel.add_member(addr(1));
        channel.add_member(addr(1));
        assert_eq!(channel.members.len(), 1);

        channel.user_limit = 2;
        channel.add_member(addr(2));
        channel.add_member(addr(3));
        assert_eq!(channel.members, vec![addr(1), addr(2)]);
    }

    #[test]
    fn test_join_consumes_invite() {
        let mut channel = Channel::default();
        channel.invite_only = true;
        assert!(!channel.is_invited(&addr(1)));
        channel.invites.insert(addr(1));
        assert!(channel.is_invited(&addr(1)));
        channel.add_member(addr(1));
        assert!(channel.invites.is_empty());
    }

    #[test]
    fn test_mode_toggles_round_trip() {
        let mut channel = Channel::default();
        let nick_of = |_: &SocketAddr| "ada";

        for query in ["+i", "+t", "+k secret", "+l 10"] {
            let mut split = query.split(' ');
            let modes = split.next().unwrap();
            let params = split.collect::<Vec<_>>();
            for change in mode::channel_query(modes, params.iter()) {
                assert_eq!(channel.apply_mode_change(change.unwrap(), nick_of), Ok(true));
            }
        }
        assert!(channel.invite_only);
        assert!(channel.topic_restricted);
        assert_eq!(channel.key, "secret");
        assert_eq!(channel.user_limit, 10);

        for query in ["-i", "-t", "-k", "-l"] {
            for change in mode::channel_query::<_, String>(query, &[]) {
                assert_eq!(channel.apply_mode_change(change.unwrap(), nick_of), Ok(true));
            }
        }
        assert!(!channel.invite_only);
        assert!(!channel.topic_restricted);
        assert!(channel.key.is_empty());
        assert_eq!(channel.user_limit, 0);

        // Re-disabling is a no-op.
        for change in mode::channel_query::<_, String>("-i", &[]) {
            assert_eq!(channel.apply_mode_change(change.unwrap(), nick_of), Ok(false));
        }
    }

    #[test]
    fn test_operator_mode_requires_member() {
        let mut channel = Channel::default();
        channel.add_member(addr(1));
        channel.add_member(addr(2));
        let nick_of = |a: &SocketAddr| if a.port() == 1 { "ada" } else { "bob" };

        for change in mode::channel_query("+o", &["bob"]) {
            assert_eq!(channel.apply_mode_change(change.unwrap(), nick_of), Ok(true));
        }
        assert!(channel.is_operator(&addr(2)));

        for change in mode::channel_query("+o", &["ghost"]) {
            assert_eq!(channel.apply_mode_change(change.unwrap(), nick_of), Err(()));
        }
    }
}
