//! Handlers for the RFC 1459 subset vireo speaks.
//!
//! <https://tools.ietf.org/html/rfc1459.html>

use super::{find_channel, find_member, find_nick, CommandContext, HandlerResult as Result};
use crate::client::MessageQueueItem;
use crate::lines;
use std::collections::HashSet;
use vireo_tokens::{mode, rpl, Buffer, Command};

// Command handlers
impl super::StateInner {
    // INVITE

    pub fn cmd_invite(&mut self, ctx: CommandContext<'_>, nick: &str, channel_name: &str) -> Result {
        let channel = find_channel(ctx.addr, ctx.rb, &self.channels, channel_name)?;
        let is_operator = find_member(ctx.addr, ctx.rb, channel, channel_name)?;
        if !is_operator {
            log::debug!("{}:     not operator", ctx.addr);
            ctx.rb
                .reply(rpl::ERR_CHANOPRIVSNEEDED)
                .param(channel_name)
                .trailing_param(lines::CHAN_O_PRIVS_NEEDED);
            return Err(());
        }
        let (target_addr, _) = find_nick(ctx.addr, ctx.rb, &self.clients, nick)?;
        if channel.is_member(&target_addr) {
            log::debug!("{}:     user on channel", ctx.addr);
            ctx.rb
                .reply(rpl::ERR_USERONCHANNEL)
                .param(nick)
                .param(channel_name)
                .trailing_param(lines::USER_ON_CHANNEL);
            return Err(());
        }

        // Remember the invitation so that a later JOIN passes the +i check.
        self.channels
            .get_mut(channel_name)
            .unwrap()
            .invites
            .insert(target_addr);

        ctx.rb.reply(rpl::INVITING).param(nick).param(channel_name);

        let mut invite = Buffer::new();
        invite
            .message(self.clients[ctx.addr].nick(), Command::Invite)
            .param(nick)
            .param(channel_name);
        self.clients[&target_addr].send(invite);

        Ok(())
    }

    // JOIN

    pub fn cmd_join(&mut self, ctx: CommandContext<'_>, target: &str, key: &str) -> Result {
        // A missing '#' is added rather than rejected.
        let name = if target.starts_with('#') {
            target.to_owned()
        } else {
            format!("#{}", target)
        };

        if let Some(channel) = self.channels.get(&name) {
            if channel.is_member(ctx.addr) {
                log::debug!("{}:     already in channel", ctx.addr);
                return Err(());
            }
            if !channel.key.is_empty() && key != channel.key {
                log::debug!("{}:     bad key", ctx.addr);
                ctx.rb
                    .reply(rpl::ERR_BADCHANKEY)
                    .param(&name)
                    .trailing_param(lines::BAD_CHAN_KEY);
                return Err(());
            }
            if !channel.is_invited(ctx.addr) {
                log::debug!("{}:     not invited", ctx.addr);
                ctx.rb
                    .reply(rpl::ERR_INVITEONLYCHAN)
                    .param(&name)
                    .trailing_param(lines::INVITE_ONLY_CHAN);
                return Err(());
            }
            if channel.user_limit != 0 && channel.user_limit <= channel.members.len() {
                log::debug!("{}:     user limit reached", ctx.addr);
                ctx.rb
                    .reply(rpl::ERR_CHANNELISFULL)
                    .param(&name)
                    .trailing_param(lines::CHANNEL_IS_FULL);
                return Err(());
            }
        }

        let channel = self.channels.entry(name.clone()).or_default();
        channel.add_member(*ctx.addr);
        let client = self.clients.get_mut(ctx.addr).unwrap();
        client.channels.insert(name.clone());

        let mut join_response = Buffer::new();
        join_response.message(client.nick(), Command::Join).param(&name);
        let msg = MessageQueueItem::from(join_response);
        client.send(msg.clone());
        self.broadcast(&name, msg, Some(ctx.addr));

        Ok(())
    }

    // KICK

    pub fn cmd_kick(
        &mut self,
        ctx: CommandContext<'_>,
        target: &str,
        nick: &str,
        reason: &str,
    ) -> Result {
        let channel = find_channel(ctx.addr, ctx.rb, &self.channels, target)?;
        let is_operator = find_member(ctx.addr, ctx.rb, channel, target)?;
        if !is_operator {
            log::debug!("{}:     not operator", ctx.addr);
            ctx.rb
                .reply(rpl::ERR_CHANOPRIVSNEEDED)
                .param(target)
                .trailing_param(lines::CHAN_O_PRIVS_NEEDED);
            return Err(());
        }
        let (kicked_addr, _) = find_nick(ctx.addr, ctx.rb, &self.clients, nick)?;
        if !channel.is_member(&kicked_addr) {
            log::debug!("{}:     target not on channel", ctx.addr);
            ctx.rb
                .reply(rpl::ERR_USERNOTINCHANNEL)
                .param(nick)
                .param(target)
                .trailing_param(lines::USER_NOT_IN_CHANNEL);
            return Err(());
        }

        let kicker = self.clients[ctx.addr].nick();
        let mut kick_response = Buffer::new();
        kick_response
            .message(kicker, Command::Kick)
            .param(target)
            .param(nick)
            .trailing_param(if reason.is_empty() { kicker } else { reason });
        // Everyone hears about the kick, the target and the kicker included.
        self.broadcast(target, MessageQueueItem::from(kick_response), None);

        self.channels.get_mut(target).unwrap().remove_member(&kicked_addr);
        self.clients.get_mut(&kicked_addr).unwrap().channels.remove(target);
        self.remove_if_empty(target);

        Ok(())
    }

    // MODE

    fn cmd_mode_chan_get(&self, ctx: CommandContext<'_>, target: &str) -> Result {
        let channel = find_channel(ctx.addr, ctx.rb, &self.channels, target)?;
        let msg = ctx.rb.reply(rpl::CHANNELMODEIS).param(target);
        channel.modes(msg, channel.is_member(ctx.addr));

        Ok(())
    }

    fn cmd_mode_chan_set(
        &mut self,
        ctx: CommandContext<'_>,
        target: &str,
        modes: &str,
        modeparams: &[&str],
    ) -> Result {
        let channel = match self.channels.get_mut(target) {
            Some(channel) => channel,
            None => {
                log::debug!("{}:         no such channel", ctx.addr);
                ctx.rb
                    .reply(rpl::ERR_NOSUCHCHANNEL)
                    .param(target)
                    .trailing_param(lines::NO_SUCH_CHANNEL);
                return Err(());
            }
        };
        let is_operator = find_member(ctx.addr, ctx.rb, channel, target)?;
        if !is_operator {
            log::debug!("{}:     not operator", ctx.addr);
            ctx.rb
                .reply(rpl::ERR_CHANOPRIVSNEEDED)
                .param(target)
                .trailing_param(lines::CHAN_O_PRIVS_NEEDED);
            return Err(());
        }

        let clients = &self.clients;

        let mut applied_modes = String::new();
        let mut applied_modeparams = Vec::new();
        for maybe_change in mode::channel_query(modes, modeparams.iter()) {
            match maybe_change {
                Ok(change) => match channel.apply_mode_change(change, |a| clients[a].nick()) {
                    Ok(true) => {
                        log::debug!("  - Applied {:?}", change);
                        applied_modes.push(if change.value() { '+' } else { '-' });
                        applied_modes.push(change.symbol());
                        if let Some(param) = change.param() {
                            applied_modeparams.push(param.to_owned());
                        }
                    }
                    Ok(false) => {}
                    Err(()) => {
                        // +o/-o with a nickname that is not in the channel.
                        ctx.rb
                            .reply(rpl::ERR_NOSUCHNICK)
                            .param(change.param().unwrap_or(""))
                            .trailing_param(lines::NO_SUCH_NICK);
                        return Err(());
                    }
                },
                Err(mode::Error::Unknown(mode_char, _)) => {
                    let mut msg = ctx.rb.reply(rpl::ERR_UNKNOWNMODE);
                    msg.raw_param().push(mode_char);
                    msg.trailing_param(lines::UNKNOWN_MODE);
                    return Err(());
                }
                Err(mode::Error::MissingParam(..)) => {
                    ctx.rb
                        .reply(rpl::ERR_NEEDMOREPARAMS)
                        .param(Command::Mode.as_str())
                        .trailing_param(lines::NEED_MORE_PARAMS);
                    return Err(());
                }
            }
        }

        if !applied_modes.is_empty() {
            let mut response = Buffer::new();
            {
                let mut msg = response
                    .message(self.clients[ctx.addr].nick(), Command::Mode)
                    .param(target)
                    .param(&applied_modes);
                for mp in applied_modeparams {
                    msg = msg.param(&mp);
                }
            }
            self.broadcast(target, MessageQueueItem::from(response), None);
        }

        Ok(())
    }

    pub fn cmd_mode(
        &mut self,
        ctx: CommandContext<'_>,
        target: &str,
        modes: &str,
        modeparams: &[&str],
    ) -> Result {
        if modes.is_empty() {
            self.cmd_mode_chan_get(ctx, target)
        } else {
            self.cmd_mode_chan_set(ctx, target, modes, modeparams)
        }
    }

    // NICK

    pub fn cmd_nick(&mut self, ctx: CommandContext<'_>, nick: &str) -> Result {
        if nick.is_empty() {
            ctx.rb
                .reply(rpl::ERR_NONICKNAMEGIVEN)
                .trailing_param(lines::NO_NICKNAME_GIVEN);
            return Err(());
        }
        if self.clients.values().any(|c| c.nick() == nick) {
            log::debug!("{}:     nickname already in use", ctx.addr);
            ctx.rb
                .reply(rpl::ERR_NICKNAMEINUSE)
                .param(nick)
                .trailing_param(lines::NICKNAME_IN_USE);
            return Err(());
        }

        let client = self.clients.get_mut(ctx.addr).unwrap();

        if !client.is_registered() {
            client.set_nick(nick);
            return Ok(());
        }

        let mut nick_response = Buffer::new();
        nick_response.message(client.nick(), Command::Nick).param(nick);
        let msg = MessageQueueItem::from(nick_response);

        client.set_nick(nick);

        let mut noticed = self
            .channels
            .values()
            .filter(|channel| channel.is_member(ctx.addr))
            .flat_map(|channel| channel.members.iter())
            .copied()
            .collect::<HashSet<_>>();
        noticed.insert(*ctx.addr);
        for addr in noticed {
            self.send(&addr, msg.clone());
        }

        Ok(())
    }

    // PASS

    pub fn cmd_pass(&mut self, ctx: CommandContext<'_>, password: &str) -> Result {
        if password == self.password {
            // No reply on success (RFC 1459); the flag is picked up by registration.
            self.clients.get_mut(ctx.addr).unwrap().give_password();
            Ok(())
        } else {
            log::debug!("{}:     password mismatch", ctx.addr);
            ctx.rb
                .reply(rpl::ERR_PASSWDMISMATCH)
                .trailing_param(lines::PASSWORD_MISMATCH);
            Err(())
        }
    }

    // PRIVMSG

    pub fn cmd_privmsg(&mut self, ctx: CommandContext<'_>, target: &str, content: &str) -> Result {
        if target.starts_with('#') {
            let channel = find_channel(ctx.addr, ctx.rb, &self.channels, target)?;
            if !channel.is_member(ctx.addr) {
                log::debug!("{}:     can't send to channel", ctx.addr);
                ctx.rb
                    .reply(rpl::ERR_CANNOTSENDTOCHAN)
                    .param(target)
                    .trailing_param(lines::CANNOT_SEND_TO_CHAN);
                return Err(());
            }
            let mut response = Buffer::new();
            response
                .message(self.clients[ctx.addr].nick(), Command::PrivMsg)
                .param(target)
                .trailing_param(content);
            self.broadcast(target, MessageQueueItem::from(response), Some(ctx.addr));
        } else {
            let (_, target_client) = find_nick(ctx.addr, ctx.rb, &self.clients, target)?;
            let mut response = Buffer::new();
            response
                .message(self.clients[ctx.addr].nick(), Command::PrivMsg)
                .param(target)
                .trailing_param(content);
            target_client.send(response);
        }

        Ok(())
    }

    // QUIT

    pub fn cmd_quit(&mut self, ctx: CommandContext<'_>, reason: &str) -> Result {
        let client = self.clients.remove(ctx.addr).unwrap();
        let mut response = Buffer::new();
        response
            .message(&self.domain, "ERROR")
            .trailing_param(lines::CLOSING_LINK);
        client.send(MessageQueueItem::from(response));
        self.remove_client(
            ctx.addr,
            client,
            if reason.is_empty() { None } else { Some(reason) },
        );

        Err(())
    }

    // TOPIC

    fn cmd_topic_get(&self, ctx: CommandContext<'_>, target: &str) -> Result {
        let channel = find_channel(ctx.addr, ctx.rb, &self.channels, target)?;
        find_member(ctx.addr, ctx.rb, channel, target)?;
        self.write_topic(ctx.rb, target);

        Ok(())
    }

    fn cmd_topic_set(&mut self, ctx: CommandContext<'_>, target: &str, topic: &str) -> Result {
        let channel = match self.channels.get_mut(target) {
            Some(channel) => channel,
            None => {
                log::debug!("{}:         no such channel", ctx.addr);
                ctx.rb
                    .reply(rpl::ERR_NOSUCHCHANNEL)
                    .param(target)
                    .trailing_param(lines::NO_SUCH_CHANNEL);
                return Err(());
            }
        };
        let is_operator = find_member(ctx.addr, ctx.rb, channel, target)?;
        if channel.topic_restricted && !is_operator {
            log::debug!("{}:     not operator", ctx.addr);
            ctx.rb
                .reply(rpl::ERR_CHANOPRIVSNEEDED)
                .param(target)
                .trailing_param(lines::CHAN_O_PRIVS_NEEDED);
            return Err(());
        }

        channel.topic.clear();
        channel.topic.push_str(topic);

        let mut response = Buffer::new();
        response
            .message(self.clients[ctx.addr].nick(), Command::Topic)
            .param(target)
            .trailing_param(topic);
        self.broadcast(target, MessageQueueItem::from(response), None);

        Ok(())
    }

    pub fn cmd_topic(&mut self, ctx: CommandContext<'_>, target: &str, topic: Option<&str>) -> Result {
        if let Some(topic) = topic {
            self.cmd_topic_set(ctx, target, topic)
        } else {
            self.cmd_topic_get(ctx, target)
        }
    }

    // USER

    pub fn cmd_user(&mut self, ctx: CommandContext<'_>, user: &str, real: &str) -> Result {
        let client = self.clients.get_mut(ctx.addr).unwrap();
        client.set_user_real(user, real);

        Ok(())
    }
}
