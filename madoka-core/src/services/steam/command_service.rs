use std::sync::Arc;
use futures_util::future::join_all;
use tracing::{debug, error, warn};
use madoka_common::models::{FriendStatus, GroupMessage, OutgoingMessage, PlayerCard};
use madoka_common::traits::{ChatHost, Renderer};
use crate::platforms::steam::{fetch_profile_page, friend_code, resolve_id, AvatarFetcher, ProfileDefaults, SteamClient};
use crate::repositories::{BindStore, DisableStore, ParentStore};
use crate::utils::{current_epoch, persona_status_text};
use crate::Error;

pub const STEAM_USAGE: &str = "\
steam help
steam bind <SteamID|friend code>
steam unbind
steam add <@user|QQ> <SteamID|friend code>
steam remove [@user|QQ]
steam info [@user|QQ]
steam check
steam enable
steam disable
steam update
steam nickname <name|remove>";

/// Sub-commands of `steam`, with their accepted aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteamCommand {
    Help,
    Bind,
    Unbind,
    Add,
    Remove,
    Info,
    Check,
    Enable,
    Disable,
    Update,
    Nickname,
}

impl SteamCommand {
    pub fn from_alias(word: &str) -> Option<Self> {
        let cmd = match word.to_lowercase().as_str() {
            "help" | "帮助" => SteamCommand::Help,
            "bind" | "绑定" => SteamCommand::Bind,
            "unbind" | "解绑" => SteamCommand::Unbind,
            "add" | "添加" => SteamCommand::Add,
            "remove" | "删除" => SteamCommand::Remove,
            "info" | "信息" => SteamCommand::Info,
            "check" | "查看" | "列表" => SteamCommand::Check,
            "enable" | "启用" | "开启" => SteamCommand::Enable,
            "disable" | "禁用" => SteamCommand::Disable,
            "update" | "更新" | "更新群信息" => SteamCommand::Update,
            "nickname" | "昵称" | "备注" => SteamCommand::Nickname,
            _ => return None,
        };
        Some(cmd)
    }

    fn admin_only(&self) -> bool {
        matches!(
            self,
            SteamCommand::Add | SteamCommand::Remove | SteamCommand::Enable | SteamCommand::Disable
        )
    }
}

/// `@123` or any text containing digits → the digits. `None` when there are none.
pub fn parse_target(arg: &str) -> Option<String> {
    let digits: String = arg
        .trim()
        .trim_start_matches('@')
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    (!digits.is_empty()).then_some(digits)
}

fn text(s: impl Into<String>) -> OutgoingMessage {
    OutgoingMessage::text(s)
}

/// Handles `steam <sub> ...` chat commands.
pub struct SteamCommandService {
    steam: Arc<SteamClient>,
    binds: Arc<BindStore>,
    parents: Arc<ParentStore>,
    disabled: Arc<DisableStore>,
    avatars: Arc<AvatarFetcher>,
    renderer: Arc<dyn Renderer>,
    host: Arc<dyn ChatHost>,
    profile_defaults: ProfileDefaults,
}

impl SteamCommandService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        steam: Arc<SteamClient>,
        binds: Arc<BindStore>,
        parents: Arc<ParentStore>,
        disabled: Arc<DisableStore>,
        avatars: Arc<AvatarFetcher>,
        renderer: Arc<dyn Renderer>,
        host: Arc<dyn ChatHost>,
        profile_defaults: ProfileDefaults,
    ) -> Self {
        Self {
            steam,
            binds,
            parents,
            disabled,
            avatars,
            renderer,
            host,
            profile_defaults,
        }
    }

    /// `None` when the message is not a `steam` command. Replies are sent in order;
    /// slow sub-commands lead with an acknowledgement.
    pub async fn handle(&self, msg: &GroupMessage) -> Result<Option<Vec<OutgoingMessage>>, Error> {
        let mut words = msg.text.split_whitespace();
        match words.next() {
            Some(first) if first.eq_ignore_ascii_case("steam") => {}
            _ => return Ok(None),
        }
        let args: Vec<&str> = words.collect();
        let Some((sub, rest)) = args.split_first() else {
            return Ok(Some(vec![text(STEAM_USAGE)]));
        };
        let Some(cmd) = SteamCommand::from_alias(sub) else {
            return Ok(Some(vec![text(format!("Unknown sub-command `{sub}`.\n{STEAM_USAGE}"))]));
        };
        debug!("steam {:?} from {} in {}", cmd, msg.user_id, msg.group_id);

        if cmd.admin_only() && !msg.is_admin {
            return Ok(Some(vec![text("Only group admins can use this command.")]));
        }

        let replies = match cmd {
            SteamCommand::Help => vec![text(STEAM_USAGE)],
            SteamCommand::Bind => self.bind(msg, rest.first().copied()).await?,
            SteamCommand::Unbind => vec![self.unbind(msg).await?],
            SteamCommand::Add => self.add(msg, rest.first().copied(), rest.get(1).copied()).await?,
            SteamCommand::Remove => vec![self.remove(msg, rest.first().copied()).await?],
            SteamCommand::Info => self.info(msg, rest.first().copied()).await,
            SteamCommand::Check => self.check(msg).await,
            SteamCommand::Enable => {
                self.disabled.remove(&msg.group_id).await?;
                vec![text("Steam broadcasts enabled.")]
            }
            SteamCommand::Disable => {
                self.disabled.add(&msg.group_id).await?;
                vec![text("Steam broadcasts disabled.")]
            }
            SteamCommand::Update => vec![self.update(msg).await?],
            SteamCommand::Nickname => vec![self.nickname(msg, &rest.join(" ")).await?],
        };
        Ok(Some(replies))
    }

    async fn display_name(&self, group_id: &str, user_id: &str) -> String {
        match self.host.member_display_name(group_id, user_id).await {
            Ok(Some(name)) if !name.is_empty() => name,
            Ok(_) => user_id.to_string(),
            Err(e) => {
                warn!("Could not look up member {} in {}: {}", user_id, group_id, e);
                user_id.to_string()
            }
        }
    }

    /// Persona name for the confirmation text; best effort.
    async fn persona_name(&self, steam_id: &str) -> String {
        if !self.steam.has_api_key() {
            error!("No Steam API key configured, cannot look up persona names");
            return "Unknown player".to_string();
        }
        self.steam
            .fetch_batch(&[steam_id.to_string()])
            .await
            .into_iter()
            .next()
            .map(|p| p.personaname)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown player".to_string())
    }

    async fn bind(&self, msg: &GroupMessage, id: Option<&str>) -> Result<Vec<OutgoingMessage>, Error> {
        let Some(steam_id) = id.and_then(resolve_id) else {
            return Ok(vec![text("Please enter a valid Steam ID or friend code.")]);
        };
        let member = if msg.sender_name.is_empty() {
            self.display_name(&msg.group_id, &msg.user_id).await
        } else {
            msg.sender_name.clone()
        };
        let steam_name = self.persona_name(&steam_id).await;

        self.binds.upsert(&msg.group_id, &msg.user_id, &steam_id).await?;
        Ok(vec![
            text("Got it, binding..."),
            text(format!("{member} is now bound to Steam account [{steam_name}]\nSteam ID: {steam_id}")),
        ])
    }

    async fn unbind(&self, msg: &GroupMessage) -> Result<OutgoingMessage, Error> {
        if self.binds.remove(&msg.group_id, &msg.user_id).await? {
            Ok(text("Unbound."))
        } else {
            Ok(text("You have not bound a Steam ID yet."))
        }
    }

    async fn add(&self, msg: &GroupMessage, target: Option<&str>, id: Option<&str>) -> Result<Vec<OutgoingMessage>, Error> {
        let Some(target) = target else {
            return Ok(vec![text("Please name the target member (@user or QQ number).")]);
        };
        let Some(target_id) = parse_target(target) else {
            return Ok(vec![text("Could not recognise the target member.")]);
        };
        let Some(raw_id) = id.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(vec![text("Please provide a Steam ID or friend code.")]);
        };
        let Some(steam_id) = resolve_id(raw_id) else {
            return Ok(vec![text("Malformed Steam ID.")]);
        };

        if let Some(existing) = self.binds.get_by_steam_id(&msg.group_id, &steam_id) {
            if existing.user_id != target_id {
                return Ok(vec![text(format!(
                    "Bind failed: that Steam ID is already taken by member {}",
                    existing.user_id
                ))]);
            }
        }

        let member = self.display_name(&msg.group_id, &target_id).await;
        let steam_name = self.persona_name(&steam_id).await;
        self.binds.upsert(&msg.group_id, &target_id, &steam_id).await?;
        Ok(vec![
            text("Got it, adding..."),
            text(format!("Bound {member} ({target_id}) to Steam: {steam_name} ({steam_id})")),
        ])
    }

    async fn remove(&self, msg: &GroupMessage, target: Option<&str>) -> Result<OutgoingMessage, Error> {
        let Some(target) = target else {
            return Ok(self.list_binds(&msg.group_id).await);
        };
        let Some(target_id) = parse_target(target) else {
            return Ok(text("Could not recognise that member."));
        };
        if self.binds.remove(&msg.group_id, &target_id).await? {
            Ok(text(format!("Removed the bind data of {target_id}.")))
        } else {
            Ok(text(format!("{target_id} has no bind data in this group.")))
        }
    }

    async fn list_binds(&self, group_id: &str) -> OutgoingMessage {
        let records = self.binds.records(group_id);
        if records.is_empty() {
            return text("Nobody in this group has bound a Steam account.");
        }
        let mut lines = vec!["Binds in this group:".to_string()];
        for record in records {
            let name = self.display_name(group_id, &record.user_id).await;
            lines.push(format!("- {name} ({}) -> {}", record.user_id, record.steam_id));
        }
        text(lines.join("\n"))
    }

    async fn info(&self, msg: &GroupMessage, target: Option<&str>) -> Vec<OutgoingMessage> {
        let record = match target {
            Some(arg) => {
                let Some(target_id) = parse_target(arg) else {
                    return vec![text("Unrecognised argument, give a QQ number or @someone.")];
                };
                match self.binds.get(&msg.group_id, &target_id) {
                    Some(record) => record,
                    None => return vec![text(format!("{target_id} has not bound a Steam account in this group."))],
                }
            }
            None => match self.binds.get(&msg.group_id, &msg.user_id) {
                Some(record) => record,
                None => return vec![text("You have not bound a Steam account. Use `steam bind <id>`.")],
            },
        };

        let data = fetch_profile_page(self.steam.http().as_ref(), &record.steam_id, &self.profile_defaults).await;
        let card = PlayerCard {
            background: data.background,
            avatar: data.avatar,
            player_name: data.player_name,
            friend_code: friend_code(&record.steam_id).unwrap_or_default(),
            description: data.description,
            recent_2_week_play_time: data.recent_2_week_play_time.unwrap_or_else(|| "0 hours".to_string()),
            games: data.game_data.into_iter().map(|g| g.game_name).collect(),
        };

        let ack = text("Got it, reading...");
        match self.renderer.player_card(&card) {
            Ok(image) => vec![ack, OutgoingMessage::image(image)],
            Err(e) => {
                error!("Failed to draw player card for {}: {}", record.steam_id, e);
                vec![ack, text("Drawing failed, some data may be malformed.")]
            }
        }
    }

    async fn check(&self, msg: &GroupMessage) -> Vec<OutgoingMessage> {
        let ids = self.binds.get_all(&msg.group_id);
        if ids.is_empty() {
            return vec![text("No Steam accounts are bound in this group.")];
        }
        let ack = text("Got it, reading...");

        let players = self.steam.fetch_batch(&ids).await;
        if players.is_empty() {
            return vec![ack, text("No player information found.")];
        }

        let now = current_epoch();
        let avatars = join_all(players.iter().map(|p| self.avatars.fetch(p))).await;
        let friends: Vec<FriendStatus> = players
            .iter()
            .zip(avatars)
            .map(|(p, avatar)| FriendStatus {
                steamid: p.steamid.clone(),
                name: p.personaname.clone(),
                nickname: self
                    .binds
                    .get_by_steam_id(&msg.group_id, &p.steamid)
                    .and_then(|r| r.nickname),
                status: persona_status_text(p, now),
                personastate: p.personastate,
                avatar,
            })
            .collect();

        let parent_avatar = self
            .parents
            .avatar_bytes(&msg.group_id)
            .await
            .unwrap_or_else(|| self.avatars.fallback().to_vec());
        let parent_name = self
            .parents
            .get(&msg.group_id)
            .and_then(|m| m.name)
            .unwrap_or_else(|| msg.group_id.clone());

        match self.renderer.friends_status(&parent_avatar, &parent_name, &friends) {
            Ok(image) => vec![ack, OutgoingMessage::image(image)],
            Err(e) => {
                error!("Failed to draw friends board for {}: {}", msg.group_id, e);
                vec![ack, text("Something went wrong while drawing the board.")]
            }
        }
    }

    async fn update(&self, msg: &GroupMessage) -> Result<OutgoingMessage, Error> {
        let info = match self.host.group_info(&msg.group_id).await {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to read group info for {}: {}", msg.group_id, e);
                return Ok(text("Could not read the group avatar or name."));
            }
        };
        self.parents
            .update(&msg.group_id, info.avatar.as_deref(), &info.name)
            .await?;
        Ok(text(format!("Updated, the new name is {}", info.name)))
    }

    async fn nickname(&self, msg: &GroupMessage, name: &str) -> Result<OutgoingMessage, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(text("Please enter a nickname."));
        }
        if self.binds.get(&msg.group_id, &msg.user_id).is_none() {
            return Ok(text("You have not bound a Steam ID."));
        }
        if name == "remove" || name == "删除" {
            self.binds.set_nickname(&msg.group_id, &msg.user_id, None).await?;
            return Ok(text("Nickname removed."));
        }
        self.binds
            .set_nickname(&msg.group_id, &msg.user_id, Some(name.to_string()))
            .await?;
        Ok(text(format!("Nickname set to {name}")))
    }
}
