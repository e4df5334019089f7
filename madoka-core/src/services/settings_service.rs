use std::sync::Arc;
use tracing::error;
use madoka_common::models::{GroupMessage, OutgoingMessage};
use madoka_common::traits::RewardRepository;
use crate::assets::{AssetManager, ResType, SubFolder};
use crate::services::sign_service::SignService;
use crate::Error;

/// Which menu a sub-command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Set,
    Query,
}

impl Menu {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "set" | "设置" => Some(Menu::Set),
            "query" | "查询" => Some(Menu::Query),
            _ => None,
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Menu::Set => "Settings menu:",
            Menu::Query => "Query menu:",
        }
    }

    fn unknown_hint(&self) -> &'static str {
        match self {
            Menu::Set => "Unknown setting, send `set` to see the available commands.",
            Menu::Query => "Unknown query, send `query` to see the available commands.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    SetSkin,
    SetAvatar,
    QuerySkins,
    QueryProfile,
}

/// One registered sub-command.
#[derive(Debug, Clone)]
pub struct SetCommand {
    pub menu: Menu,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static str,
    action: Action,
}

pub fn registry() -> Vec<SetCommand> {
    vec![
        SetCommand {
            menu: Menu::Set,
            name: "skin",
            aliases: &["皮肤"],
            usage: "set skin <skin id>",
            action: Action::SetSkin,
        },
        SetCommand {
            menu: Menu::Set,
            name: "avatar",
            aliases: &["头像"],
            usage: "set avatar <avatar id>",
            action: Action::SetAvatar,
        },
        SetCommand {
            menu: Menu::Query,
            name: "skins",
            aliases: &["立绘"],
            usage: "query skins",
            action: Action::QuerySkins,
        },
        SetCommand {
            menu: Menu::Query,
            name: "profile",
            aliases: &["资料"],
            usage: "query profile",
            action: Action::QueryProfile,
        },
    ]
}

/// `set ...` / `query ...` dispatcher.
pub struct SettingsService {
    commands: Vec<SetCommand>,
    repo: Arc<dyn RewardRepository>,
    sign: Arc<SignService>,
    assets: AssetManager,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn RewardRepository>, sign: Arc<SignService>, assets: AssetManager) -> Self {
        Self {
            commands: registry(),
            repo,
            sign,
            assets,
        }
    }

    pub async fn handle(&self, msg: &GroupMessage) -> Result<Option<Vec<OutgoingMessage>>, Error> {
        let mut words = msg.text.split_whitespace();
        let Some(menu) = words.next().and_then(Menu::from_word) else {
            return Ok(None);
        };
        let Some(key) = words.next() else {
            return Ok(Some(vec![self.menu_text(menu)]));
        };
        let args: Vec<&str> = words.collect();

        let Some(cmd) = self.lookup(menu, key) else {
            return Ok(Some(vec![OutgoingMessage::text(menu.unknown_hint())]));
        };
        let reply = match cmd.action {
            Action::SetSkin => self.set_skin(msg, &args).await?,
            Action::SetAvatar => match args.first() {
                Some(id) => OutgoingMessage::text(format!("Avatar switched to {id}")),
                None => OutgoingMessage::text(format!("Usage: {}", cmd.usage)),
            },
            Action::QuerySkins => self.list_skins(),
            Action::QueryProfile => self.profile(msg).await?,
        };
        Ok(Some(vec![reply]))
    }

    fn lookup(&self, menu: Menu, key: &str) -> Option<&SetCommand> {
        let key = key.to_lowercase();
        self.commands
            .iter()
            .filter(|c| c.menu == menu)
            .find(|c| c.name == key || c.aliases.iter().any(|a| *a == key))
    }

    fn menu_text(&self, menu: Menu) -> OutgoingMessage {
        let mut lines = vec![menu.title().to_string()];
        lines.extend(
            self.commands
                .iter()
                .filter(|c| c.menu == menu)
                .map(|c| c.usage.to_string()),
        );
        OutgoingMessage::text(lines.join("\n"))
    }

    async fn set_skin(&self, msg: &GroupMessage, args: &[&str]) -> Result<OutgoingMessage, Error> {
        let Some(skin_key) = args.first() else {
            return Ok(OutgoingMessage::text("Usage: set skin <skin id>"));
        };
        let skins = self.assets.indexed_files(ResType::Image, SubFolder::Char, "skin");
        if !skins.contains_key(*skin_key) {
            return Ok(OutgoingMessage::text(format!("There is no skin called {skin_key}.")));
        }
        self.sign.load_profile(&msg.user_id).await?;
        if !self.repo.owns_skin(&msg.user_id, skin_key).await? {
            return Ok(OutgoingMessage::text("You don't own that skin yet."));
        }
        self.repo.set_current_skin(&msg.user_id, skin_key).await?;
        Ok(OutgoingMessage::text("Skin switched."))
    }

    fn list_skins(&self) -> OutgoingMessage {
        let skins = self.assets.indexed_files(ResType::Image, SubFolder::Char, "skin");
        if skins.is_empty() {
            return OutgoingMessage::text("No skins are available right now.");
        }
        let lines: Vec<String> = skins
            .iter()
            .map(|(key, path)| {
                let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                format!("{key} : {name}")
            })
            .collect();
        OutgoingMessage::text(format!("Available skins:\n{}", lines.join("\n")))
    }

    async fn profile(&self, msg: &GroupMessage) -> Result<OutgoingMessage, Error> {
        let (stats, record) = self.sign.load_profile(&msg.user_id).await?;
        match self.sign.render_card(&msg.sender_name, stats, record, None) {
            Ok(image) => Ok(OutgoingMessage::image(image)),
            Err(e) => {
                error!("Profile render failed for {}: {}", msg.user_id, e);
                Ok(OutgoingMessage::text(format!("Render failed: {e}")))
            }
        }
    }
}
