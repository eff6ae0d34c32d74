use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use client_core::{
    load_settings, AvatarUpload, ChatClient, Collaborators, FixedConfirmer, GateState,
    HeaderAvatar, Navigator, Notice, NoticeLevel, Notifier, Screen,
};
use shared::domain::ChatKind;
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    /// Overrides the server URL from client.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    /// Create the account instead of signing in.
    #[arg(long)]
    signup: bool,
    #[arg(long)]
    confirm_password: Option<String>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long, default_value_t = 0)]
    color: u32,
    /// Image file to upload as the profile avatar.
    #[arg(long)]
    avatar: Option<PathBuf>,
    #[arg(long)]
    remove_avatar: bool,
    /// Answer yes to confirmation prompts.
    #[arg(long)]
    yes: bool,
    /// Chat to open after loading, as `contact:<id>` or `channel:<id>`.
    #[arg(long, value_parser = parse_chat)]
    open: Option<(ChatKind, String)>,
    #[arg(long)]
    logout: bool,
}

fn parse_chat(raw: &str) -> Result<(ChatKind, String), String> {
    let (kind, id) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected contact:<id> or channel:<id>, got '{raw}'"))?;
    let kind = match kind {
        "contact" => ChatKind::Contact,
        "channel" => ChatKind::Channel,
        other => return Err(format!("unknown chat kind '{other}'")),
    };
    if id.is_empty() {
        return Err("chat id must not be empty".into());
    }
    Ok((kind, id.to_string()))
}

struct Console;

impl Navigator for Console {
    fn go_to(&self, screen: Screen) {
        println!("-> {screen:?}");
    }
}

impl Notifier for Console {
    fn notify(&self, notice: &Notice) {
        match notice.level() {
            NoticeLevel::Success => println!("[ok] {notice}"),
            NoticeLevel::Error => eprintln!("[error] {notice}"),
        }
    }
}

fn mime_for(path: &std::path::Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }
    let console = Arc::new(Console);
    let client = ChatClient::connect(
        &settings,
        Collaborators {
            navigator: console.clone(),
            notifier: console,
            confirmer: Arc::new(FixedConfirmer(args.yes)),
        },
    )?;
    info!(server = %settings.server_url, "starting chat client");

    let state = if args.signup {
        let confirm = args.confirm_password.as_deref().unwrap_or(&args.password);
        client.signup(&args.email, &args.password, confirm).await?
    } else {
        client.login(&args.email, &args.password).await?
    };

    if state == GateState::ProfileIncomplete {
        match (&args.first_name, &args.last_name) {
            (Some(first), Some(last)) => {
                client.update_profile(first, last, args.color).await?;
            }
            _ => bail!("profile setup required: pass --first-name and --last-name"),
        }
    }

    if let Some(path) = &args.avatar {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read avatar {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow!("avatar path has no file name"))?
            .to_string();
        let image = client
            .set_avatar(AvatarUpload {
                filename,
                mime_type: mime_for(path),
                bytes,
            })
            .await?;
        match settings.asset_url(&image) {
            Ok(url) => println!("avatar: {url}"),
            Err(_) => println!("avatar: {image}"),
        }
    }
    if args.remove_avatar && !client.clear_avatar().await? {
        println!("avatar kept");
    }

    let (decision, report) = client.enter_workspace().await;
    if !decision.is_granted() {
        bail!("chat workspace is not available: {decision:?}");
    }
    if let Some(report) = report {
        info!(
            contacts = ?report.contacts,
            channels = ?report.channels,
            "workspace loaded"
        );
    }

    println!("contacts:");
    for contact in client.store().contacts().await {
        println!("  {} {}", contact.id, contact.display_name());
    }
    println!("channels:");
    for channel in client.store().channels().await {
        println!(
            "  {} #{} ({} members)",
            channel.id,
            channel.name,
            channel.member_ids.len()
        );
    }

    if let Some((kind, id)) = &args.open {
        client.select_chat(*kind, id).await?;
        if let Some(header) = client.chat_header().await {
            let avatar = match header.avatar {
                HeaderAvatar::Image(image) => image,
                HeaderAvatar::Initial { letter, .. } => letter.to_string(),
                HeaderAvatar::ChannelGlyph => "#".to_string(),
            };
            println!("open {}: {} [{avatar}]", header.kind, header.title);
        }
    }

    if args.logout {
        client.logout().await;
    }
    Ok(())
}
