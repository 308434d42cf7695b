use anyhow::Result;
use clap::Parser;
use std::path::Path;
use uuid::Uuid;

use farmassist::advisor::{Advisor, FetchState, SuggestionsFetch};
use farmassist::chat::ChatSession;
use farmassist::cli::{self, Command, ProfileCommand};
use farmassist::config::Config;
use farmassist::image::{self, ImageAttachment};
use farmassist::log::{self, ExchangeRecorder};
use farmassist::profile::FarmProfile;
use farmassist::provider;
use farmassist::store::{ProfileStore, SqliteProfileStore};
use farmassist::ux;

const CHAT_HELP: &str = "Commands: /image <path> attaches a photo, /clear-image drops it, /quit leaves.";

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = cli::Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = Config::load(args.config.as_deref())?;
    cfg.apply_args(&args);
    tracing::debug!(?cfg, "configuration loaded");

    let store = SqliteProfileStore::open(&cfg.profile_db())?;

    match args.command {
        Command::Profile(ProfileCommand::Set(fields)) => {
            let profile = FarmProfile::from(fields);
            store.set(&profile)?;
            println!("Farm profile saved.");
            ux::show_profile(&profile);
        }
        Command::Profile(ProfileCommand::Show) => match store.get()? {
            Some(profile) => ux::show_profile(&profile),
            None => println!("No farm profile yet. Save one with `farmassist profile set`."),
        },
        Command::Suggest => {
            let advisor = build_advisor(&cfg, store, args.debug)?;
            run_suggest(&advisor, args.progress).await?;
        }
        Command::Chat { question, image: photo } => {
            let advisor = build_advisor(&cfg, store, args.debug)?;
            match (question, photo) {
                (None, None) => run_chat_repl(&advisor, &cfg, args.progress).await?,
                (question, photo) => {
                    // Validate the photo before anything goes out.
                    let attachment = photo
                        .map(|p| image::load_image(&p, cfg.max_image_bytes))
                        .transpose()?;
                    let mut session = ChatSession::new();
                    ask(&advisor, &mut session, question.as_deref().unwrap_or(""), attachment, args.progress).await?;
                }
            }
        }
    }

    Ok(())
}

fn build_advisor(cfg: &Config, store: SqliteProfileStore, debug: bool) -> Result<Advisor> {
    let prov = provider::make_provider(cfg)?;
    let mut advisor = Advisor::new(prov, Box::new(store));
    if cfg.save_exchanges {
        let recorder = ExchangeRecorder::new(&cfg.artifacts_dir, Uuid::new_v4());
        if debug {
            println!("debug: exchanges will be saved under {}", recorder.dir().display());
        }
        advisor = advisor.with_recorder(recorder);
    }
    Ok(advisor)
}

async fn run_suggest(advisor: &Advisor, progress: bool) -> Result<()> {
    if advisor.personal_profile()?.is_none() {
        ux::error("Please input your farm data first: `farmassist profile set --help`");
        return Ok(());
    }

    let mut fetch = SuggestionsFetch::new();
    loop {
        let pb = ux::spinner(&format!("Asking {} for crop suggestions…", advisor.provider_name()), progress);
        advisor.fetch_suggestions(&mut fetch).await?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        match fetch.state() {
            FetchState::Success(list) => {
                ux::show_suggestions(list);
                break;
            }
            FetchState::Error(msg) => {
                ux::error(msg);
                if !ux::confirm("Try again?") {
                    break;
                }
            }
            FetchState::Idle | FetchState::Loading => break,
        }
    }
    Ok(())
}

async fn ask(
    advisor: &Advisor,
    session: &mut ChatSession,
    text: &str,
    image: Option<ImageAttachment>,
    progress: bool,
) -> Result<()> {
    let turn = session.submit(text, image)?;
    if let Some(user_msg) = session.messages().iter().find(|m| m.id == turn.id && !m.is_bot) {
        ux::show_message(user_msg);
    }

    let pb = ux::spinner("Thinking…", progress);
    let reply = advisor.chat_reply(&turn.question, turn.image_url.as_deref()).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let bot_msg = session.resolve(turn.id, reply)?;
    ux::show_message(bot_msg);
    Ok(())
}

async fn run_chat_repl(advisor: &Advisor, cfg: &Config, progress: bool) -> Result<()> {
    let mut session = ChatSession::new();
    for m in session.messages() {
        ux::show_message(m);
    }
    println!("{CHAT_HELP}");

    let mut attachment: Option<ImageAttachment> = None;
    while let Some(line) = ux::read_line("> ") {
        let line = line.trim();
        match line {
            "/quit" | "/exit" => break,
            "/help" => println!("{CHAT_HELP}"),
            "/clear-image" => {
                attachment = None;
                println!("Photo removed.");
            }
            _ if line.starts_with("/image") => {
                let path = line.trim_start_matches("/image").trim();
                match image::load_image(Path::new(path), cfg.max_image_bytes) {
                    Ok(img) => {
                        println!("Photo attached ({} bytes). It will be sent with your next question.", img.bytes);
                        attachment = Some(img);
                    }
                    Err(e) => ux::error(&e.to_string()),
                }
            }
            _ => {
                if line.is_empty() && attachment.is_none() {
                    continue;
                }
                if let Err(e) = ask(advisor, &mut session, line, attachment.take(), progress).await {
                    ux::error(&format!("{e:#}"));
                }
            }
        }
    }
    Ok(())
}
