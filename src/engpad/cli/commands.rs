use super::print::{
    print_config, print_documents, print_full_documents, print_messages, print_notice,
    print_settings,
};
use super::setup::{Cli, Commands};
use clap::Parser;
use directories::ProjectDirs;
use engpad::api::{CmdResult, ConfigAction, ExportFormat, NotepadApi};
use engpad::config::NotepadConfig;
use engpad::error::{NotepadError, Result};
use engpad::logging::{init_logging, LogConfig};
use engpad::session::Session;
use engpad::store::fs::FileStore;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Overrides the platform data directory.
pub const DATA_DIR_ENV: &str = "ENGPAD_DATA";

struct AppContext {
    api: NotepadApi<FileStore>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.verbose {
        log_config.level = Level::DEBUG;
    }
    init_logging(&log_config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let ctx = init_context()?;
    let mut notices = ctx.api.session().subscribe_notices();

    let outcome = match cli.command {
        Some(Commands::New {
            kind,
            language,
            title,
            content,
        }) => handle_new(&ctx, kind, language, title, content).await,
        Some(Commands::List { tag }) => handle_list(&ctx, tag).await,
        Some(Commands::Search { term }) => handle_search(&ctx, term).await,
        Some(Commands::View { ids }) => handle_view(&ctx, ids).await,
        Some(Commands::Edit { id, content }) => handle_edit(&ctx, id, content).await,
        Some(Commands::Rename { id, title }) => handle_rename(&ctx, id, title).await,
        Some(Commands::Tag { id, tags }) => handle_tag(&ctx, id, tags).await,
        Some(Commands::Delete { ids }) => handle_delete(&ctx, ids).await,
        Some(Commands::Export { ids, dir, archive }) => handle_export(&ctx, ids, dir, archive).await,
        Some(Commands::Config { key, value }) => handle_config(&ctx, key, value),
        Some(Commands::Settings { key, value }) => handle_settings(&ctx, key, value).await,
        None => handle_list(&ctx, None).await,
    };

    let flushed = ctx.api.shutdown().await;
    while let Ok(notice) = notices.try_recv() {
        print_notice(&notice);
    }
    outcome.and(flushed)
}

fn init_context() -> Result<AppContext> {
    let data_dir = data_dir()?;
    let config = NotepadConfig::load(&data_dir)?;
    let store = FileStore::new(&data_dir);
    let session = Session::new(store, &config);
    tracing::debug!(data_dir = %data_dir.display(), "opened store");

    Ok(AppContext {
        api: NotepadApi::new(session, data_dir),
    })
}

fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "engpad", "engpad")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| NotepadError::Config("could not determine a data directory".into()))
}

fn read_stdin() -> Result<Option<String>> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }
    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer)?;
    Ok(Some(buffer))
}

fn print_listing(result: &CmdResult) {
    print_documents(&result.listed_documents);
    print_messages(&result.messages);
}

async fn handle_new(
    ctx: &AppContext,
    kind: String,
    language: Option<String>,
    title: Option<String>,
    content: Option<String>,
) -> Result<()> {
    let content = match content {
        Some(content) => Some(content),
        None => read_stdin()?.filter(|s| !s.is_empty()),
    };
    let result = ctx
        .api
        .create_document(&kind, language.as_deref(), title, content)
        .await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_list(ctx: &AppContext, tag: Option<String>) -> Result<()> {
    let result = ctx.api.list_documents(tag.as_deref()).await?;
    print_listing(&result);
    Ok(())
}

async fn handle_search(ctx: &AppContext, term: String) -> Result<()> {
    let result = ctx.api.search_documents(&term).await?;
    print_listing(&result);
    Ok(())
}

async fn handle_view(ctx: &AppContext, ids: Vec<String>) -> Result<()> {
    let result = ctx.api.view_documents(&ids).await?;
    print_full_documents(&result.listed_documents);
    print_messages(&result.messages);
    Ok(())
}

async fn handle_edit(ctx: &AppContext, id: String, content: Option<String>) -> Result<()> {
    let content = match content {
        Some(content) => content,
        None => read_stdin()?.ok_or_else(|| {
            NotepadError::Validation("no content given (pass it as an argument or on stdin)".into())
        })?,
    };
    let result = ctx.api.edit_document(&id, content).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_rename(ctx: &AppContext, id: String, title: Vec<String>) -> Result<()> {
    let result = ctx.api.rename_document(&id, &title.join(" ")).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_tag(ctx: &AppContext, id: String, tags: Vec<String>) -> Result<()> {
    let result = ctx.api.tag_document(&id, &tags).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_delete(ctx: &AppContext, ids: Vec<String>) -> Result<()> {
    let result = ctx.api.delete_documents(&ids).await?;
    print_messages(&result.messages);
    Ok(())
}

async fn handle_export(ctx: &AppContext, ids: Vec<String>, dir: String, archive: bool) -> Result<()> {
    let format = if archive {
        ExportFormat::Archive
    } else {
        ExportFormat::Files
    };
    let result = ctx
        .api
        .export_documents(&ids, Path::new(&dir), format)
        .await?;
    for path in &result.written_paths {
        println!("{}", path.display());
    }
    print_messages(&result.messages);
    Ok(())
}

fn config_action(key: Option<String>, value: Option<String>) -> ConfigAction {
    match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    }
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let show_all = key.is_none();
    let result = ctx.api.config(config_action(key, value))?;
    if show_all {
        if let Some(config) = &result.config {
            print_config(config);
        }
    }
    print_messages(&result.messages);
    Ok(())
}

async fn handle_settings(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let show_all = key.is_none();
    let result = ctx.api.settings(config_action(key, value)).await?;
    if show_all {
        if let Some(settings) = &result.settings {
            print_settings(settings);
        }
    }
    print_messages(&result.messages);
    Ok(())
}
