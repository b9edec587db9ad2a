//! Text Inserter
//!
//! Command-line front end over a file-backed store and local HTML pages.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use text_inserter::insertion::InsertionOutcome;
use text_inserter::messaging::{Coordinator, Request, TabId};
use text_inserter::storage::{FileStore, StorageService};
use text_inserter::tabs::TabRegistry;
use text_inserter::{ConfigLoader, InserterConfig, InserterError, NAME, Result, VERSION};

#[derive(Parser)]
#[command(name = "text-inserter", version, about = "Save input fields and insert text snippets into them")]
struct Args {
    /// Config file; defaults to ./text-inserter.yaml, then ~/.text-inserter/config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store file, overriding the configured one
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Save the input field matched by a CSS selector
    Select {
        /// HTML file of the page
        #[arg(long)]
        page: PathBuf,
        /// URL the page was loaded from
        #[arg(long)]
        url: String,
        /// CSS selector of the element to click
        #[arg(long)]
        target: String,
    },
    /// Insert text into the saved field of a page
    Insert {
        #[arg(long)]
        page: PathBuf,
        #[arg(long)]
        url: String,
        /// Literal text to insert
        #[arg(long, conflicts_with = "snippet", required_unless_present = "snippet")]
        text: Option<String>,
        /// Id of a saved text to insert
        #[arg(long)]
        snippet: Option<String>,
    },
    /// Manage saved texts
    Texts {
        #[command(subcommand)]
        action: TextsAction,
    },
    /// Manage saved elements
    Selectors {
        #[command(subcommand)]
        action: SelectorsAction,
    },
}

#[derive(Subcommand)]
enum TextsAction {
    Add { content: String },
    Edit { id: String, content: String },
    Delete { id: String },
    List,
}

#[derive(Subcommand)]
enum SelectorsAction {
    List {
        #[arg(long)]
        host: String,
    },
    Delete {
        #[arg(long)]
        host: String,
        id: String,
    },
    Clear {
        #[arg(long)]
        host: String,
    },
}

struct Browser {
    tabs: Arc<TabRegistry>,
    coordinator: Coordinator,
}

impl Browser {
    fn new(storage: StorageService, config: InserterConfig) -> Self {
        let tabs = Arc::new(TabRegistry::new(storage.clone(), config));
        let coordinator = Coordinator::new(storage, tabs.clone(), tabs.clone());
        Self {
            tabs,
            coordinator,
        }
    }

    async fn open(&self, page: &Path, url: &str) -> Result<TabId> {
        let html = tokio::fs::read_to_string(page).await?;
        self.tabs.open_tab(url, &html).await
    }

    /// Message of the tab's notification; the element is dismissed once read
    async fn notification(&self, tab: TabId) -> Result<Option<String>> {
        self.tabs
            .with_agent(tab, |agent| {
                agent.dismiss_notification();
                agent.last_notification().map(|n| n.message.clone())
            })
            .await
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{NAME} v{VERSION}: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path).await?,
        None => ConfigLoader::load_default().await?,
    };
    if let Some(store) = args.store {
        config.store_path = store;
    }
    log::debug!("using store {}", config.store_path.display());
    let storage = StorageService::new(Arc::new(FileStore::new(config.store_path.clone())));

    match args.command {
        Command::Select { page, url, target } => {
            let browser = Browser::new(storage, config);
            let tab = browser.open(&page, &url).await?;
            let response = browser.coordinator.handle(Request::StartSelection, None).await;
            if !response.is_ok() {
                return Err(InserterError::Other(response.message.unwrap_or_default()));
            }

            let node = browser
                .tabs
                .with_document(tab, |doc| doc.query_selector(&target))
                .await??
                .ok_or_else(|| InserterError::Other(format!("no element matches '{target}'")))?;
            browser.tabs.click(tab, node, &browser.coordinator).await?;
            if let Some(message) = browser.notification(tab).await? {
                println!("{message}");
            }
        }
        Command::Insert {
            page,
            url,
            text,
            snippet,
        } => {
            let text = match (text, snippet) {
                (Some(text), _) => text,
                (None, Some(id)) => storage
                    .get_texts()
                    .await?
                    .into_iter()
                    .find(|t| t.id == id)
                    .map(|t| t.content)
                    .ok_or_else(|| InserterError::Other(format!("no text with id {id}")))?,
                (None, None) => return Err(InserterError::Other("nothing to insert".into())),
            };

            let browser = Browser::new(storage, config);
            let tab = browser.open(&page, &url).await?;
            let response = browser.coordinator.handle(Request::InsertText { text }, None).await;
            if !response.is_ok() {
                return Err(InserterError::Other(response.message.unwrap_or_default()));
            }
            if let Some(message) = browser.notification(tab).await? {
                println!("{message}");
            }
            let written = browser
                .tabs
                .with_agent(tab, |agent| match agent.last_insertion() {
                    Some(InsertionOutcome::Inserted { target, .. }) => {
                        let doc = agent.document();
                        Some(doc.value(*target).map(str::to_string).unwrap_or_else(|| doc.text_content(*target)))
                    }
                    _ => None,
                })
                .await?;
            if let Some(value) = written {
                println!("{value}");
            }
        }
        Command::Texts { action } => match action {
            TextsAction::Add { content } => {
                let texts = storage.save_text(&content, None).await?;
                if let Some(added) = texts.last() {
                    println!("{}", added.id);
                }
            }
            TextsAction::Edit { id, content } => {
                storage.save_text(&content, Some(&id)).await?;
            }
            TextsAction::Delete { id } => {
                storage.delete_text(&id).await?;
            }
            TextsAction::List => {
                for text in storage.get_texts().await? {
                    println!("{}\t{}", text.id, text.content);
                }
            }
        },
        Command::Selectors { action } => match action {
            SelectorsAction::List { host } => {
                let bucket = storage.selectors_for_host(&host).await?;
                for (index, record) in bucket.records().iter().enumerate() {
                    println!(
                        "{}\t{}\t{}\t{}",
                        index + 1,
                        record.id,
                        record.xpath.as_deref().unwrap_or("-"),
                        record.css.as_deref().unwrap_or("-")
                    );
                }
            }
            SelectorsAction::Delete { host, id } => {
                let remaining = storage.delete_selector(&host, &id).await?;
                println!("{} elements left for {host}", remaining.len());
            }
            SelectorsAction::Clear { host } => {
                storage.clear_all_selectors(&host).await?;
            }
        },
    }
    Ok(())
}
