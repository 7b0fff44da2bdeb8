use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptub::cli::OutputFormat;
use promptub::cli::commands::{account, comment, config, feed, init, interact, points, prompt, status};
use promptub::constants::content::SUGGESTION_LIMIT;
use promptub::services::{FeedQuery, FeedSort};

#[derive(Parser)]
#[command(name = "promptub")]
#[command(version, about = "Share, discover and discuss AI prompts, powered by a points economy")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(clap::Args)]
struct FormatArg {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format"
    )]
    format: OutputFormat,
}

#[derive(clap::Args)]
struct PromptFieldArgs {
    #[arg(long, help = "Content; '-' or omitted on post reads stdin")]
    content: Option<String>,
    #[arg(long, short, help = "Short description")]
    description: Option<String>,
    #[arg(long, short, help = "Category key (see 'promptub facets')")]
    category: Option<String>,
    #[arg(long, short, help = "AI model key")]
    model: Option<String>,
    #[arg(long, short, help = "Comma-separated tags")]
    tags: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a community in the current directory
    Init {
        #[arg(long, short, help = "Re-run initialization")]
        force: bool,
    },

    /// Create an account
    Register {
        username: String,
        #[arg(long, env = "PROMPTUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log in and save the session
    Login {
        username: String,
        #[arg(long, env = "PROMPTUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the saved session
    Logout,

    /// Show the logged-in user
    Whoami {
        #[command(flatten)]
        format: FormatArg,
    },

    /// Change your password
    Passwd {
        #[arg(long)]
        current: Option<String>,
        #[arg(long)]
        new: Option<String>,
    },

    /// Publish a prompt
    Post {
        #[arg(long)]
        title: String,
        #[command(flatten)]
        fields: PromptFieldArgs,
    },

    /// Edit one of your prompts
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: PromptFieldArgs,
    },

    /// Hide one of your prompts from the feed
    Archive {
        id: String,
        #[arg(long, help = "Put an archived prompt back in the feed")]
        restore: bool,
    },

    /// Delete one of your prompts
    Delete { id: String },

    /// Open a prompt's detail page (uses a free view or points)
    Show {
        id: String,
        #[command(flatten)]
        format: FormatArg,
    },

    /// Browse published prompts
    Feed {
        #[arg(long, short, help = "Search title, content, description, tags and category")]
        search: Option<String>,
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short)]
        model: Option<String>,
        #[arg(long, value_enum, default_value_t = FeedSort::Recent)]
        sort: FeedSort,
        #[arg(long, short, default_value = "1")]
        page: usize,
        #[arg(long)]
        per_page: Option<usize>,
        #[command(flatten)]
        format: FormatArg,
    },

    /// Categories and AI models in use
    Facets {
        #[command(flatten)]
        format: FormatArg,
    },

    /// Search suggestions from titles and tags
    Suggest {
        query: String,
        #[arg(short = 'n', long, default_value_t = SUGGESTION_LIMIT)]
        limit: usize,
        #[command(flatten)]
        format: FormatArg,
    },

    /// Like or unlike a prompt
    Like { id: String },

    /// Bookmark or unbookmark a prompt
    Bookmark { id: String },

    /// Share a prompt (guests allowed)
    Share { id: String },

    /// List your bookmarks
    Bookmarks {
        #[command(flatten)]
        format: FormatArg,
    },

    /// Comment on a prompt
    Comment { prompt: String, text: String },

    /// Reply to a comment
    Reply { comment: String, text: String },

    /// Delete one of your comments
    Uncomment { comment: String },

    /// Like or unlike a comment
    CommentLike { comment: String },

    /// Show a prompt's comments
    Comments {
        prompt: String,
        #[arg(long, help = "Newest first without threading")]
        flat: bool,
        #[command(flatten)]
        format: FormatArg,
    },

    /// Points balance, history and ledger audit
    Points {
        #[command(subcommand)]
        action: PointsAction,
    },

    /// Top members by points
    Leaderboard {
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        #[command(flatten)]
        format: FormatArg,
    },

    /// Show a member profile (yours without a name)
    Profile {
        username: Option<String>,
        #[command(flatten)]
        format: FormatArg,
    },

    /// Ban a member, or lift a ban
    Ban {
        username: String,
        #[arg(long, help = "Reinstate a banned member")]
        lift: bool,
    },

    /// Recompute prompt counters from the ledgers
    Resync,

    /// Show community status
    Status {
        #[command(flatten)]
        format: FormatArg,
        #[arg(short = 'd', long, help = "Show detailed information")]
        detailed: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum PointsAction {
    /// Current balance, level and today's allowances
    Balance {
        #[command(flatten)]
        format: FormatArg,
    },
    /// Recent ledger entries
    History {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        #[command(flatten)]
        format: FormatArg,
    },
    /// Compare balances with the ledger
    Audit {
        #[arg(long, help = "Reset mismatched balances to the ledger sum")]
        repair: bool,
        #[command(flatten)]
        format: FormatArg,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[command(flatten)]
        format: FormatArg,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config with the defaults")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mpromptub encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            if let Some(hub) = e.downcast_ref::<promptub::HubError>() {
                match hub.category() {
                    promptub::ErrorCategory::Auth if hub.requires_login() => {
                        eprintln!("Run 'promptub login <username>' to continue.");
                    }
                    promptub::ErrorCategory::Economy => {
                        eprintln!("Earn points by posting, commenting or sharing prompts.");
                    }
                    _ => {}
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { force } => init::run(force)?,
        Commands::Register { username, password } => account::register(&username, password)?,
        Commands::Login { username, password } => account::login(&username, password)?,
        Commands::Logout => account::logout()?,
        Commands::Whoami { format } => account::whoami(format.format)?,
        Commands::Passwd { current, new } => account::passwd(current, new)?,
        Commands::Post { title, fields } => prompt::post(prompt_fields(Some(title), fields))?,
        Commands::Edit { id, title, fields } => prompt::edit(&id, prompt_fields(title, fields))?,
        Commands::Archive { id, restore } => prompt::archive(&id, restore)?,
        Commands::Delete { id } => prompt::delete(&id)?,
        Commands::Show { id, format } => prompt::show(&id, format.format)?,
        Commands::Feed {
            search,
            category,
            model,
            sort,
            page,
            per_page,
            format,
        } => {
            feed::feed(
                FeedQuery {
                    category,
                    ai_model: model,
                    search,
                    sort,
                    page,
                    per_page,
                },
                format.format,
            )?;
        }
        Commands::Facets { format } => feed::facets(format.format)?,
        Commands::Suggest {
            query,
            limit,
            format,
        } => feed::suggest(&query, limit, format.format)?,
        Commands::Like { id } => interact::like(&id)?,
        Commands::Bookmark { id } => interact::bookmark(&id)?,
        Commands::Share { id } => interact::share(&id)?,
        Commands::Bookmarks { format } => feed::bookmarks(format.format)?,
        Commands::Comment { prompt, text } => comment::comment(&prompt, &text)?,
        Commands::Reply { comment, text } => comment::reply(&comment, &text)?,
        Commands::Uncomment { comment } => comment::uncomment(&comment)?,
        Commands::CommentLike { comment } => comment::like(&comment)?,
        Commands::Comments {
            prompt,
            flat,
            format,
        } => comment::list(&prompt, flat, format.format)?,
        Commands::Points { action } => match action {
            PointsAction::Balance { format } => points::balance(format.format)?,
            PointsAction::History { limit, format } => points::history(limit, format.format)?,
            PointsAction::Audit { repair, format } => points::audit(repair, format.format)?,
        },
        Commands::Leaderboard { limit, format } => points::leaderboard(limit, format.format)?,
        Commands::Profile { username, format } => {
            points::profile(username.as_deref(), format.format)?
        }
        Commands::Ban { username, lift } => account::ban(&username, lift)?,
        Commands::Resync => status::resync()?,
        Commands::Status { format, detailed } => status::run(format.format, detailed)?,
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => config::show(global, format.format)?,
            ConfigAction::Path => config::path()?,
            ConfigAction::Init { global, force } => {
                if global {
                    config::init_global(force)?;
                } else {
                    config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}

fn prompt_fields(title: Option<String>, args: PromptFieldArgs) -> prompt::PromptFields {
    prompt::PromptFields {
        title,
        content: args.content,
        description: args.description,
        category: args.category,
        ai_model: args.model,
        tags: args.tags,
    }
}
