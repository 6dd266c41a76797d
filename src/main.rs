// src/main.rs

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use allpoetry::{AllPoetry, ClientConfig, Comment, FetchOptions, Poem};

#[derive(Parser)]
#[command(name = "allpoetry")]
#[command(about = "Fetch poems and comments from allpoetry.com", long_about = None)]
struct Cli {
    /// Path to a TOML config file (default: ~/.config/allpoetry/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Username to log in with
    #[arg(short, long, global = true, env = "ALLPOETRY_USERNAME")]
    username: Option<String>,

    /// Password to log in with
    #[arg(short, long, global = true, env = "ALLPOETRY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single poem
    Poem {
        /// URL of the poem
        url: String,

        /// Also fetch the comment threads
        #[arg(long)]
        comments: bool,

        /// Skip reading the author
        #[arg(long)]
        no_author: bool,
    },
    /// List a user's poems as title -> url
    Links {
        /// Whose poems to list
        user: String,

        /// Stop once at least this many poems are known
        #[arg(long)]
        at_least: Option<usize>,
    },
    /// Fetch the comment threads of a poem
    Comments {
        /// URL of the poem
        url: String,
    },
    /// Download a user's profile picture
    Picture {
        user: String,

        /// Where to write the image
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// A poem together with its derived counts.
#[derive(Serialize)]
struct PoemReport<'a> {
    #[serde(flatten)]
    poem: &'a Poem,
    word_count: usize,
    comment_count: usize,
    thread_count: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the JSON, logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if cli.username.is_some() {
        config.username = cli.username;
    }
    if cli.password.is_some() {
        config.password = cli.password;
    }

    let client = AllPoetry::connect(config).await.context("failed to set up session")?;

    match cli.command {
        Commands::Poem {
            url,
            comments,
            no_author,
        } => {
            let options = FetchOptions {
                include_author: client.config().include_author && !no_author,
                include_comments: comments,
            };
            let poem = client
                .fetch_poem_with(&url, options)
                .await
                .with_context(|| format!("failed to fetch poem {url}"))?;
            print_json(&PoemReport {
                poem: &poem,
                word_count: poem.word_count(),
                comment_count: poem.num_comments(),
                thread_count: poem.num_comment_threads(),
            })?;
        }
        Commands::Links { user, at_least } => {
            let links = client
                .collect_poem_links(&user, at_least)
                .await
                .with_context(|| format!("failed to collect poems of {user}"))?;
            print_json(&links)?;
        }
        Commands::Comments { url } => {
            let comments: Vec<Comment> = client
                .fetch_comments(&url, 1)
                .await
                .with_context(|| format!("failed to fetch comments of {url}"))?;
            print_json(&comments)?;
        }
        Commands::Picture { user, output } => {
            let picture = client
                .fetch_user_picture(&user)
                .await
                .with_context(|| format!("failed to fetch picture of {user}"))?;
            std::fs::write(&output, &picture.bytes)
                .with_context(|| format!("failed to write {}", output.display()))?;
            eprintln!("Saved {} ({} bytes)", picture.url, picture.bytes.len());
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
