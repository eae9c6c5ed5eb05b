#![forbid(unsafe_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use mdpane_core::{PreviewRenderer, markdown::Extensions};

#[derive(Parser)]
#[command(name = "mdpane-cli", about = "Render markdown the way the mdpane preview does", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the preview HTML document to stdout.
    Html {
        /// Path to a markdown file. Use `-` to read from stdin.
        path: PathBuf,
        /// Print only the converted body fragment, without the styled page.
        #[arg(long)]
        fragment: bool,
        /// Enable tables, strikethrough, task lists and footnotes.
        #[arg(long)]
        gfm: bool,
    },
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        use std::io::Read as _;

        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read markdown from stdin")?;
        return Ok(buf);
    }

    fs::read_to_string(path)
        .with_context(|| format!("failed to read markdown from {}", path.display()))
}

const fn extensions(gfm: bool) -> Extensions {
    if gfm {
        Extensions::all()
    } else {
        Extensions::none()
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Html {
            path,
            fragment,
            gfm,
        } => {
            let source = read_source(&path)?;
            let preview = PreviewRenderer::new(extensions(gfm)).render(&source);
            tracing::debug!(bytes = source.len(), fragment, "rendered html");
            if fragment {
                print!("{}", preview.fragment());
            } else {
                print!("{}", preview.html());
            }
        }
    }

    Ok(())
}
