use clap::Parser;

mod analysis;
mod cli;
mod config;
mod mentions;
mod notes;
mod semantic;
#[cfg(test)]
mod tests;

use config::Config;

fn main() -> anyhow::Result<()> {
    // stdout carries the reports, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("notegraph=info")),
        )
        .with_target(false)
        .init();

    let args = cli::Args::parse();

    let base_path = config::resolve_base_path(args.base_dir)?;
    let mut config = Config::load_with(&base_path)?;
    if let Some(content_dir) = args.content_dir {
        config.content_dir = content_dir;
    }

    match args.command {
        cli::Command::Related(related) => cli::handle_related(related, &config),
        cli::Command::Curate(curate) => cli::handle_curate(curate, &config),
    }
}
