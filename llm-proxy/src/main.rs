use args::Args;
use clap::Parser;

mod args;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args.log_filter);

    let config = config::Config::from_env()?;

    server::serve(config).await
}
