use anyhow::{Context, Result};
use clap::Parser;

use touchtest::options::Options;

fn main() -> Result<()> {
    let options = Options::parse();

    let default_filter = if options.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    touchtest::app::run(&options).context("touch test failed")
}
