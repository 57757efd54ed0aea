use anyhow::Result;
use baste::util::version::built_info::VERSION;
use clap::Parser;
use enum_dispatch::enum_dispatch;
use env_logger::Env;
use log::error;
use std::process::exit;

mod commands;

use commands::{align::Align, command::Command};

#[enum_dispatch(Command)]
#[derive(clap::Subcommand, Debug)]
enum Subcommands {
    Align(Align),
}

#[derive(Parser, Debug)]
#[clap(name = "baste", version = VERSION.as_str(), propagate_version = true, term_width = 0)]
struct Args {
    #[clap(subcommand)]
    subcommand: Subcommands,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(err) = args.subcommand.execute() {
        error!("{:#}", err);
        exit(1);
    }
}
