use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Create the first clinic administrator")]
struct Args {
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long)]
    username: String,

    #[arg(long)]
    password: String,

    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    phone: String,

    /// Skip the `.bak` copy of the staff collection.
    #[arg(long)]
    no_backup: bool,
}

fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let admin = seed::NewAdministrator {
        username: args.username,
        password: args.password,
        name: args.name,
        email: args.email,
        phone: args.phone,
    };
    let member = seed::seed_administrator(&args.data_dir, !args.no_backup, admin)?;

    println!("Created administrator {} with id {}", member.credentials.username, member.id);
    Ok(())
}
