use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use spool::error::Result;
use spool::{init_logging, Db, Timeout};

/// Inspect and modify spool queues.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a config file to load.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Store directory; overrides the config file.
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append items to a queue.
    Put { queue: String, items: Vec<String> },
    /// Remove items from a queue and print them, one per line.
    Take {
        queue: String,
        #[arg(short, default_value_t = 1)]
        n: usize,
        /// Milliseconds to wait for items; waits forever if omitted.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Print the number of items in a queue.
    Len { queue: String },
    /// Delete every item in a queue.
    Clear { queue: String },
    /// Delete the whole store.
    Destroy,
}

fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();
    let mut config = spool::config::load_config(args.config)?;
    if let Some(db) = args.db {
        config.db_dir = db;
    }

    if let Command::Destroy = args.command {
        Db::destroy(&config.db_dir)?;
        info!("destroyed {}", config.db_dir.display());
        return Ok(());
    }

    let db = Db::open_with(&config)?;
    match args.command {
        Command::Put { queue, items } => {
            let ids = db.bucket(&queue)?.put_all(&items)?;
            info!("put {} items into {} (ids {:?})", items.len(), queue, ids);
        },
        Command::Take { queue, n, timeout_ms } => {
            let timeout: Timeout = timeout_ms.map(Duration::from_millis).into();
            for item in db.bucket(&queue)?.take(n, timeout)? {
                println!("{}", String::from_utf8_lossy(item.value()));
            }
        },
        Command::Len { queue } => {
            println!("{}", db.bucket(&queue)?.len());
        },
        Command::Clear { queue } => {
            db.bucket(&queue)?.clear()?;
            info!("cleared {}", queue);
        },
        Command::Destroy => {},
    }
    db.close();

    Ok(())
}
