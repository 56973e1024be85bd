use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use libmirror::constants;
use libmirror::model::IndexConfig;
use libmirror::opts::SyncOpts;
use libmirror::reconcile;
use libmirror::util;

#[tokio::main]
async fn main() {
    let command = Command::new("crates-mirror")
        .version(constants::MIRROR_VERSION)
        .about("Keeps a self-hosted mirror of the crates.io registry in sync with upstream")
        .after_help(
            "Available environment variables: HTTP_PROXY, HTTPS_PROXY, CRATES_DL, CRATES_API",
        )
        .arg(
            Arg::new("index")
                .long("index")
                .short('i')
                .help("Registry index working tree")
                .default_value(constants::DEFAULT_INDEX_DIR)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("crates")
                .long("crates")
                .short('w')
                .help("Directory holding the downloaded crate artifacts")
                .default_value(constants::DEFAULT_CRATES_DIR)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("dbpath")
                .long("dbpath")
                .short('d')
                .help("Catalog database file; a directory gets crates.db appended")
                .default_value(constants::DB_FILENAME)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("logfile")
                .long("logfile")
                .short('f')
                .help("Write logs to this file instead of standard error")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("checkdb")
                .long("checkdb")
                .short('c')
                .help("Repair catalog rows missing for crates the index advertises, then sync")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Debug-level logging")
                .action(ArgAction::SetTrue),
        );

    let matches = command.get_matches();

    let logfile = matches.get_one::<String>("logfile").map(PathBuf::from);
    if let Err(err) = util::logging::init_logging(matches.get_flag("verbose"), logfile.as_deref())
    {
        eprintln!("Could not set up logging: {err}");
        std::process::exit(1);
    }

    let mut opts = SyncOpts::new(
        matches.get_one::<String>("index").expect("has a default"),
        matches.get_one::<String>("crates").expect("has a default"),
    );
    opts.db_path =
        SyncOpts::resolve_db_path(matches.get_one::<String>("dbpath").expect("has a default"));
    opts.check_db = matches.get_flag("checkdb");
    opts.config = config_from_env();

    if let Err(err) = reconcile::sync(&opts).await {
        log::error!("Sync failed: {err}");
        std::process::exit(1);
    }
}

/// Endpoint overrides for the mirrored `config.json`. The amend commit only
/// happens when the operator set at least one of CRATES_DL / CRATES_API;
/// the other field falls back to the crates.io default.
fn config_from_env() -> Option<IndexConfig> {
    let dl = std::env::var("CRATES_DL").ok();
    let api = std::env::var("CRATES_API").ok();
    if dl.is_none() && api.is_none() {
        return None;
    }

    let mut config = IndexConfig::default();
    if let Some(dl) = dl {
        config.dl = dl;
    }
    if let Some(api) = api {
        config.api = api;
    }
    Some(config)
}
