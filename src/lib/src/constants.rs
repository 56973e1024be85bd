// Filenames and dirs
pub const DEFAULT_INDEX_DIR: &str = "/srv/git/index";
pub const DEFAULT_CRATES_DIR: &str = "/srv/www/crates";
pub const DB_FILENAME: &str = "crates.db";
pub const INDEX_CONFIG_FILENAME: &str = "config.json";
pub const GIT_HIDDEN_DIR: &str = ".git";

// Git
pub const DEFAULT_BRANCH_NAME: &str = "master";
pub const DEFAULT_ORIGIN_NAME: &str = "origin";
pub const INDEX_UPSTREAM_URL: &str = "https://github.com/rust-lang/crates.io-index";
pub const CONFIG_COMMIT_MESSAGE: &str = "point to local server";
pub const MIRROR_COMMITTER_NAME: &str = "crates-mirror";
pub const MIRROR_COMMITTER_EMAIL: &str = "crates-mirror@localhost";

// Upstream endpoints
pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://crates.io/api/v1/crates/{name}/{version}/download";
pub const DEFAULT_API_URL: &str = "https://crates.io";
pub const DEFAULT_DL_URL: &str = "https://crates.io/api/v1/crates";

// Networking
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("crates-mirror/", env!("CARGO_PKG_VERSION"));

// Worker pool: workers per CPU for the artifact download pool
pub const WORKERS_PER_CPU: usize = 3;

pub const MIRROR_VERSION: &str = env!("CARGO_PKG_VERSION");
