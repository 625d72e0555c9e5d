pub mod archive;
pub mod changelog;
pub mod ci_env;
pub mod config;
pub mod history;
pub mod http;
pub mod index;
pub mod metadata;
pub mod ordered;
pub mod paths;
pub mod preview;
pub mod util;
