use std::path::PathBuf;

use clap::Parser;
use upload_queue::settings::session_config::SessionOptions;
use upload_queue::utils::version;

#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
    /// Files to upload, in order
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Upload POST url
    #[arg(short, long, value_name = "URL")]
    pub url: Option<url::Url>,

    /// Prefix of the per-file display ids
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Id of the form reset after each run
    #[arg(long, value_name = "ID")]
    pub form_id: Option<String>,

    /// Id of the progress element
    #[arg(long, value_name = "ID")]
    pub progress_id: Option<String>,

    /// Warn about files larger than this many bytes
    #[arg(short, long, value_name = "BYTES")]
    pub limit: Option<u64>,

    /// Configuration file, instead of config.toml in the config directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Command line flags take precedence over file and environment settings
    pub fn apply(&self, mut options: SessionOptions) -> SessionOptions {
        if let Some(url) = &self.url {
            options.url = url.to_string();
        }
        if let Some(prefix) = &self.prefix {
            options.upload_prefix = prefix.clone();
        }
        if let Some(form_id) = &self.form_id {
            options.form_id = form_id.clone();
        }
        if let Some(progress_id) = &self.progress_id {
            options.progressbar_id = progress_id.clone();
        }
        if let Some(limit) = self.limit {
            options.limit = limit;
        }
        options
    }
}
