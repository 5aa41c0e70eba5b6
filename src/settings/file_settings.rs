use crate::settings::session_config::SessionOptions;
use crate::utils::get_config_dir;
use color_eyre::eyre;
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

/// Prefix of environment variables overriding file settings, e.g. `UPLOAD_QUEUE_URL`
pub const ENV_PREFIX: &str = "UPLOAD_QUEUE";

const CONFIG_FILE: &str = "config.toml";

/// Load session options from defaults, a config file and the environment.
///
/// An explicitly given file must exist; the default one in the config
/// directory is optional.
pub fn load_options(config_file: Option<PathBuf>) -> eyre::Result<SessionOptions> {
    let (path, required) = match config_file {
        Some(path) => (path, true),
        None => (get_config_dir().join(CONFIG_FILE), false),
    };
    build_options(&path, required, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
}

fn build_options(
    path: &Path,
    required: bool,
    environment: Environment,
) -> eyre::Result<SessionOptions> {
    tracing::debug!("Loading settings from {} (required: {})", path.display(), required);
    let settings = Config::builder()
        .add_source(Config::try_from(&SessionOptions::default())?)
        .add_source(File::from(path).required(required))
        .add_source(environment)
        .build()?;
    Ok(settings.try_deserialize::<SessionOptions>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    fn empty_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(config::Map::new()))
    }

    fn env_with(vars: &[(&str, &str)]) -> Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        Environment::with_prefix(ENV_PREFIX).try_parsing(true).source(Some(map))
    }

    #[test]
    fn test_missing_optional_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let options = build_options(&dir.path().join(CONFIG_FILE), false, empty_env()).unwrap();
        assert_eq!(options, SessionOptions::default());
    }

    #[test]
    fn test_missing_required_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(build_options(&dir.path().join("nope.toml"), true, empty_env()).is_err());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "url = \"http://localhost:8080/upload\"").unwrap();
        writeln!(file, "upload_prefix = \"row_\"").unwrap();

        let options = build_options(&path, true, empty_env()).unwrap();
        assert_eq!(options.url, "http://localhost:8080/upload");
        assert_eq!(options.upload_prefix, "row_");
        assert_eq!(options.form_id, "uploader_form");
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "url = \"http://file/upload\"\nlimit = 10\n").unwrap();

        let options = build_options(
            &path,
            true,
            env_with(&[("UPLOAD_QUEUE_URL", "http://env/upload"), ("UPLOAD_QUEUE_LIMIT", "2048")]),
        )
        .unwrap();
        assert_eq!(options.url, "http://env/upload");
        assert_eq!(options.limit, 2048);
    }
}
