use std::{path::Path, sync::LazyLock};

use anyhow::{Context, bail};
use regex::Regex;

use crate::Config;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*env\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("the env var pattern is valid")
});

/// Load and parse the configuration file, expanding `{{ env.NAME }}`
/// references from the process environment first.
pub(crate) fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;

    let expanded = expand_env(&raw)?;

    let config: Config = toml::from_str(&expanded)
        .with_context(|| format!("failed to parse configuration in {}", path.display()))?;

    config.routes.validate()?;

    Ok(config)
}

fn expand_env(raw: &str) -> anyhow::Result<String> {
    let mut expanded = String::with_capacity(raw.len());
    let mut last_match = 0;

    for captures in ENV_VAR.captures_iter(raw) {
        let placeholder = captures.get(0).expect("capture group zero is the whole match");
        let name = &captures[1];

        let Ok(value) = std::env::var(name) else {
            bail!("environment variable {name} referenced in the configuration is not set");
        };

        expanded.push_str(&raw[last_match..placeholder.start()]);
        expanded.push_str(&value);
        last_match = placeholder.end();
    }

    expanded.push_str(&raw[last_match..]);

    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::expand_env;
    use crate::Config;

    #[test]
    fn expands_env_references() {
        // Set via unsafe in edition 2024; fine in a single-threaded test binary section.
        unsafe { std::env::set_var("ATRIUM_TEST_SECRET", "hunter2") };

        let raw = indoc! {r#"
            [session]
            secret = "{{ env.ATRIUM_TEST_SECRET }}"
        "#};

        let expanded = expand_env(raw).unwrap();
        let config: Config = toml::from_str(&expanded).unwrap();

        assert_eq!(Some("hunter2"), config.session.secret.as_deref());
    }

    #[test]
    fn missing_env_var_names_the_variable() {
        let raw = r#"secret = "{{ env.ATRIUM_TEST_UNSET_VARIABLE }}""#;

        let error = expand_env(raw).unwrap_err();
        assert!(error.to_string().contains("ATRIUM_TEST_UNSET_VARIABLE"));
    }

    #[test]
    fn text_without_references_is_untouched() {
        let raw = r#"cookie_name = "atrium_session""#;
        assert_eq!(raw, expand_env(raw).unwrap());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atrium.toml");

        std::fs::write(
            &path,
            indoc! {r#"
                [server]
                listen_address = "127.0.0.1:6100"

                [server.rate_limits]
                enabled = true
            "#},
        )
        .unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(Some("127.0.0.1:6100".parse().unwrap()), config.server.listen_address);
        assert!(config.server.rate_limits.enabled);
    }

    #[test]
    fn load_rejects_unusable_redirect_targets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atrium.toml");

        std::fs::write(
            &path,
            indoc! {r#"
                [routes]
                dashboard_path = "dashboard"
            "#},
        )
        .unwrap();

        let error = Config::load(&path).unwrap_err();
        assert!(error.to_string().contains("dashboard_path"));
    }
}
