use std::path::Path;

use memoir_domain::config::{Config, ConfigSeverity};

/// Print every validation issue. Returns false when any is an error.
pub fn validate(config: &Config, config_path: &Path) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({})", config_path.display());
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!(
        "\n{} error(s), {} warning(s) in {}",
        error_count,
        warning_count,
        config_path.display(),
    );

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("serializing config: {e}"))?;
    print!("{output}");
    Ok(())
}
