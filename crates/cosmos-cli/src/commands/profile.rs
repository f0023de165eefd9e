//! Profile command implementation.

use crate::cli::{ProfileAction, ProfileArgs};
use crate::config::{Config, Profile};
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the profile command.
pub fn execute_profile(
    args: ProfileArgs,
    config: &mut Config,
    formatter: &Formatter,
) -> Result<String> {
    match args.action {
        ProfileAction::List => Ok(list_profiles(config, formatter)),
        ProfileAction::Show => show_active_profile(config, formatter),
        ProfileAction::Switch { name } => switch_profile(config, name, formatter),
        ProfileAction::Set {
            name,
            url,
            chain_id,
        } => set_profile(config, name, url, chain_id, formatter),
        ProfileAction::Delete { name } => delete_profile(config, name, formatter),
    }
}

fn list_profiles(config: &Config, formatter: &Formatter) -> String {
    if config.profiles.is_empty() {
        return formatter.info("No profiles configured");
    }

    let mut lines = vec!["Available profiles:".to_string()];
    for (name, profile) in &config.profiles {
        if name == &config.active_profile {
            lines.push(format!("* {}", formatter.success(name)));
        } else {
            lines.push(format!("  {}", name));
        }
        lines.push(format!("    URL: {}", profile.grpc_url));
        if let Some(chain_id) = &profile.chain_id {
            lines.push(format!("    Chain: {}", chain_id));
        }
    }
    lines.join("\n")
}

fn show_active_profile(config: &Config, formatter: &Formatter) -> Result<String> {
    let profile = config.get_active_profile()?;

    let mut lines = vec![
        format!("Active profile: {}", formatter.success(&config.active_profile)),
        format!("  URL: {}", profile.grpc_url),
    ];
    if let Some(chain_id) = &profile.chain_id {
        lines.push(format!("  Chain: {}", chain_id));
    }
    Ok(lines.join("\n"))
}

fn switch_profile(config: &mut Config, name: String, formatter: &Formatter) -> Result<String> {
    config.switch_profile(name.clone())?;
    config.save()?;
    Ok(formatter.success(&format!("Switched to profile '{}'", name)))
}

fn set_profile(
    config: &mut Config,
    name: String,
    grpc_url: String,
    chain_id: Option<String>,
    formatter: &Formatter,
) -> Result<String> {
    let action = if config.profiles.contains_key(&name) {
        "Updated"
    } else {
        "Created"
    };

    config.set_profile(name.clone(), Profile { grpc_url, chain_id });
    config.save()?;
    Ok(formatter.success(&format!("{} profile '{}'", action, name)))
}

fn delete_profile(config: &mut Config, name: String, formatter: &Formatter) -> Result<String> {
    if name == config.active_profile {
        return Err(CliError::NotPermitted(
            "Cannot delete the active profile".to_string(),
        ));
    }

    if config.profiles.remove(&name).is_some() {
        config.save()?;
        Ok(formatter.success(&format!("Deleted profile '{}'", name)))
    } else {
        Ok(formatter.warning(&format!("Profile '{}' does not exist", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("config.toml")).unwrap();
        (dir, config)
    }

    #[test]
    fn test_set_and_switch_profile() {
        let (dir, mut config) = temp_config();
        let formatter = Formatter::new(OutputFormat::Table, false);

        let msg = set_profile(
            &mut config,
            "local".to_string(),
            "http://127.0.0.1:9090".to_string(),
            Some("testing".to_string()),
            &formatter,
        )
        .unwrap();
        assert_eq!(msg, "✓ Created profile 'local'");

        switch_profile(&mut config, "local".to_string(), &formatter).unwrap();
        assert_eq!(config.active_profile, "local");

        let reloaded = Config::load_from(dir.path().join("config.toml")).unwrap();
        assert_eq!(reloaded.active_profile, "local");
        assert_eq!(reloaded.profiles["local"].chain_id.as_deref(), Some("testing"));
    }

    #[test]
    fn test_update_existing_profile() {
        let (_dir, mut config) = temp_config();
        let formatter = Formatter::new(OutputFormat::Table, false);

        let msg = set_profile(
            &mut config,
            "default".to_string(),
            "http://node:9090".to_string(),
            None,
            &formatter,
        )
        .unwrap();
        assert!(msg.contains("Updated"));
        assert_eq!(config.get_active_profile().unwrap().grpc_url, "http://node:9090");
    }

    #[test]
    fn test_delete_active_profile() {
        let (_dir, mut config) = temp_config();
        let formatter = Formatter::new(OutputFormat::Table, false);

        let result = delete_profile(&mut config, "default".to_string(), &formatter);
        assert!(matches!(result, Err(CliError::NotPermitted(_))));
    }

    #[test]
    fn test_delete_missing_profile_warns() {
        let (_dir, mut config) = temp_config();
        let formatter = Formatter::new(OutputFormat::Table, false);

        let msg = delete_profile(&mut config, "ghost".to_string(), &formatter).unwrap();
        assert!(msg.contains("does not exist"));
    }

    #[test]
    fn test_list_marks_active() {
        let (_dir, config) = temp_config();
        let formatter = Formatter::new(OutputFormat::Table, false);

        let output = list_profiles(&config, &formatter);
        assert!(output.contains("* ✓ default"));
        assert!(output.contains("http://localhost:9090"));
    }
}
