// Settings inspection

use anyhow::{Context, Result};
use colored::*;
use std::io::Write;
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::config::Settings;

pub fn handle_config(settings: &Settings, command: ConfigCommands, out: &mut impl Write) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let rendered = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
            writeln!(out, "{}", "# effective settings".dimmed())?;
            write!(out, "{}", rendered)?;
        }
        ConfigCommands::Path => match Settings::config_path() {
            Some(path) => {
                let marker = if path.exists() { "" } else { " (not created yet)" };
                writeln!(out, "{}{}", path.display(), marker.dimmed())?;
            }
            None => writeln!(out, "No configuration directory on this system")?,
        },
        ConfigCommands::Init { force } => match Settings::config_path() {
            Some(path) => init_config(settings, &path, force, out)?,
            None => anyhow::bail!("No configuration directory on this system"),
        },
    }
    Ok(())
}

fn init_config(settings: &Settings, path: &Path, force: bool, out: &mut impl Write) -> Result<()> {
    if path.exists() && !force {
        writeln!(
            out,
            "{} {} already exists (use {} to overwrite)",
            "!".yellow(),
            path.display(),
            "--force".bold()
        )?;
        return Ok(());
    }
    settings.save(path)?;
    writeln!(out, "{} Wrote {}", "✓".green(), path.display())?;
    Ok(())
}
