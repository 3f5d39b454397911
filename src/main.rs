use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use lumina::compositor;
use lumina::config::EditorConfig;
use lumina::export::{self, ExportFormat};
use lumina::session::{Command, Session};

const USAGE: &str = "usage: lumina <input-image> [commands.json] [output]";

fn read_script(path: &Path) -> Result<Vec<Command>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read failed for {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid command script {}", path.display()))
}

fn replay(session: &mut Session, commands: Vec<Command>) -> usize {
    let mut ignored = 0;
    for (index, command) in commands.into_iter().enumerate() {
        let summary = format!("{command:?}");
        if !session.dispatch(command) {
            warn!(index, command = %summary, "command ignored");
            ignored += 1;
        }
    }
    ignored
}

fn resolve_output(config: &EditorConfig, requested: Option<PathBuf>) -> Result<(PathBuf, ExportFormat)> {
    if let Some(path) = requested {
        let format = ExportFormat::from_path(&path).unwrap_or(config.export_format);
        return Ok((path, format));
    }
    let dir = std::env::current_dir().context("current directory unavailable")?;
    let format = config.export_format;
    Ok((export::build_output_path(&dir, &config.output_stem, format), format))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args();
    let _bin = args.next();
    let input = args.next().map(PathBuf::from).context(USAGE)?;
    let script = args.next().map(PathBuf::from);
    let output = args.next().map(PathBuf::from);

    let config = EditorConfig::load();
    let mut session = Session::with_tools(config.brush(), config.text_draft());

    let bytes = std::fs::read(&input).with_context(|| format!("read failed for {}", input.display()))?;
    session
        .load_image(&bytes)
        .with_context(|| format!("decode failed for {}", input.display()))?;

    if let Some(script) = script {
        let commands = read_script(&script)?;
        let total = commands.len();
        let ignored = replay(&mut session, commands);
        info!(total, ignored, "command script replayed");
    }

    let rendered = compositor::render(&session).context("no image loaded")?;
    let (path, format) = resolve_output(&config, output)?;
    let options = export::ExportOptions {
        format,
        ..config.export_options()
    };
    export::write(&rendered, &path, &options)
        .with_context(|| format!("export failed for {}", path.display()))?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_output_picks_format_from_extension() {
        let config = EditorConfig::default();
        let (path, format) = resolve_output(&config, Some(PathBuf::from("out/final.jpg"))).unwrap();
        assert_eq!(path, PathBuf::from("out/final.jpg"));
        assert_eq!(format, ExportFormat::Jpg);

        let (_, fallback) = resolve_output(&config, Some(PathBuf::from("final.bin"))).unwrap();
        assert_eq!(fallback, ExportFormat::Png);
    }

    #[test]
    fn default_output_uses_config_stem() {
        let config = EditorConfig {
            output_stem: "edited-probe".into(),
            export_format: ExportFormat::Webp,
            ..EditorConfig::default()
        };
        let (path, format) = resolve_output(&config, None).unwrap();
        assert_eq!(format, ExportFormat::Webp);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("edited-probe") && name.ends_with(".webp"), "{name}");
    }

    #[test]
    fn replay_counts_ignored_commands() {
        let mut session = Session::new();
        let commands: Vec<Command> =
            serde_json::from_str(r#"[{"type": "set_mode", "mode": "paint"}, {"type": "reset_filters"}]"#)
                .unwrap();
        // no image: the mode switch is ignored, the reset is not
        assert_eq!(replay(&mut session, commands), 1);
    }
}
