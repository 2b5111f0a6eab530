//! Overlay Inspect - Entry point
//!
//! Loads a settings manifest, runs every declared source in order and prints
//! the resolved key/value map.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use overlay::config::{OverlaySettings, SettingsLoader};
use overlay::{log_config, ConfigResult, DebugOverlay, LoadReport, SourceOutcome};
use tracing::{error, info};

const DEFAULT_MANIFEST: &str = "overlay.toml";
const ENV_PREFIX: &str = "OVERLAY";

/// Command-line arguments.
struct Args {
    /// Path to the settings manifest.
    config: Option<PathBuf>,
    /// Print values as a JSON object.
    json: bool,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;
        let mut json = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--json" => {
                    json = true;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("overlay-inspect {}", env!("CARGO_PKG_VERSION"));
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config, json }
    }
}

fn print_help() {
    println!(
        r"Overlay Inspect - Resolve debug overlay configuration

USAGE:
    overlay-inspect [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Settings manifest (TOML or JSON, default: overlay.toml)
        --json             Print resolved values as a JSON object
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    OVERLAY__REMOTE__TIMEOUT_MS    Remote source timeout in milliseconds
    OVERLAY__REMOTE__USER_AGENT    User-Agent sent to remote sources
    OVERLAY__LOGGING__LEVEL        Log filter (e.g. info, overlay_config=debug)
    OVERLAY__LOGGING__FORMAT       pretty or json

EXAMPLES:
    # Show what the HUD would see
    overlay-inspect --config config/overlay.toml

    # Machine-readable values
    overlay-inspect --json | jq .title
"
    );
}

/// Load the manifest. An explicit path must exist; the default is optional.
fn load_settings(path: Option<&PathBuf>) -> ConfigResult<OverlaySettings> {
    let loader = SettingsLoader::new().with_dotenv();
    let loader = match path {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_MANIFEST)?,
    };
    loader.with_env_prefix(ENV_PREFIX).load()
}

/// One status line per source, in load order.
fn render_status(report: &LoadReport, overlay: &DebugOverlay) -> String {
    let mut out = String::new();
    for source in overlay.sources() {
        let status = match report.outcome(source.name()) {
            Some(SourceOutcome::Loaded { entries }) => format!("loaded ({entries} entries)"),
            Some(SourceOutcome::Failed { reason }) => format!("failed: {reason}"),
            None => "skipped".to_string(),
        };
        let _ = writeln!(
            out,
            "# {} [{} {}] {status}",
            source.name(),
            source.kind(),
            source.location()
        );
    }
    out
}

/// Sorted `key = value` lines.
fn render_values(values: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in values {
        let _ = writeln!(out, "{key} = {value}");
    }
    out
}

/// Values as a JSON object.
fn render_json(values: &BTreeMap<String, String>) -> serde_json::Value {
    values
        .iter()
        .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
        .collect::<serde_json::Map<_, _>>()
        .into()
}

#[tokio::main]
async fn main() {
    // Parse arguments
    let args = Args::parse();

    // Load manifest
    let settings = match load_settings(args.config.as_ref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load manifest: {e}");
            std::process::exit(1);
        }
    };

    // Initialize logging
    if let Err(e) = overlay::telemetry::init_logging(&log_config(&settings.logging)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overlay = match DebugOverlay::from_settings(&settings) {
        Ok(overlay) => overlay,
        Err(e) => {
            error!(error = %e, "Failed to create overlay");
            std::process::exit(1);
        }
    };

    info!(sources = overlay.sources().len(), "Resolving configuration");
    let report = overlay.load_all().await;
    let values = overlay.registry().store().snapshot();

    if args.json {
        eprint!("{}", render_status(&report, &overlay));
        println!("{:#}", render_json(&values));
    } else {
        print!("{}", render_status(&report, &overlay));
        print!("{}", render_values(&values));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use overlay::{ConfigError, ConfigRegistry, SourceDescriptor};
    use tempfile::TempDir;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_render_values_sorted() {
        let out = render_values(&values(&[("title", "HUD"), ("alpha", "1")]));
        assert_eq!(out, "alpha = 1\ntitle = HUD\n");
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&values(&[("rotator_rotation", "0,90,0")]));
        assert_eq!(json["rotator_rotation"], "0,90,0");
    }

    #[tokio::test]
    async fn test_render_status() {
        let temp_dir = TempDir::new().unwrap();
        let present = temp_dir.path().join("present.json");
        fs::write(&present, r#"{"data": [{"key": "a", "value": "1"}]}"#).unwrap();

        let overlay = DebugOverlay::new(
            Arc::new(ConfigRegistry::new().unwrap()),
            vec![
                SourceDescriptor::local("present", &present),
                SourceDescriptor::local("absent", temp_dir.path().join("absent.json")),
            ],
        );
        let report = overlay.load_all().await;
        let out = render_status(&report, &overlay);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("# present [local "));
        assert!(lines[0].ends_with("loaded (1 entries)"));
        assert!(lines[1].starts_with("# absent [local "));
        assert!(lines[1].contains("failed: "));
    }

    #[test]
    fn test_explicit_manifest_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("overlay.toml");
        assert!(matches!(
            load_settings(Some(&missing)),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_manifest_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("overlay.toml");
        fs::write(
            &manifest,
            r#"
[[sources]]
name = "defaults"
kind = "local"
location = "config/defaults.json"
"#,
        )
        .unwrap();

        let settings = load_settings(Some(&manifest)).unwrap();
        assert_eq!(settings.sources.len(), 1);
        assert_eq!(settings.sources[0].name, "defaults");
    }
}
