mod cli;
mod config;
mod driver;
mod log;
mod policy;
mod reader;
mod session;
mod snapshot;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use cli::{Cli, Command};
use config::{ProjectConfig, Strategy};
use driver::webdriver::WebDriverClient;
use log::{RunEvent, RunLog};
use reader::StateReader;
use session::LoopConfig;

fn config_source_label(config_path: Option<&Path>) -> String {
    config_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(defaults — no .tilepilot/config.toml found)".to_string())
}

fn push_kv(output: &mut String, key: &str, value: impl std::fmt::Display) {
    output.push_str(&format!("  {key:<22} {value}\n"));
}

fn render_config_human(config: &ProjectConfig, config_path: Option<&Path>) -> String {
    let mut output = String::new();
    output.push_str("Game\n");
    push_kv(&mut output, "url", &config.game.url);
    push_kv(&mut output, "target_tile", config.game.target_tile);
    push_kv(&mut output, "strategy", config.game.strategy.label());
    output.push('\n');

    output.push_str("Driver\n");
    push_kv(&mut output, "endpoint", &config.driver.endpoint);
    push_kv(&mut output, "headless", config.driver.headless);
    push_kv(
        &mut output,
        "page_load_wait",
        format!("{}s", config.driver.page_load_wait_secs),
    );
    push_kv(
        &mut output,
        "final_pause",
        format!("{}s", config.driver.final_pause_secs),
    );
    output.push('\n');

    output.push_str("Selectors\n");
    push_kv(&mut output, "score", &config.selectors.score);
    push_kv(&mut output, "tiles", &config.selectors.tiles);
    push_kv(&mut output, "overlay", &config.selectors.overlay);
    push_kv(&mut output, "row_attr", &config.selectors.row_attr);
    push_kv(&mut output, "col_attr", &config.selectors.col_attr);
    output.push('\n');

    output.push_str("Run\n");
    push_kv(
        &mut output,
        "move_delay",
        format!("{}ms", config.run.move_delay_millis),
    );
    output.push('\n');

    output.push_str("Source Path\n");
    push_kv(&mut output, "path", config_source_label(config_path));

    output
}

fn render_config_json(config: &ProjectConfig, config_path: Option<&Path>) -> Result<String> {
    let payload = serde_json::json!({
        "game": {
            "url": &config.game.url,
            "target_tile": config.game.target_tile,
            "strategy": config.game.strategy.label()
        },
        "driver": {
            "endpoint": &config.driver.endpoint,
            "headless": config.driver.headless,
            "page_load_wait_secs": config.driver.page_load_wait_secs,
            "final_pause_secs": config.driver.final_pause_secs
        },
        "selectors": {
            "score": &config.selectors.score,
            "tiles": &config.selectors.tiles,
            "overlay": &config.selectors.overlay,
            "row_attr": &config.selectors.row_attr,
            "col_attr": &config.selectors.col_attr
        },
        "run": {
            "move_delay_millis": config.run.move_delay_millis
        },
        "source_path": config_source_label(config_path)
    });

    serde_json::to_string_pretty(&payload).context("failed to serialize config to JSON")
}

fn run_log_path(cwd: &Path, strategy: Strategy) -> std::path::PathBuf {
    let ts = chrono::Utc::now().format("%Y%m%d-%H%M%S");
    cwd.join(".tilepilot")
        .join("logs")
        .join(format!("run-{}-{ts}.jsonl", strategy.label()))
}

fn play(config: &ProjectConfig, cwd: &Path) -> Result<()> {
    let strategy = config.game.strategy;
    let policy = policy::policy_for(strategy);
    let reader = StateReader::new(&config.selectors);
    let loop_config = LoopConfig {
        target_tile: config.game.target_tile,
        move_delay: Duration::from_millis(config.run.move_delay_millis),
    };

    let log = RunLog::new(&run_log_path(cwd, strategy))?;
    log.record(RunEvent::SessionStarted {
        url: config.game.url.clone(),
        strategy: strategy.label().to_string(),
    })?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        })
        .context("failed to install Ctrl-C handler")?;
    }

    let mut client = WebDriverClient::connect(&config.driver.endpoint, config.driver.headless)
        .context("failed to open a browser session — is chromedriver running?")?;

    info!(url = %config.game.url, strategy = strategy.label(), "starting game");
    let result = (|| {
        client
            .navigate(&config.game.url)
            .context("failed to open the game page")?;
        // Let the page finish loading before the first read.
        std::thread::sleep(Duration::from_secs(config.driver.page_load_wait_secs));
        session::run_loop(
            &mut client,
            &reader,
            policy.as_ref(),
            &loop_config,
            &log,
            &interrupted,
        )
    })();

    // Teardown runs whatever happened in the loop; the pause lets the final
    // board state be seen in a visible browser.
    if result.is_ok() {
        std::thread::sleep(Duration::from_secs(config.driver.final_pause_secs));
    }
    if let Err(e) = client.close() {
        warn!("failed to close webdriver session: {e}");
    }

    let report = result?;
    println!("[tilepilot] outcome:     {}", report.outcome.label());
    println!("[tilepilot] final score: {}", report.final_score);
    println!("[tilepilot] best tile:   {}", report.best_tile);
    println!("[tilepilot] moves:       {}", report.move_count);
    println!("[tilepilot] run log:     {}", log.path().display());

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let is_config_command = matches!(&cli.command, Command::Config { .. });

    let filter = match cli.verbose {
        0 if is_config_command => "tilepilot=warn",
        0 => "tilepilot=info",
        1 => "tilepilot=debug",
        _ => "tilepilot=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cwd = std::env::current_dir().context("failed to get current directory (was it deleted?)")?;
    let (mut config, config_path) = ProjectConfig::load(&cwd)?;

    if !is_config_command || cli.verbose > 0 {
        match config_path {
            Some(ref p) => info!("loaded config from {}", p.display()),
            None => info!("no .tilepilot/config.toml found, using defaults"),
        }
    }

    match cli.command {
        Command::Play {
            url,
            strategy,
            headless,
            endpoint,
        } => {
            if let Some(url) = url {
                config.game.url = url;
            }
            if let Some(strategy) = strategy {
                config.game.strategy = strategy;
            }
            if headless {
                config.driver.headless = true;
            }
            if let Some(endpoint) = endpoint {
                config.driver.endpoint = endpoint;
            }

            play(&config, &cwd)?;
        }
        Command::Config { json } => {
            if json {
                println!("{}", render_config_json(&config, config_path.as_deref())?);
            } else {
                print!("{}", render_config_human(&config, config_path.as_deref()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_config_human_groups_sections() {
        let config = ProjectConfig::default();
        let rendered = render_config_human(&config, None);

        assert!(rendered.contains("Game"));
        assert!(rendered.contains("Driver"));
        assert!(rendered.contains("Selectors"));
        assert!(rendered.contains("Run"));
        assert!(rendered.contains("Source Path"));
        assert!(rendered.contains(".grid-cell"));
        assert!(rendered.contains("(defaults — no .tilepilot/config.toml found)"));
    }

    #[test]
    fn render_config_json_is_valid_and_contains_expected_fields() {
        let config = ProjectConfig::default();
        let json = render_config_json(&config, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["game"]["target_tile"], 2048);
        assert_eq!(value["game"]["strategy"], "pattern");
        assert_eq!(value["driver"]["endpoint"], "http://localhost:9515");
        assert_eq!(value["driver"]["headless"], false);
        assert_eq!(value["selectors"]["tiles"], ".grid-cell");
        assert_eq!(
            value["source_path"],
            "(defaults — no .tilepilot/config.toml found)"
        );
    }

    #[test]
    fn run_log_path_embeds_strategy() {
        let path = run_log_path(Path::new("/tmp/project"), Strategy::Corner);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("run-corner-"));
        assert!(name.ends_with(".jsonl"));
        assert!(path.starts_with("/tmp/project/.tilepilot/logs"));
    }
}
