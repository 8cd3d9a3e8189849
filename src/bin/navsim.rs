use std::path::PathBuf;
use std::process;

use clap::Parser;
use spatial_nav::common::config::{Config, config_file};
use spatial_nav::common::log;
use spatial_nav::input::{Action, KeyCode};
use spatial_nav::scene::{EventLog, Scene};

/// Replays key presses against a static scene and prints where focus goes.
#[derive(Parser)]
struct Cli {
    /// Scene file describing nodes and their boxes.
    scene: PathBuf,

    /// Comma-separated keys to press. Action names (`left`, `enter`, ...),
    /// key names (`ArrowLeft`) and numeric key codes are accepted.
    #[arg(long, short, value_delimiter = ',')]
    keys: Vec<String>,

    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only check the configuration and the scene.
    #[arg(long)]
    validate: bool,

    /// Print the focus tree after the last key.
    #[arg(long)]
    tree: bool,

    /// Print each directional move's candidates as JSON.
    #[arg(long)]
    trace: bool,
}

fn main() {
    let opt = Cli::parse();
    log::init_logging();

    let config = match opt.config.clone().or_else(config_file).filter(|p| p.exists()) {
        Some(path) => Config::read(&path).unwrap_or_else(|e| fail(format!("{}: {e}", path.display()))),
        None => Config::default(),
    };
    let scene = Scene::read(&opt.scene)
        .unwrap_or_else(|e| fail(format!("{}: {e}", opt.scene.display())));

    if opt.validate {
        let issues = config.validate();
        if issues.is_empty() {
            println!("Config and scene validation passed");
            return;
        }
        for issue in issues {
            eprintln!("{issue}");
        }
        process::exit(1);
    }

    let mut settings = config.settings.clone();
    settings.visual_debug |= opt.trace;
    let events = EventLog::default();
    let mut nav = scene.build(settings, &events);
    let keymap = config.key_map();
    nav.set_key_map(keymap.iter().map(|(action, codes)| (action.as_str(), codes.to_vec().into())));
    print_events(&events);
    println!("start -> {}", nav.current_focus_id().unwrap_or("(none)"));

    for token in &opt.keys {
        let token = token.trim();
        let key = match token.parse::<Action>() {
            Ok(action) => match keymap.codes(action).first() {
                Some(code) => code.clone(),
                None => fail(format!("action `{action}` has no key bound")),
            },
            Err(_) => token.parse::<KeyCode>().unwrap_or_else(|e| fail(e.to_string())),
        };
        nav.on_key_down(key.clone());
        nav.on_key_up(key);
        print_events(&events);
        println!("{token} -> {}", nav.current_focus_id().unwrap_or("(none)"));
        if opt.trace
            && let Some(trace) = nav.last_navigation_trace()
        {
            match serde_json::to_string_pretty(trace) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("could not serialize trace: {e}"),
            }
        }
    }

    if opt.tree {
        print!("{}", nav.draw_tree());
    }
}

fn print_events(events: &EventLog) {
    for event in events.take() {
        println!("  {event}");
    }
}

fn fail(msg: String) -> ! {
    eprintln!("{msg}");
    process::exit(1);
}
