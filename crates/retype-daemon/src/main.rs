use anyhow::{Context, Result};
use clap::Parser;
use retype_core::config::Settings;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Global keystroke interceptor for Vietnamese input
#[derive(Parser, Debug)]
#[command(name = "retype")]
#[command(version)]
#[command(about = "Global keystroke interceptor for Vietnamese input", long_about = None)]
struct Args {
    /// JSON settings file (defaults to the per-user config dir)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate settings and exit
    #[arg(long)]
    check_config: bool,

    /// Print the default settings document and exit
    #[arg(long)]
    print_default_config: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn settings_path(args: &Args) -> Result<PathBuf> {
    args.config
        .clone()
        .or_else(Settings::default_path)
        .context("no per-user config directory; pass --config")
}

fn check_config(path: &Path, settings: &Settings) {
    println!("Configuration is valid: {}", path.display());
    println!("  toggle:  {}", settings.toggle_shortcut);
    if settings.restore_enabled {
        println!("  restore: {}", settings.restore_shortcut);
    } else {
        println!("  restore: disabled");
    }
    println!("  method:  {:?}", settings.input_method);
    let mut apps: Vec<_> = settings.app_overrides.iter().collect();
    apps.sort_by(|a, b| a.0.cmp(b.0));
    for (app, method) in apps {
        println!("  app {} -> {:?}", app, method);
    }
}

#[cfg(all(windows, feature = "native-engine"))]
fn make_engine() -> Box<dyn retype_core::engine::TransformationEngine> {
    Box::new(retype_core::engine::native::NativeEngine::new())
}

#[cfg(all(windows, not(feature = "native-engine")))]
fn make_engine() -> Box<dyn retype_core::engine::TransformationEngine> {
    info!("Built without native-engine, shortcuts only");
    Box::new(retype_core::engine::NullEngine)
}

#[cfg(windows)]
fn run(settings: Settings) -> Result<()> {
    use crossbeam_channel::Receiver;
    use retype_core::context::{HookContext, Notification};
    use retype_core::foreground::ProcessProbe;
    use retype_core::interceptor::KeyInterceptor;
    use retype_core::keyboard_hook::{self, AsyncKeyState, SendInputSink};
    use std::sync::Arc;
    use tracing::{debug, warn};

    fn pump_notifications(rx: Receiver<Notification>, hook_thread: u32) {
        for notification in rx.iter() {
            match notification {
                Notification::ToggleRequested => {
                    let toggled = keyboard_hook::with_interceptor(|i| {
                        let next = !i.is_enabled();
                        i.set_enabled(next);
                        next
                    });
                    match toggled {
                        Some(enabled) => info!(enabled, "Toggled"),
                        None => warn!("Toggle requested but no interceptor is installed"),
                    }
                }
                Notification::RestoreRequested => debug!("Restore requested"),
                Notification::PerAppStateRestored { app, enabled } => {
                    info!(%app, enabled, "Restored per-app state")
                }
            }
        }
        // Every sender is gone, so the hook context was dropped.
        keyboard_hook::request_quit(hook_thread);
    }

    let ctx = Arc::new(HookContext::new(Box::new(ProcessProbe)));
    ctx.apply_shortcuts(settings.shortcut_settings());
    settings.configure_selector(ctx.selector());

    let mut engine = make_engine();
    engine.init();
    settings.configure_engine(engine.as_mut());

    let mut interceptor = KeyInterceptor::new(
        ctx.clone(),
        engine,
        Box::new(AsyncKeyState),
        Box::new(SendInputSink),
    )
    .with_per_app_memory(settings.per_app_memory);
    interceptor.set_enabled(settings.enabled);

    let notifications = ctx.subscribe();
    drop(ctx);

    keyboard_hook::start(interceptor).context("starting keyboard hook")?;
    let hook_thread = keyboard_hook::current_thread_id();
    std::thread::Builder::new()
        .name("notifications".into())
        .spawn(move || pump_notifications(notifications, hook_thread))
        .context("spawning notification thread")?;

    info!("retype running");
    keyboard_hook::run_event_loop();
    keyboard_hook::stop();
    Ok(())
}

#[cfg(not(windows))]
fn run(_settings: Settings) -> Result<()> {
    Err(retype_core::error::HookError::Unsupported.into())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        println!("{}", serde_json::to_string_pretty(&Settings::default())?);
        return Ok(());
    }

    init_logging(args.verbose);
    info!(version = env!("CARGO_PKG_VERSION"), "retype starting");

    let path = settings_path(&args)?;
    let settings = Settings::load_or_default(&path)?;

    if args.check_config {
        check_config(&path, &settings);
        return Ok(());
    }

    run(settings)
}
