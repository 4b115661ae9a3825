use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{error, info};

use biokiosk::{
    AlertResolution, Confirmer, KeyInputHandler, KioskCommand, KioskConfig, KioskController,
    KioskEvent, RegistrationForm, ViewId, ViewStore,
};

#[derive(Parser, Debug)]
#[command(name = "biokiosk")]
#[command(about = "Biometric attendance console client")]
#[command(version)]
#[command(long_about = "Terminal client for a biometric attendance console: dashboard, \
employee registration with photo capture, live identity verification, employee roster, \
and fraud alert handling. Matching and fraud scoring run on the remote service.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "biokiosk.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Override the remote service base URL from the config file
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the console")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - initialize but don't start the console
    #[arg(long, help = "Initialize the controller but don't enter the console loop")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting biokiosk console v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match KioskConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(base_url) = &args.base_url {
        config.api.base_url = base_url.clone();
    }

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate()?;

    let controller = Arc::new(KioskController::from_config(config)?);

    if args.dry_run {
        println!("✓ Dry run completed successfully - controller initialized");
        return Ok(());
    }

    controller.spawn_reload_listener();
    run_console(controller).await
}

async fn run_console(controller: Arc<KioskController>) -> Result<()> {
    let (tx, mut commands) = mpsc::unbounded_channel();
    let input = KeyInputHandler::new(tx);
    input.start();

    let mut events = controller.events().subscribe();
    let store = controller.store();

    say("biokiosk console");
    say("  views:   [d]ashboard [r]egistration [v]erification [e]mployees [f]raud");
    say("  actions: [c]amera on [o]ff [p]hoto re[g]ister ver[i]fy chec[k]-in [x]resolve [s]eed [u]pdate [q]uit");

    // Dashboard is already the active view; fetch its data
    controller.refresh();

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                if handle_command(&controller, &input, command).await {
                    break;
                }
            }
            event = events.recv() => {
                if let Ok(event) = event {
                    render_event(event, &store);
                }
            }
        }
    }

    input.stop().await;
    info!("Console stopped");
    Ok(())
}

/// Execute one operator command. Returns true when the console should exit.
async fn handle_command(
    controller: &Arc<KioskController>,
    input: &KeyInputHandler,
    command: KioskCommand,
) -> bool {
    match command {
        KioskCommand::Navigate(view) => controller.activate(view).await,
        KioskCommand::Refresh => controller.refresh(),
        KioskCommand::StartCamera => {
            if let Err(e) = controller.start_camera().await {
                say(&format!("Camera error: {}", e));
            }
        }
        KioskCommand::StopCamera => controller.stop_camera().await,
        KioskCommand::CapturePhoto => match controller.capture_registration_photo() {
            Ok(()) => say("Photo staged for registration"),
            Err(e) => say(&format!("Capture failed: {}", e)),
        },
        KioskCommand::Register => {
            if let Some(form) = prompt_registration(input).await {
                let controller = Arc::clone(controller);
                tokio::spawn(async move {
                    match controller.register(&form).await {
                        Ok(outcome) => {
                            if let Some(advisory) = outcome.duplicates_advisory() {
                                say(&format!("NOTICE: {}", advisory));
                            }
                            let name = outcome
                                .employee
                                .map(|e| e.name)
                                .unwrap_or_else(|| form.name.clone());
                            say(&format!("Registered {}", name));
                        }
                        Err(e) => say(&format!("Registration failed: {}", e)),
                    }
                });
            }
        }
        KioskCommand::Verify => {
            input.pause();
            let id = prompt_line("Employee id: ").await;
            input.resume();
            match id.and_then(|s| s.trim().parse::<i64>().ok()) {
                Some(id) => {
                    let controller = Arc::clone(controller);
                    tokio::spawn(async move {
                        match controller.verify(id).await {
                            Ok(result) => say(&format!(
                                "{} (confidence {:.1}%)",
                                if result.verified { "MATCH" } else { "NO MATCH" },
                                result.confidence
                            )),
                            Err(e) => say(&format!("Verification failed: {}", e)),
                        }
                    });
                }
                None => say("Invalid employee id"),
            }
        }
        KioskCommand::CheckIn => {
            input.pause();
            let id = prompt_line("Employee id to check in: ").await;
            input.resume();
            match id.and_then(|s| s.trim().parse::<i64>().ok()) {
                Some(id) => {
                    let controller = Arc::clone(controller);
                    tokio::spawn(async move {
                        match controller.check_in(id, "facial").await {
                            Ok(_) => say(&format!("Attendance recorded for employee {}", id)),
                            Err(e) => say(&format!("Check-in failed: {}", e)),
                        }
                    });
                }
                None => say("Invalid employee id"),
            }
        }
        KioskCommand::ResolveAlert => {
            input.pause();
            let id = prompt_line("Alert id: ")
                .await
                .and_then(|s| s.trim().parse::<i64>().ok());
            let notes = prompt_line("Notes (optional): ")
                .await
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            input.resume();

            match id {
                Some(id) => {
                    let confirmer = TerminalConfirmer { input };
                    match controller.resolve_alert(id, notes, &confirmer).await {
                        Ok(AlertResolution::Cancelled) => say("Resolution cancelled"),
                        Ok(AlertResolution::Resolved { .. }) => {
                            say(&format!("Alert {} resolved", id))
                        }
                        Err(e) => say(&format!("Resolution failed: {}", e)),
                    }
                }
                None => say("Invalid alert id"),
            }
        }
        KioskCommand::SeedSampleData => {
            input.pause();
            let count = prompt_line("How many demo employees? [10] ")
                .await
                .and_then(|s| {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        trimmed.parse::<u32>().ok()
                    }
                })
                .unwrap_or(10);
            input.resume();

            match controller.seed_sample_data(count).await {
                Ok(created) => say(&format!("Seeded {} demo employees", created)),
                Err(e) => say(&format!("Seeding failed: {}", e)),
            }
        }
        KioskCommand::Quit => {
            controller.shutdown("operator request").await;
            return true;
        }
    }
    false
}

async fn prompt_registration(input: &KeyInputHandler) -> Option<RegistrationForm> {
    input.pause();
    let name = prompt_line("Name: ").await.unwrap_or_default();
    let national_id = prompt_line("National id (optional): ").await;
    let department = prompt_line("Department (optional): ").await;
    let email = prompt_line("Email (optional): ").await;
    input.resume();

    if name.trim().is_empty() {
        say("Name is required");
        return None;
    }

    let optional = |value: Option<String>| {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    Some(RegistrationForm {
        name: name.trim().to_string(),
        national_id: optional(national_id),
        department: optional(department),
        email: optional(email),
        ..Default::default()
    })
}

async fn prompt_line(label: &str) -> Option<String> {
    use std::io::Write;
    print!("{}", label);
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    let mut reader = tokio::io::BufReader::new(tokio::io::stdin());
    reader.read_line(&mut line).await.ok()?;
    Some(line.trim_end().to_string())
}

struct TerminalConfirmer<'a> {
    input: &'a KeyInputHandler,
}

#[async_trait::async_trait]
impl Confirmer for TerminalConfirmer<'_> {
    async fn confirm(&self, prompt: &str) -> bool {
        self.input.pause();
        let answer = prompt_line(&format!("{} [y/N] ", prompt))
            .await
            .unwrap_or_default();
        self.input.resume();
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Print a line while the terminal may be in raw mode.
fn say(line: &str) {
    use std::io::Write;
    print!("{}\r\n", line);
    let _ = std::io::stdout().flush();
}

fn render_event(event: KioskEvent, store: &ViewStore) {
    match event {
        KioskEvent::ViewChanged { view, .. } => say(&format!("== {} ==", view.name())),
        KioskEvent::DataLoaded { view, .. } => render_view(view, store),
        KioskEvent::LoadFailed { view, message } => {
            say(&format!("Failed to load {}: {}", view.name(), message))
        }
        KioskEvent::Advisory { message } => say(&format!("NOTICE: {}", message)),
        KioskEvent::CameraStateChanged { state, .. } => say(&format!("Camera: {}", state)),
        _ => {}
    }
}

fn render_view(view: ViewId, store: &ViewStore) {
    match view {
        ViewId::Dashboard => {
            if let Some(stats) = store.dashboard() {
                say(&format!(
                    "Employees: {}  Attendance: {}  Pending duplicates: {}  Claims: {}  Ghost workers: {}",
                    stats.total_employees,
                    stats.total_attendance,
                    stats.pending_duplicates,
                    stats.total_claims,
                    stats.ghost_workers_count
                ));
            }
        }
        ViewId::Employees => {
            if let Some(page) = store.employees() {
                say(&format!(
                    "{} employees (page {}/{})",
                    page.total, page.current_page, page.pages
                ));
                for employee in page.employees.iter().take(10) {
                    say(&format!(
                        "  #{} {} - {}",
                        employee.id,
                        employee.name,
                        employee.department.as_deref().unwrap_or("-")
                    ));
                }
            }
        }
        ViewId::Fraud => {
            if let Some(overview) = store.fraud() {
                say(&format!(
                    "{} pending alerts, {} possible ghost workers",
                    overview.alerts.len(),
                    overview.ghost_workers.len()
                ));
                for alert in overview.alerts.iter().take(10) {
                    say(&format!(
                        "  alert #{}: {} vs {} ({:.0}% similar)",
                        alert.id,
                        alert.employee_1_name.as_deref().unwrap_or("?"),
                        alert.employee_2_name.as_deref().unwrap_or("?"),
                        alert.similarity_score
                    ));
                }
            }
        }
        ViewId::Verification => {
            if let Some(result) = store.verification() {
                say(&format!(
                    "Verification: {} (confidence {:.1}%)",
                    if result.verified { "MATCH" } else { "NO MATCH" },
                    result.confidence
                ));
            }
        }
        ViewId::Registration => {}
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("biokiosk={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer().with_target(true).boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Biokiosk configuration file");
    println!("# Defaults shown; every key may be overridden by BIOKIOSK_* environment variables");
    println!();
    println!("{}", toml::to_string_pretty(&KioskConfig::default())?);
    Ok(())
}
