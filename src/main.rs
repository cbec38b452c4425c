//! Jargonaut - a single-channel IRC client
//!
//! Architecture:
//! - Main thread: owns the session state and draws the terminal front end
//! - Backend thread: runs a Tokio runtime for async network I/O
//! - Input thread: reads lines from stdin
//! - Communication via crossbeam channels

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use jargonaut::commands::DEFAULT_QUIT_MESSAGE;
use jargonaut::config::{self, ConfigError, Settings, SettingsStore};
use jargonaut::events::{self, EventOutcome};
use jargonaut::input_state::InputState;
use jargonaut::logging::Logger;
use jargonaut::protocol::{BackendAction, UiEvent};
use jargonaut::render::{self, RenderOptions};
use jargonaut::state::{ClientState, StatusPage};

/// Setting this variable skips the server connection entirely.
const OFFLINE_ENV: &str = "JARGONAUT_NO_SERVER_TEST";

/// How long to wait for the server to acknowledge QUIT on shutdown.
const QUIT_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "jargonaut", version, about = "Chat in a single IRC channel")]
struct Cli {
    /// Settings file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep an HTML rendering of the transcript at this path
    #[arg(long)]
    html: Option<PathBuf>,

    /// Do not connect to the server
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print every setting
    List,
    /// Print one setting
    Get { key: String },
    /// Change one setting
    Set { key: String, value: String },
    /// Store the NickServ password for the configured nickname (read from stdin)
    SetPassword,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => Ok(SettingsStore::new(path)),
        None => SettingsStore::open_default(),
    };
    let loaded = store.and_then(|store| store.load().map(|settings| (store, settings)));

    let debug = loaded.as_ref().is_ok_and(|(_, s)| s.debug);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" })),
        )
        .with_writer(io::stderr)
        .init();

    let (store, settings) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Some(Command::Config { action }) => run_config(action, &store, settings),
        None => {
            let offline = cli.offline || std::env::var_os(OFFLINE_ENV).is_some();
            run_chat(&store, settings, cli.html, offline).map_err(ConfigError::from)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_config(
    action: ConfigCommand,
    store: &SettingsStore,
    settings: Settings,
) -> Result<(), ConfigError> {
    match action {
        ConfigCommand::List => {
            for key in config::KEYS {
                println!("{} = {}", key, settings.get(key)?);
            }
        }
        ConfigCommand::Get { key } => println!("{}", settings.get(&key)?),
        ConfigCommand::Set { key, value } => {
            store.update(&key, &value)?;
            info!(%key, %value, path = %store.path().display(), "Setting saved");
        }
        ConfigCommand::SetPassword => {
            let account = settings.nickname.trim();
            if account.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "nickname".into(),
                    value: String::new(),
                    reason: "set a nickname before storing a password".into(),
                });
            }
            let mut password = String::new();
            io::stdin().lock().read_line(&mut password)?;
            config::save_password(account, password.trim_end_matches(['\r', '\n']))?;
        }
    }
    Ok(())
}

fn spawn_input_reader() -> io::Result<Receiver<String>> {
    let (tx, rx) = unbounded::<String>();
    thread::Builder::new().name("stdin".into()).spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read input");
                    break;
                }
            }
        }
    })?;
    Ok(rx)
}

/// Terminal front end over the session state.
struct Frontend {
    state: ClientState,
    input: InputState,
    action_tx: Sender<BackendAction>,
    store: SettingsStore,
    html_path: Option<PathBuf>,
    ansi: bool,
    printed: usize,
    shown_status: Option<StatusPage>,
}

impl Frontend {
    fn send(&self, action: BackendAction) {
        if self.action_tx.send(action).is_err() {
            warn!("Backend is not running");
        }
    }

    fn apply(&mut self, outcome: EventOutcome) {
        for action in outcome.actions {
            self.send(action);
        }
        if outcome.settings_changed {
            if let Err(e) = self.store.save(&self.state.settings) {
                warn!(error = %e, "Failed to save settings");
            }
        }
        if outcome.mention {
            print!("\x07");
        }
        self.redraw();
    }

    /// Print what is new since the last redraw.
    fn redraw(&mut self) {
        if self.shown_status.as_ref() != Some(&self.state.status) {
            match &self.state.status {
                StatusPage::Connecting => println!("Connecting to {}...", self.state.settings.server),
                StatusPage::Chat => println!("Joined {} as {}", self.state.channel, self.state.nickname),
                StatusPage::Error { title, details } => println!("*** {}: {}", title, details),
            }
            self.shown_status = Some(self.state.status.clone());
        }

        for line in self.state.take_system_log() {
            println!("-- {}", line);
        }

        let total = self.state.transcript.total_pushed();
        if total > self.printed {
            let state = &mut self.state;
            let opts = RenderOptions::from_settings(&state.nickname, &state.settings);
            let fresh = state.transcript.recent(total - self.printed);
            for msg in fresh {
                if let Some(line) = render::render_line(msg, &mut state.colors, &opts, self.ansi) {
                    println!("{}", line);
                }
            }
            self.printed = total;
            self.write_html();
        }

        let _ = io::stdout().flush();
    }

    fn write_html(&mut self) {
        let Some(path) = &self.html_path else {
            return;
        };
        let state = &mut self.state;
        let opts = RenderOptions::from_settings(&state.nickname, &state.settings);
        let html = render::render_html(&state.transcript, &mut state.colors, &opts);
        if let Err(e) = fs::write(path, html) {
            warn!(error = %e, path = %path.display(), "Failed to write transcript");
        }
    }

    /// Handle a typed line. Returns false when the user asked to quit.
    fn handle_line(&mut self, line: &str) -> bool {
        // A trailing tab asks for nick completion
        if let Some(prefix) = line.strip_suffix('\t') {
            self.input.set_text(prefix);
            let nicks = self.state.roster.sorted(&self.state.channel);
            self.input.complete(&nicks);
            println!("{}", self.input.message_input);
            return true;
        }

        self.input.set_text(line);
        let Some(line) = self.input.submit() else {
            return true;
        };
        let submission = self.state.submit_line(&line);
        for action in submission.actions {
            self.send(action);
        }
        self.redraw();
        !submission.quit
    }
}

fn run_chat(
    store: &SettingsStore,
    settings: Settings,
    html_path: Option<PathBuf>,
    offline: bool,
) -> io::Result<()> {
    let mut state = ClientState::new(settings);

    if state.settings.log_chat {
        match Logger::open_default() {
            Ok(logger) => state.logger = Some(logger),
            Err(e) => warn!(error = %e, "Chat logging disabled"),
        }
    }

    let account = state.settings.nickname.trim().to_string();
    if !account.is_empty() {
        match config::load_password(&account) {
            Ok(password) => state.password = password,
            Err(e) => warn!(error = %e, "Could not read the stored password"),
        }
    }

    // Create channels for front end <-> Backend
    let (action_tx, action_rx) = unbounded::<BackendAction>();
    let (event_tx, event_rx) = unbounded::<UiEvent>();

    if offline {
        info!("Offline mode, not connecting");
        state.status = StatusPage::Chat;
    } else {
        let backend_tx = event_tx.clone();
        let debug = state.settings.debug;
        thread::Builder::new()
            .name("backend".into())
            .spawn(move || jargonaut::backend::run_backend(action_rx, backend_tx, debug))?;
        let _ = action_tx.send(state.connect_action());
    }

    let input_rx = spawn_input_reader()?;

    let mut frontend = Frontend {
        state,
        input: InputState::new(),
        action_tx,
        store: store.clone(),
        html_path,
        ansi: io::stdout().is_terminal(),
        printed: 0,
        shown_status: None,
    };
    frontend.redraw();

    let mut quit_sent = false;
    loop {
        select! {
            recv(event_rx) -> event => {
                let Ok(event) = event else { break };
                let mut outcome = events::process_event(&mut frontend.state, event);
                outcome.merge(events::process_events(&event_rx, &mut frontend.state));
                frontend.apply(outcome);
            }
            recv(input_rx) -> line => match line {
                Ok(line) => {
                    if !frontend.handle_line(&line) {
                        quit_sent = true;
                        break;
                    }
                }
                // End of input
                Err(_) => break,
            }
        }
    }

    if frontend.state.is_connected {
        if !quit_sent {
            frontend.send(BackendAction::Quit(DEFAULT_QUIT_MESSAGE.to_string()));
        }
        // Let the backend flush QUIT before the process exits
        while let Ok(event) = event_rx.recv_timeout(QUIT_GRACE) {
            if matches!(event, UiEvent::Disconnected(_)) {
                break;
            }
        }
    }
    drop(event_tx);

    Ok(())
}
