use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_bestie::config::Config;
use resume_bestie::errors::ClientError;
use resume_bestie::models::{AnalysisResult, ChatMessage};
use resume_bestie::shell::{ChatRequest, Screen, Shell, Ticket, UploadRequest};
use resume_bestie::storage::{FileStorage, KeyValueStorage};
use resume_bestie::view;
use resume_bestie::{Backend, HttpBackend, ResumeFile};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Logs go to stderr so the screen on stdout stays readable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resume_bestie={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Resume Bestie v{}", env!("CARGO_PKG_VERSION"));

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(
        config.api_base_url.clone(),
        config.request_timeout,
    )?);
    info!("Backend: {}", config.api_base_url);
    if config.google_client_id.is_empty() {
        warn!("GOOGLE_CLIENT_ID is not set; tokens must be obtained elsewhere");
    }

    let storage = FileStorage::new(&config.session_file);
    info!("Session file: {}", storage.path().display());

    let mut shell = Shell::new(storage);
    shell.restore();

    run(shell, backend, &config).await
}

/// Results of requests running in the background, fed back into the loop.
enum Completion {
    Upload(Ticket, Result<AnalysisResult, ClientError>),
    Reply(Ticket, Result<String, ClientError>),
}

async fn run<S: KeyValueStorage>(
    mut shell: Shell<S>,
    backend: Arc<dyn Backend>,
    config: &Config,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(16));
    let mut printer = TranscriptPrinter::default();
    let mut drawn: Option<Screen> = None;

    if !config.google_client_id.is_empty() {
        println!("OAuth client: {}", config.google_client_id);
    }
    redraw(&shell, &mut printer, &mut drawn, true);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = parse_command(&line);
                if command == Command::Quit {
                    break;
                }
                let force = handle(command, &mut shell, &backend, &tx).await;
                redraw(&shell, &mut printer, &mut drawn, force);
            }
            Some(done) = rx.recv() => {
                match done {
                    Completion::Upload(ticket, result) => shell.complete_upload(ticket, result),
                    Completion::Reply(ticket, result) => shell.complete_send(ticket, result),
                }
                redraw(&shell, &mut printer, &mut drawn, false);
            }
            _ = ticker.tick() => {
                if drawn == Some(Screen::Dashboard) {
                    printer.flush(&shell.chat_history(), shell.is_revealing());
                }
            }
        }
    }

    info!("bye");
    Ok(())
}

/// Applies one user command. Returns true when the screen should be redrawn
/// even if it did not change (e.g. a new error banner).
async fn handle<S: KeyValueStorage>(
    command: Command,
    shell: &mut Shell<S>,
    backend: &Arc<dyn Backend>,
    tx: &mpsc::UnboundedSender<Completion>,
) -> bool {
    match command {
        Command::Login(token) => {
            if shell.screen() != Screen::Login {
                println!("Already signed in. /logout first.");
                return false;
            }
            shell.login(backend.as_ref(), &token).await;
            true
        }
        Command::LoginFailed => {
            shell.login_provider_failed();
            true
        }
        Command::Upload(path) => {
            let file = match ResumeFile::from_path(&path).await {
                Ok(file) => file,
                Err(e) => {
                    warn!("Could not read {}: {e}", path.display());
                    println!("Couldn't open {}.", path.display());
                    return false;
                }
            };
            if !file.has_accepted_extension() {
                println!("Heads up: PDF, PNG, or JPG work best. Sending it anyway.");
            }
            match shell.begin_upload(file) {
                Some(request) => spawn_upload(Arc::clone(backend), tx.clone(), request),
                None => println!("Can't upload right now."),
            }
            false
        }
        Command::UseExisting => {
            if !shell.use_existing_resume() {
                println!("No resume on file.");
            }
            false
        }
        Command::UploadNew => {
            shell.dismiss_existing_resume();
            false
        }
        Command::ScanNew => {
            shell.reset();
            false
        }
        Command::Logout => {
            shell.logout();
            false
        }
        Command::Show => true,
        Command::Help => {
            println!("{HELP}");
            false
        }
        Command::Say(text) => {
            if let Some(request) = shell.begin_send(&text) {
                spawn_reply(Arc::clone(backend), tx.clone(), request);
            }
            false
        }
        Command::Unknown(raw) => {
            println!("Unknown command {raw}. Try /help.");
            false
        }
        Command::Quit => false,
    }
}

fn spawn_upload(
    backend: Arc<dyn Backend>,
    tx: mpsc::UnboundedSender<Completion>,
    request: UploadRequest,
) {
    let UploadRequest {
        ticket,
        google_id,
        file,
    } = request;
    tokio::spawn(async move {
        let result = backend.analyze(&google_id, file).await;
        let _ = tx.send(Completion::Upload(ticket, result));
    });
}

fn spawn_reply(
    backend: Arc<dyn Backend>,
    tx: mpsc::UnboundedSender<Completion>,
    request: ChatRequest,
) {
    tokio::spawn(async move {
        let result = backend.chat(&request.message, &request.context).await;
        let _ = tx.send(Completion::Reply(request.ticket, result));
    });
}

fn redraw<S: KeyValueStorage>(
    shell: &Shell<S>,
    printer: &mut TranscriptPrinter,
    drawn: &mut Option<Screen>,
    force: bool,
) {
    let screen = shell.screen();
    if force || *drawn != Some(screen) {
        println!();
        if screen == Screen::Dashboard {
            // The printer replays the transcript below the frame.
            print!("{}", view::render_dashboard_frame(shell));
            *printer = TranscriptPrinter::default();
        } else {
            print!("{}", view::render(shell));
        }
        *drawn = Some(screen);
    }
    if screen == Screen::Dashboard {
        printer.flush(&shell.chat_history(), shell.is_revealing());
        if shell.is_chat_loading() {
            printer.cooking();
        }
    }
    let _ = std::io::stdout().flush();
}

#[derive(Debug, PartialEq)]
enum Command {
    Login(String),
    LoginFailed,
    Upload(PathBuf),
    UseExisting,
    UploadNew,
    ScanNew,
    Logout,
    Show,
    Help,
    Quit,
    Say(String),
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Say(line.to_string());
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match (name, arg) {
        ("login", token) if !token.is_empty() => Command::Login(token.to_string()),
        ("login-failed", _) => Command::LoginFailed,
        ("upload", path) if !path.is_empty() => Command::Upload(PathBuf::from(path)),
        ("use-existing", _) => Command::UseExisting,
        ("upload-new", _) => Command::UploadNew,
        ("scan-new", _) | ("reset", _) => Command::ScanNew,
        ("logout", _) => Command::Logout,
        ("show", _) => Command::Show,
        ("help", _) => Command::Help,
        ("quit", _) | ("exit", _) => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

const HELP: &str = "\
/login <token>   sign in with a Google ID token
/login-failed    report that the Google sign-in popup failed
/upload <path>   analyze a resume
/use-existing    open the resume we have on file
/upload-new      ignore the stored resume
/scan-new        back to the upload screen
/logout          sign out
/show            redraw the screen
/quit            exit
anything else    chat with your bestie";

/// Prints the transcript incrementally so reveals look like live typing.
#[derive(Debug, Default)]
struct TranscriptPrinter {
    /// Messages fully printed, newline included.
    done: usize,
    /// Characters of message `done` already printed.
    chars: usize,
    /// Whether the `speaker>` prefix of message `done` is out.
    started: bool,
    /// Length of the transcript when the cooking line was last shown.
    cooking_at: Option<usize>,
}

impl TranscriptPrinter {
    fn flush(&mut self, history: &[ChatMessage], last_revealing: bool) {
        if history.len() < self.done {
            *self = Self::default();
        }
        while self.done < history.len() {
            let msg = &history[self.done];
            if !self.started {
                print!("{}> ", view::speaker(msg.role));
                self.started = true;
            }
            let rest: String = msg.content.chars().skip(self.chars).collect();
            self.chars += rest.chars().count();
            print!("{rest}");

            if self.done + 1 == history.len() && last_revealing {
                break;
            }
            println!();
            self.done += 1;
            self.chars = 0;
            self.started = false;
        }
        let _ = std::io::stdout().flush();
    }

    fn cooking(&mut self) {
        if self.cooking_at != Some(self.done) {
            println!("✨ Bestie is cooking...");
            self.cooking_at = Some(self.done);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(parse_command("how do I negotiate?"), Command::Say("how do I negotiate?".to_string()));
        assert_eq!(parse_command("   "), Command::Say("   ".to_string()));
    }

    #[test]
    fn test_login_needs_token() {
        assert_eq!(parse_command("/login abc.def.ghi"), Command::Login("abc.def.ghi".to_string()));
        assert_eq!(parse_command("/login"), Command::Unknown("/login".to_string()));
    }

    #[test]
    fn test_upload_keeps_path_with_spaces() {
        assert_eq!(
            parse_command("/upload /home/me/My Resume.pdf"),
            Command::Upload(PathBuf::from("/home/me/My Resume.pdf"))
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("/use-existing"), Command::UseExisting);
        assert_eq!(parse_command("/upload-new"), Command::UploadNew);
        assert_eq!(parse_command("/scan-new"), Command::ScanNew);
        assert_eq!(parse_command("/reset"), Command::ScanNew);
        assert_eq!(parse_command("/logout"), Command::Logout);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/login-failed"), Command::LoginFailed);
        assert_eq!(parse_command("/nope"), Command::Unknown("/nope".to_string()));
    }

    #[test]
    fn test_printer_tracks_progress() {
        let mut printer = TranscriptPrinter::default();
        let mut history = vec![ChatMessage::user("hi"), ChatMessage::assistant("H")];
        printer.flush(&history, true);
        assert_eq!((printer.done, printer.chars, printer.started), (1, 1, true));

        history[1].content = "HEY".to_string();
        printer.flush(&history, false);
        assert_eq!((printer.done, printer.chars, printer.started), (2, 0, false));
    }

    #[test]
    fn test_printer_restarts_after_clear() {
        let mut printer = TranscriptPrinter::default();
        printer.flush(&[ChatMessage::user("a"), ChatMessage::user("b")], false);
        printer.flush(&[ChatMessage::assistant("")], true);
        assert_eq!((printer.done, printer.chars, printer.started), (0, 0, true));
    }
}
