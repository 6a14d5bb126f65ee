//! tinyterm
//!
//! Runs a shell on a PTY and draws the emulated screen inside the current
//! terminal. Keyboard input is relayed raw; the renderer mirrors the child's
//! cursor-key and bracketed-paste modes onto the host terminal so the relayed
//! bytes match what the child asked for. The emulated screen follows the size
//! of the host terminal.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use tinyterm::config::default_config_path;
use tinyterm::pty::{Pty, WindowSize};
use tinyterm::{AnsiRenderer, Config, Renderer, Session, SessionEvent, SessionHost};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct Options {
    config: Option<PathBuf>,
    cols: Option<u16>,
    rows: Option<u16>,
    shell: Option<String>,
    command: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let mut config = match &options.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::load_or_default(),
    };
    if let Some((cols, rows)) = host_terminal_size() {
        config.columns = cols;
        config.rows = rows;
    }
    if let Some(cols) = options.cols {
        config.columns = cols;
    }
    if let Some(rows) = options.rows {
        config.rows = rows;
    }
    if let Some(shell) = options.shell {
        config.shell = Some(shell);
    }

    match run(&config, &options.command) {
        Ok(code) => exit_code(code),
        Err(e) => {
            eprintln!("tinyterm: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the child until it exits; returns its exit code
fn run(config: &Config, command: &[String]) -> Result<Option<i32>, Box<dyn std::error::Error>> {
    let session = Session::with_config(config);
    let size = WindowSize::from_grid(session.cols(), session.rows());

    let pty = Arc::new(match command.split_first() {
        Some((program, args)) => Pty::spawn(program, args, size)?,
        None => Pty::spawn(&config.shell_program(), &config.shell_args[..], size)?,
    });
    tracing::info!("Spawned child {} at {}x{}", pty.child_pid(), size.cols, size.rows);

    let host = SessionHost::spawn_pty(session, Arc::clone(&pty))?;
    let host = Arc::new(host);

    let _raw_guard = RawModeGuard::new()?;
    let _screen_guard = HostScreenGuard::enter()?;
    let mut stdout = io::stdout();

    let stdin_host = Arc::clone(&host);
    thread::spawn(move || forward_stdin(&stdin_host));

    let mut renderer = AnsiRenderer::new(io::stdout());
    let mut host_size = host_terminal_size();
    let mut exit = None;

    loop {
        let current = host_terminal_size();
        if current != host_size {
            host_size = current;
            if let Some((cols, rows)) = current {
                if let Err(e) = pty.resize(WindowSize::new(cols, rows)) {
                    tracing::warn!("Failed to resize PTY: {}", e);
                }
                host.resize(usize::from(cols), usize::from(rows))?;
                renderer.invalidate();
            }
        }

        for event in host.take_events() {
            match event {
                SessionEvent::Bell => stdout.write_all(b"\x07")?,
                SessionEvent::TitleChanged(title) => tracing::debug!("Title: {}", title),
                SessionEvent::Exited(code) => exit = Some(code),
            }
        }

        renderer.present(&host.snapshot())?;

        if let Some(code) = exit {
            return Ok(code);
        }

        thread::sleep(config.frame_interval());
    }
}

/// Relay raw keyboard bytes to the child until stdin closes or the child exits
fn forward_stdin(host: &SessionHost) {
    let mut stdin = io::stdin();
    let mut buf = [0u8; 1024];

    loop {
        match stdin.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                if let Err(e) = host.send_bytes(&buf[..n]) {
                    tracing::debug!("Stopped forwarding input: {}", e);
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Reading stdin failed: {}", e);
                break;
            }
        }
    }
}

fn exit_code(code: Option<i32>) -> ExitCode {
    match code {
        Some(0) => ExitCode::SUCCESS,
        Some(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>, String> {
    let mut options = Options {
        config: default_config_path().filter(|path| path.exists()),
        cols: None,
        rows: None,
        shell: None,
        command: Vec::new(),
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => options.config = Some(PathBuf::from(required(&mut args, &arg)?)),
            "-c" | "--cols" => options.cols = Some(number(&mut args, &arg)?),
            "-r" | "--rows" => options.rows = Some(number(&mut args, &arg)?),
            "-s" | "--shell" => options.shell = Some(required(&mut args, &arg)?),
            "-h" | "--help" => return Ok(None),
            "--" => {
                options.command = args.collect();
                break;
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }
    Ok(Some(options))
}

fn required(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{} requires a value", flag))
}

fn number(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<u16, String> {
    let value = required(args, flag)?;
    match value.parse() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{} expects a positive number, got '{}'", flag, value)),
    }
}

/// Size of the terminal we are running in
fn host_terminal_size() -> Option<(u16, u16)> {
    use nix::libc;

    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some((ws.ws_col, ws.ws_row))
    } else {
        None
    }
}

/// Switches the host to its alternate screen; on drop restores the main
/// screen and resets the modes the renderer may have mirrored
struct HostScreenGuard;

impl HostScreenGuard {
    fn enter() -> io::Result<Self> {
        let mut stdout = io::stdout();
        stdout.write_all(b"\x1b[?1049h\x1b[2J")?;
        stdout.flush()?;
        Ok(Self)
    }
}

impl Drop for HostScreenGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(b"\x1b[0m\x1b[?25h\x1b[?1l\x1b[?2004l\x1b[?1049l");
        let _ = stdout.flush();
    }
}

/// Puts stdin in raw mode; restores the previous settings on drop
struct RawModeGuard {
    original: Option<nix::sys::termios::Termios>,
}

impl RawModeGuard {
    fn new() -> io::Result<Self> {
        use nix::sys::termios::{self, SetArg};

        let original = match termios::tcgetattr(io::stdin()) {
            Ok(original) => original,
            Err(nix::errno::Errno::ENOTTY) => {
                tracing::warn!("stdin is not a terminal; input is not raw");
                return Ok(Self { original: None });
            }
            Err(e) => return Err(io::Error::from(e)),
        };

        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &raw).map_err(io::Error::from)?;

        Ok(Self {
            original: Some(original),
        })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        use nix::sys::termios::{self, SetArg};

        if let Some(original) = &self.original {
            let _ = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, original);
        }
    }
}

fn print_help() {
    println!("tinyterm - a small terminal emulator");
    println!();
    println!("Usage: tinyterm [OPTIONS] [-- COMMAND [ARGS...]]");
    println!();
    println!("Options:");
    println!("      --config <PATH>  Load settings from a JSON config file");
    println!("  -c, --cols <N>       Override the terminal width");
    println!("  -r, --rows <N>       Override the terminal height");
    println!("  -s, --shell <PATH>   Shell to run (default: $SHELL or /bin/sh)");
    println!("  -h, --help           Show this help message");
    println!();
    println!("The default config file is ~/.config/tinyterm/config.json.");
}
