use crate::console::buffer::{Closed, OutputBuffer};
use crate::console::{Console, Stdio};
use crate::error::{ConsoleError, ConsoleResult};
use crate::model::{ConsoleConfig, ScreenSnapshot};
use crate::signal::Signal;
use crate::terminal::Terminal;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::pty::{openpty, Winsize};
use nix::sys::termios::Termios;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Sleep between reads when the master has nothing to offer.
const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// How long `close` lets the reader drain what is already buffered.
const CLOSE_GRACE: Duration = Duration::from_millis(200);
/// Attempts before a write that keeps hitting `WouldBlock` is abandoned.
const MAX_WRITE_RETRIES: u32 = 1_000;

type SharedWriter = Arc<Mutex<Option<Box<dyn Write + Send>>>>;

/// Program to run on a pseudo-terminal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Command to execute (absolute path recommended).
    pub command: String,
    /// Command arguments.
    pub args: Vec<String>,
    /// Working directory.
    pub cwd: Option<String>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Command with no arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Console backed by a real pseudo-terminal.
///
/// A background thread drains the master side into a shared buffer, keeps a
/// `vt100` screen up to date and, when configured, answers cursor-position
/// queries the way an interactive terminal would.
pub struct PtyConsole {
    output: Arc<OutputBuffer>,
    writer: SharedWriter,
    device: Mutex<Option<OwnedFd>>,
    master: Mutex<Option<Box<dyn MasterPty + Send>>>,
    terminal: Arc<Mutex<Terminal>>,
    shutdown: Arc<AtomicBool>,
    drained: Signal,
    config: ConsoleConfig,
}

impl PtyConsole {
    /// Open a pseudo-terminal pair for code running in this process.
    ///
    /// The slave side is handed out through [`Console::tty`].
    pub fn open(config: ConsoleConfig) -> ConsoleResult<Self> {
        let winsize = Winsize {
            ws_row: config.size.rows,
            ws_col: config.size.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let pair = openpty(Some(&winsize), None::<&Termios>)
            .map_err(|err| ConsoleError::open("open pty", err))?;
        set_nonblocking(pair.master.as_raw_fd())?;

        let reader = pair
            .master
            .try_clone()
            .map_err(|err| ConsoleError::io("clone pty reader", err))?;
        let console = Self::assemble(Box::new(File::from(pair.master)), config, None);
        *console.device.lock().unwrap_or_else(PoisonError::into_inner) = Some(pair.slave);
        console.start_reader(Box::new(File::from(reader)))?;
        tracing::debug!(
            rows = console.config.size.rows,
            cols = console.config.size.cols,
            "opened in-process pty"
        );
        Ok(console)
    }

    /// Spawn `spec` on a new pseudo-terminal and return the console with the child.
    ///
    /// `NO_COLOR` is exported to the child unless color is enabled.
    pub fn spawn(
        spec: &CommandSpec,
        config: ConsoleConfig,
    ) -> ConsoleResult<(Self, Box<dyn Child + Send + Sync>)> {
        let pair = native_pty_system()
            .openpty(PtySize {
                rows: config.size.rows,
                cols: config.size.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| ConsoleError::open("open pty", err))?;

        let mut cmd = CommandBuilder::new(&spec.command);
        cmd.args(&spec.args);
        if let Some(cwd) = &spec.cwd {
            cmd.cwd(cwd);
        }
        if !config.color {
            cmd.env("NO_COLOR", "1");
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|err| ConsoleError::open("spawn command", err))?;
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|err| ConsoleError::open("clone pty reader", err))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|err| ConsoleError::open("take pty writer", err))?;
        if let Some(fd) = pair.master.as_raw_fd() {
            set_nonblocking(fd)?;
        }

        let console = Self::assemble(writer, config, Some(pair.master));
        console.start_reader(reader)?;
        tracing::debug!(command = %spec.command, pid = ?child.process_id(), "spawned on pty");
        Ok((console, child))
    }

    fn assemble(
        writer: Box<dyn Write + Send>,
        config: ConsoleConfig,
        master: Option<Box<dyn MasterPty + Send>>,
    ) -> Self {
        Self {
            output: Arc::new(OutputBuffer::default()),
            writer: Arc::new(Mutex::new(Some(writer))),
            device: Mutex::new(None),
            master: Mutex::new(master),
            terminal: Arc::new(Mutex::new(Terminal::new(config.size))),
            shutdown: Arc::new(AtomicBool::new(false)),
            drained: Signal::new(),
            config,
        }
    }

    fn start_reader(&self, reader: Box<dyn Read + Send>) -> ConsoleResult<()> {
        let pump = Pump {
            output: Arc::clone(&self.output),
            writer: Arc::clone(&self.writer),
            terminal: Arc::clone(&self.terminal),
            shutdown: Arc::clone(&self.shutdown),
            drained: self.drained.clone(),
            answer_cursor_queries: self.config.answer_cursor_queries,
        };
        thread::Builder::new()
            .name("promptbox-pty-reader".to_string())
            .spawn(move || pump.run(reader))
            .map_err(|err| ConsoleError::io("spawn pty reader", err))?;
        Ok(())
    }

    /// Everything the program has written so far, lossily decoded.
    pub fn raw_output(&self) -> String {
        self.output.raw()
    }

    /// Current emulated screen.
    pub fn screen(&self) -> ScreenSnapshot {
        self.terminal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Console settings in effect.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }
}

impl Console for PtyConsole {
    fn send(&self, text: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(writer) = writer.as_mut() else {
            tracing::warn!(text, "send on a closed console");
            return;
        };
        if let Err(err) = write_fully(writer.as_mut(), text.as_bytes()) {
            tracing::warn!(text, error = %err, "failed to send to console");
        }
    }

    fn expect_string(&self, pattern: &str) -> ConsoleResult<String> {
        self.output.expect(pattern, self.config.expect_timeout)
    }

    fn expect_eof(&self) -> ConsoleResult<String> {
        self.output.expect_eof(self.config.expect_timeout)
    }

    fn tty(&self) -> ConsoleResult<Stdio> {
        let device = self.device.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(device) = device.as_ref() else {
            return Err(ConsoleError::Closed);
        };
        Stdio::from_device(device, self.config.color)
            .map_err(|err| ConsoleError::io("duplicate tty", err))
    }

    fn close_tty(&self) {
        drop(
            self.device
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
    }

    fn close(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        self.close_tty();
        if !self.drained.wait_timeout(CLOSE_GRACE) {
            tracing::debug!("pty reader still busy at close");
        }
        self.output.close(Closed::Harness);
        drop(
            self.writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        drop(
            self.master
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
    }
}

impl Drop for PtyConsole {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reader loop state, moved onto the reader thread.
struct Pump {
    output: Arc<OutputBuffer>,
    writer: SharedWriter,
    terminal: Arc<Mutex<Terminal>>,
    shutdown: Arc<AtomicBool>,
    drained: Signal,
    answer_cursor_queries: bool,
}

impl Pump {
    fn run(self, mut reader: Box<dyn Read + Send>) {
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(count) => match chunk.get(..count) {
                    Some(bytes) => self.observe(bytes),
                    None => break,
                },
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    if self.shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    // EIO is how Linux reports that every slave handle is gone.
                    if err.raw_os_error() != Some(nix::errno::Errno::EIO as i32) {
                        tracing::debug!(error = %err, "pty read failed");
                    }
                    break;
                }
            }
        }
        self.output.close(Closed::Eof);
        self.drained.notify();
    }

    fn observe(&self, bytes: &[u8]) {
        let (queries, cursor) = {
            let mut terminal = self.terminal.lock().unwrap_or_else(PoisonError::into_inner);
            let queries = terminal.process_bytes(bytes);
            (queries, terminal.cursor())
        };
        if self.answer_cursor_queries && queries > 0 {
            let report = cursor.position_report().repeat(queries);
            let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(writer) = writer.as_mut() {
                if let Err(err) = write_fully(writer.as_mut(), report.as_bytes()) {
                    tracing::warn!(error = %err, "failed to answer cursor query");
                }
            }
        }
        self.output.push(bytes);
    }
}

fn set_nonblocking(fd: RawFd) -> ConsoleResult<()> {
    let flags = OFlag::from_bits_truncate(
        fcntl(fd, FcntlArg::F_GETFL)
            .map_err(|err| ConsoleError::open("get pty flags", err))?,
    );
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))
        .map_err(|err| ConsoleError::open("set pty nonblocking", err))?;
    Ok(())
}

/// `write_all` for a non-blocking descriptor.
fn write_fully(writer: &mut (dyn Write + Send), mut bytes: &[u8]) -> std::io::Result<()> {
    let mut retries = 0;
    while !bytes.is_empty() {
        match writer.write(bytes) {
            Ok(0) => return Err(ErrorKind::WriteZero.into()),
            Ok(count) => bytes = bytes.get(count..).unwrap_or_default(),
            Err(err) if err.kind() == ErrorKind::WouldBlock && retries < MAX_WRITE_RETRIES => {
                retries += 1;
                thread::sleep(Duration::from_millis(1));
            }
            Err(err) if err.kind() == ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    writer.flush()
}
