use anyhow::{Context, anyhow};
use bevel::{
    Shell,
    backend::{
        headless::{HeadlessBackend, HeadlessRenderer},
        script::{ScriptEvent, ScriptOutcome},
    },
    config::{self, RuntimeConfig},
    status::{SharedStatus, SysfsPaths, spawn_sysfs_poller},
};
use calloop::{
    EventLoop, LoopSignal,
    channel::{self, Sender},
    timer::{TimeoutAction, Timer},
};
use std::{
    backtrace::Backtrace,
    fs,
    io::{BufRead, BufReader, Read},
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

enum ScriptMessage {
    Event { line_number: usize, event: ScriptEvent },
    Error(String),
}

struct Session {
    shell: Shell<HeadlessBackend>,
    renderer: HeadlessRenderer,
    signal: LoopSignal,
    started: Instant,
    needs_redraw: bool,
    frames: u64,
    failed: Option<String>,
}

impl Session {
    fn now(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    fn render(&mut self) {
        self.renderer.clear_draws();
        let output = self.shell.output_size;
        let draw_calls = self.shell.render_frame(&mut self.renderer, output);
        self.frames += 1;
        self.needs_redraw = false;
        tracing::trace!(frame = self.frames, draw_calls, "frame presented");
    }

    fn handle_message(&mut self, message: ScriptMessage) {
        match message {
            ScriptMessage::Event { line_number, event } => {
                tracing::trace!(line_number, ?event, "script event");
                let time = self.now();
                match event.apply(&mut self.shell, time) {
                    ScriptOutcome::Continue => self.needs_redraw = true,
                    ScriptOutcome::Render => self.render(),
                    ScriptOutcome::Print(text) => print!("{text}"),
                }
                if !self.shell.is_running() {
                    self.signal.stop();
                }
            }
            ScriptMessage::Error(err) => {
                tracing::error!("{err}");
                self.failed = Some(err);
                self.signal.stop();
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_backtrace_defaults();
    init_logging()?;
    std::panic::set_hook(Box::new(|panic_info| {
        let backtrace = Backtrace::force_capture();
        tracing::error!("panic: {panic_info}\n{backtrace}");
        eprintln!("panic: {panic_info}\n{backtrace}");
    }));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let spawn_processes = args.iter().any(|arg| arg == "--spawn");
    let script_path = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .map(PathBuf::from);

    let (config, config_path) = match config::load_or_create_default() {
        Ok(loaded) => (loaded.config, Some(loaded.path)),
        Err(err) => {
            tracing::warn!("using built-in defaults: {err}");
            (RuntimeConfig::default(), None)
        }
    };

    let backend = if spawn_processes {
        HeadlessBackend::new().spawning_processes()
    } else {
        HeadlessBackend::new()
    };

    let paths = SysfsPaths::discover();
    let status = SharedStatus::new(paths.backlight.clone());
    let poller_running = Arc::new(AtomicBool::new(true));
    let poller = spawn_sysfs_poller(paths, status.handle(), Arc::clone(&poller_running))
        .map_err(|err| tracing::warn!("status poller unavailable: {err}"))
        .ok();

    let mut shell = Shell::new(backend, config).with_status(Box::new(status));
    if let Some(path) = config_path {
        shell = shell.with_config_path(path);
    }

    let mut event_loop: EventLoop<Session> =
        EventLoop::try_new().context("failed to create event loop")?;
    let handle = event_loop.handle();

    let (sender, messages) = channel::channel::<ScriptMessage>();
    handle
        .insert_source(messages, |event, _, session| match event {
            channel::Event::Msg(message) => session.handle_message(message),
            channel::Event::Closed => {
                tracing::info!("script finished");
                session.signal.stop();
            }
        })
        .map_err(|err| anyhow!("failed to register script channel: {err}"))?;

    handle
        .insert_source(Timer::from_duration(FRAME_INTERVAL), |_, _, session| {
            if session.needs_redraw {
                session.render();
            }
            TimeoutAction::ToDuration(FRAME_INTERVAL)
        })
        .map_err(|err| anyhow!("failed to register frame timer: {err}"))?;

    handle
        .insert_source(
            Timer::from_duration(Duration::from_millis(700)),
            |_, _, session| {
                session.shell.run_autostart();
                TimeoutAction::Drop
            },
        )
        .map_err(|err| anyhow!("failed to schedule startup tasks: {err}"))?;

    spawn_script_reader(script_path, sender)?;

    let mut session = Session {
        shell,
        renderer: HeadlessRenderer::new(),
        signal: event_loop.get_signal(),
        started: Instant::now(),
        needs_redraw: true,
        frames: 0,
        failed: None,
    };

    event_loop
        .run(None, &mut session, |_| {})
        .context("event loop failed")?;

    poller_running.store(false, Ordering::Release);
    drop(poller);

    if session.needs_redraw {
        session.render();
    }
    tracing::info!(frames = session.frames, "session ended");
    print!("{}", session.shell.render_clients_report());

    match session.failed {
        Some(err) => Err(anyhow!(err)),
        None => Ok(()),
    }
}

/// Read the script on its own thread so a slow pipe never stalls frames.
fn spawn_script_reader(path: Option<PathBuf>, sender: Sender<ScriptMessage>) -> anyhow::Result<()> {
    let reader: Box<dyn Read + Send> = match &path {
        Some(path) => Box::new(
            fs::File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?,
        ),
        None => Box::new(std::io::stdin()),
    };

    std::thread::Builder::new()
        .name("bevel-script".to_owned())
        .spawn(move || {
            for (index, line) in BufReader::new(reader).lines().enumerate() {
                let line_number = index + 1;
                let message = match line {
                    Ok(line) => match ScriptEvent::parse(&line) {
                        Ok(Some(event)) => ScriptMessage::Event { line_number, event },
                        Ok(None) => continue,
                        Err(err) => ScriptMessage::Error(format!("line {line_number}: {err}")),
                    },
                    Err(err) => ScriptMessage::Error(format!("failed to read script: {err}")),
                };
                let stop = matches!(message, ScriptMessage::Error(_));
                if sender.send(message).is_err() || stop {
                    return;
                }
            }
        })
        .context("failed to start script reader")?;
    Ok(())
}

fn init_backtrace_defaults() {
    if std::env::var_os("RUST_BACKTRACE").is_none() {
        // Safety: called at startup before creating any threads.
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }
    if std::env::var_os("RUST_LIB_BACKTRACE").is_none() {
        // Safety: called at startup before creating any threads.
        unsafe { std::env::set_var("RUST_LIB_BACKTRACE", "0") };
    }
}

const DEFAULT_LOG_FILTER: &str = concat!(
    "bevel=debug,",
    "bevel::render=info,",
    "bevel::input=debug,",
    "cosmic_text=warn"
);

fn init_logging() -> anyhow::Result<()> {
    let log_dir: PathBuf = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("log");
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "bevel.log");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_appender),
        )
        .init();

    let log_file = log_dir.join("bevel.log");
    tracing::info!(path = %log_file.display(), "logging initialized");

    Ok(())
}
