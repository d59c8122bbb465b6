use clap::Parser;
use core::sync::atomic::{AtomicUsize, Ordering};
use embassy_executor::{Executor, Spawner};
use rrc_core::mk_static;
use rrc_core::utils::connection::transport::{self, post, Notice, Transport, TransportError};
use rrc_core::utils::connection::{NOTICES, OUTBOX};
use rrc_core::utils::controllers::{
    DriveMode, Dispatcher, InputEvent, MotorCommand, Outcome, ServoRequest,
};
use rrc_core::utils::{Duration, Instant, JoystickConfig, Timer};
use serde::Deserialize;
use static_cell::StaticCell;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts
{
    /// JSON-lines input script; each line is `{"at_ms": .., "ev": .., ...}`
    #[clap(long)]
    script: Option<PathBuf>,
    /// JSON joystick configuration (camelCase fields, all optional)
    #[clap(long)]
    config: Option<PathBuf>,
    /// Initial drive mode
    #[clap(long, default_value = "drive")]
    mode: String,
    /// Fail every Nth request to exercise failure reporting (0 = never)
    #[clap(long, default_value_t = 0)]
    fail_every: usize,
}

/// One scripted input event and when to deliver it, relative to start.
#[derive(Debug, Deserialize)]
struct ScriptStep {
    at_ms: u64,
    #[serde(flatten)]
    event: InputEvent,
}

/// Transport that logs each request as the HTTP call the browser would make.
struct LogTransport {
    worker: usize,
    fail_every: usize,
}

static REQUESTS: AtomicUsize = AtomicUsize::new(0);

impl LogTransport {
    fn post(
        &self,
        path: &str,
        body: Result<String, serde_json::Error>,
    ) -> Result<(), TransportError> {
        let n = REQUESTS.fetch_add(1, Ordering::Relaxed) + 1;
        let body = body.map_err(|e| TransportError::Rejected(e.to_string()))?;
        if self.fail_every > 0 && n % self.fail_every == 0 {
            return Err(TransportError::Unreachable(format!("request #{n} dropped")));
        }
        info!(worker = self.worker, "POST {} {}", path, body);
        Ok(())
    }
}

impl Transport for LogTransport {
    async fn send_motors(
        &mut self,
        command: &MotorCommand,
    ) -> Result<(), TransportError> {
        // stand-in for network latency
        Timer::after(Duration::from_millis(15)).await;
        self.post("/api/motor", serde_json::to_string(command))
    }

    async fn send_servo(
        &mut self,
        request: &ServoRequest,
    ) -> Result<(), TransportError> {
        Timer::after(Duration::from_millis(5)).await;
        self.post("/api/servo", serde_json::to_string(request))
    }
}

#[embassy_executor::task(pool_size = 2)]
async fn transport_task(link: LogTransport) -> ! {
    transport::run(link, &OUTBOX, &NOTICES).await
}

#[embassy_executor::task]
async fn notice_task() -> ! {
    loop {
        match NOTICES.receive().await {
            Notice::Delivered(command) => tracing::trace!(path = command.path(), "delivered"),
            Notice::Failed { command, error } => {
                warn!("{} failed: {}", command.path(), error);
            }
        }
    }
}

#[embassy_executor::task]
async fn main_task(
    spawner: Spawner,
    opts: Opts,
) {
    let config = match load_config(&opts) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    let script = match load_script(&opts) {
        Ok(script) => script,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    let mode = match serde_json::from_str::<DriveMode>(&format!("\"{}\"", opts.mode)) {
        Ok(mode) => mode,
        Err(_) => {
            error!("unknown drive mode `{}`", opts.mode);
            std::process::exit(2);
        }
    };

    for worker in 0..2 {
        let link = LogTransport {
            worker,
            fail_every: opts.fail_every,
        };
        spawner.spawn(transport_task(link)).unwrap();
    }
    spawner.spawn(notice_task()).unwrap();

    let dispatcher = mk_static!(Dispatcher, Dispatcher::with_mode(config, mode));
    info!(?config, %mode, steps = script.len(), "replaying input");

    let start = Instant::now();
    for step in script {
        Timer::at(start + Duration::from_millis(step.at_ms)).await;
        match dispatcher.handle(step.event, Instant::now()) {
            Outcome::Dispatched(dispatch) => {
                let r = dispatch.readout;
                info!(
                    x = r.joystick.x(),
                    y = r.joystick.y(),
                    motors = ?r.motors.map(|m| m.speeds()),
                    servos = ?r.servos.map(|s| s.0),
                    "readout"
                );
                let queued = post(&dispatch, &OUTBOX);
                tracing::debug!(queued, pending = OUTBOX.len(), "posted");
            }
            Outcome::Throttled(joy) => {
                tracing::trace!(x = joy.x(), y = joy.y(), "throttled");
            }
            Outcome::ModeChanged(mode) => info!("mode: {}", mode),
        }
    }

    // let the workers drain before exiting
    Timer::after(Duration::from_millis(500)).await;
    info!(requests = REQUESTS.load(Ordering::Relaxed), "script finished");
    std::process::exit(0);
}

fn load_config(opts: &Opts) -> Result<JoystickConfig, String> {
    let Some(path) = &opts.config else {
        return Ok(JoystickConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    JoystickConfig::from_json(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn load_script(opts: &Opts) -> Result<Vec<ScriptStep>, String> {
    let Some(path) = &opts.script else {
        return Ok(demo_script());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| format!("{}:{}: {}", path.display(), i + 1, e))
        })
        .collect()
}

/// Drag the stick around a circle at pointer rate (~60 Hz) in each of the three
/// browser modes, releasing between them.
fn demo_script() -> Vec<ScriptStep> {
    let mut steps = Vec::new();
    let mut at_ms = 0;
    for mode in [DriveMode::Drive, DriveMode::Servo, DriveMode::Mixed] {
        steps.push(ScriptStep {
            at_ms,
            event: InputEvent::Mode { mode },
        });
        for i in 0..60u32 {
            let a = i as f32 / 60.0 * core::f32::consts::TAU;
            at_ms += 16;
            steps.push(ScriptStep {
                at_ms,
                event: InputEvent::Pointer {
                    dx: a.cos() * 80.0,
                    dy: a.sin() * 80.0,
                },
            });
        }
        at_ms += 16;
        steps.push(ScriptStep {
            at_ms,
            event: InputEvent::Release,
        });
        at_ms += 200;
    }
    steps
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let opts: Opts = Opts::parse();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner, opts)).unwrap();
    });
}
