//! 云台力矩控制守护进程
//!
//! 启动后打开串口、发现并配置两个舵机，然后在主线程上运行
//! 250 Hz 控制循环。目标位置指令从 stdin 逐行读入（JSON），
//! 遥测快照每秒一行输出到 stdout。Ctrl-C 触发有序关停：循环
//! 退出前关断所有关节力矩。
//!
//! 指令格式：
//!
//! ```text
//! {"joint": "pan", "goal_position": 0.5, "unit": "rad"}
//! {"joint": "tilt", "goal_position": 2048}
//! ```

mod config;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use pantilt_bus::SerialBus;
use pantilt_control::{
    AtomicLoopState, CommandIntake, ControlLoop, GoalCommand, GoalStore, GravityFeedforward,
    GravityPdController, Joint, JointArray, LoopConfig, LoopState, TelemetryReader,
    configure_servos, telemetry_channel,
};
use pantilt_driver::DynamixelPort;
use pantilt_protocol::ModelInfo;

use config::DaemonConfig;

/// 云台力矩控制守护进程
#[derive(Parser, Debug)]
#[command(name = "pantiltd")]
#[command(about = "Gravity-compensated torque control daemon for a pan/tilt servo pair")]
struct Args {
    /// 配置文件路径（TOML），缺省使用内置默认值
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 串口设备路径，覆盖配置文件
    #[arg(long)]
    device: Option<String>,

    /// 提高日志详细程度（-v debug, -vv trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// 指令接入线程：stdin 逐行 JSON → 目标位置存储
fn spawn_intake(goals: Arc<GoalStore>, models: JointArray<ModelInfo>, state: Arc<AtomicLoopState>) {
    std::thread::spawn(move || {
        let intake = CommandIntake::new(goals, models);
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            if state.get(Ordering::Relaxed) == LoopState::ShuttingDown {
                break;
            }
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<GoalCommand>(trimmed) {
                Ok(command) => {
                    let accepted = intake.handle(&command);
                    println!(
                        "{}",
                        serde_json::json!({
                            "ack": { "joint": command.joint, "accepted": accepted }
                        })
                    );
                }
                Err(err) => warn!(%err, "discarding malformed goal command"),
            }
        }
    });
}

/// 遥测输出线程：每秒把最新快照打印为一行 JSON
fn spawn_telemetry_printer(reader: TelemetryReader, state: Arc<AtomicLoopState>) {
    std::thread::spawn(move || {
        let mut last_cycle = 0;
        while state.get(Ordering::Relaxed) == LoopState::Running {
            std::thread::sleep(Duration::from_secs(1));
            let snapshot = reader.latest();
            if snapshot.cycle == last_cycle {
                continue;
            }
            last_cycle = snapshot.cycle;
            match serde_json::to_string(&*snapshot) {
                Ok(json) => println!("{json}"),
                Err(err) => warn!(%err, "telemetry serialization failed"),
            }
        }
    });
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => DaemonConfig::load(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(device) = args.device {
        config.device = device;
    }

    let bus = SerialBus::open(&config.device, config.baud_rate)
        .with_context(|| format!("failed to open serial port {}", config.device))?;
    let mut port = DynamixelPort::new(bus);

    let ids = JointArray::from([config.pan_id, config.tilt_id]);
    let models = configure_servos(&mut port, &ids).context("servo startup failed")?;
    for joint in Joint::ALL {
        info!(joint = %joint, id = ids[joint], model = models[joint].name, "joint ready");
    }

    let goals = Arc::new(GoalStore::new());
    let state = Arc::new(AtomicLoopState::default());
    {
        let state = state.clone();
        ctrlc::set_handler(move || {
            info!("shutdown requested");
            state.set(LoopState::ShuttingDown, Ordering::Relaxed);
        })
        .context("failed to install signal handler")?;
    }

    let mut controller = GravityPdController::new(models, 1.0 / config.rate_hz)
        .with_gains(config.p_gain, config.d_gain);
    if let Some(load) = config.tilt_load {
        controller = controller.with_feedforward(
            Joint::Tilt,
            GravityFeedforward {
                mass_kg: load.mass_kg,
                gravity_mps2: load.gravity_mps2,
                link_length_m: load.link_length_m,
            },
        );
    }

    let (publisher, reader) = telemetry_channel();
    spawn_intake(goals.clone(), models, state.clone());
    spawn_telemetry_printer(reader, state.clone());

    let loop_config = LoopConfig {
        rate_hz: config.rate_hz,
        max_cycles: None,
    };
    let control_loop =
        ControlLoop::new(port, controller, ids, goals, state, publisher, loop_config)?;
    let counters = control_loop.run()?;

    info!(
        cycles = counters.cycles,
        read_failures = counters.read_failures,
        write_failures = counters.write_failures,
        overruns = counters.overruns,
        "daemon exiting"
    );
    Ok(())
}
