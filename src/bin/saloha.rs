//! Slotted ALOHA 仿真
//!
//! 读取配置（JSON 或原始的顺序文本格式），运行仿真并输出统计报告。
//! 出现任何致命错误时，若已开始累计统计则先输出部分统计，再以失败状态退出。

use clap::{ArgGroup, Parser};
use saloha_rs::cra::Algorithm;
use saloha_rs::sim::{SimConfig, SimError, SlottedAloha};
use saloha_rs::stats::Report;
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing::error;

#[derive(Debug, Parser)]
#[command(
    name = "saloha",
    about = "Slotted ALOHA 仿真：评估冲突解决算法在给定负载下的时延、队长与吞吐"
)]
#[command(group(ArgGroup::new("source").required(true).args(["config", "input"])))]
struct Args {
    /// JSON 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 原始顺序文本格式的输入文件
    #[arg(long)]
    input: Option<PathBuf>,

    /// 覆盖随机种子（0 表示使用系统时钟）
    #[arg(long)]
    seed: Option<u64>,

    /// 覆盖冲突解决算法：D / P / B / O
    #[arg(long)]
    algorithm: Option<char>,

    /// 覆盖归一化负载 ρ
    #[arg(long)]
    load: Option<f64>,

    /// 覆盖站点数
    #[arg(long)]
    stations: Option<usize>,

    /// 把报告以 JSON 写入该文件
    #[arg(long)]
    report_json: Option<PathBuf>,
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("[ERROR] {msg}");
    process::exit(1);
}

fn load_config(args: &Args) -> Result<SimConfig, SimError> {
    let (path, json) = match (&args.config, &args.input) {
        (Some(p), _) => (p, true),
        (None, Some(p)) => (p, false),
        (None, None) => fail("either --config or --input is required"),
    };
    let raw = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("cannot read {}: {e}", path.display())));
    let mut cfg = if json {
        SimConfig::from_json(&raw)?
    } else {
        SimConfig::from_ordered_text(&raw)?
    };

    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(tag) = args.algorithm {
        cfg.algorithm = Algorithm::try_from(tag)?;
    }
    if let Some(load) = args.load {
        cfg.load = load;
    }
    if let Some(stations) = args.stations {
        cfg.stations = stations;
    }
    Ok(cfg)
}

fn write_report_json(path: &PathBuf, report: &Report) {
    let json = serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| fail(format!("serialize report: {e}")));
    fs::write(path, json).unwrap_or_else(|e| fail(format!("write {}: {e}", path.display())));
}

fn main() {
    // 初始化 tracing（日志写到 stderr，报告写到 stdout）
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let cfg = load_config(&args).unwrap_or_else(|e| fail(e));
    let mut sim = SlottedAloha::new(cfg).unwrap_or_else(|e| fail(e));

    if let Err(e) = sim.run() {
        error!(kind = ?e.kind(), slot = sim.slot().0, "仿真中止: {e}");
        // 运行阶段的错误一定发生在统计开始累计之后
        let report = sim.report();
        println!("{report}");
        if let Some(path) = &args.report_json {
            write_report_json(path, &report);
        }
        fail(e);
    }

    let report = sim.report();
    println!("{report}");
    if let Some(path) = &args.report_json {
        write_report_json(path, &report);
    }
}
