use std::fs;
use std::path::Path;
use serde::Deserialize;

#[derive(Deserialize)]
struct Config {
    agent: Agent,
    capture: Capture,
    stream: Stream,
}

#[derive(Deserialize)]
struct Agent {
    ws_url: String,
    agent_id: String,
    api_key: String,
}

#[derive(Deserialize)]
struct Capture {
    sample_rate: u32,
    frame_duration_ms: u32,
}

#[derive(Deserialize)]
struct Stream {
    output_format: String,
    output_sample_rate: u32,
    accumulate_threshold: usize,
    flush_max_wait_ms: u64,
}

// 在编译时读取 config.toml 并设置环境变量
fn main() {
    println!("cargo:rerun-if-changed=config.toml");

    let config_path = Path::new("config.toml");
    if !config_path.exists() {
        panic!("config.toml not found!");
    }

    let config_str = fs::read_to_string(config_path).expect("Failed to read config.toml");
    let config: Config = toml::from_str(&config_str).expect("Failed to parse config.toml");

    // Agent 服务配置
    println!("cargo:rustc-env=WS_URL={}", config.agent.ws_url);
    println!("cargo:rustc-env=AGENT_ID={}", config.agent.agent_id);
    println!("cargo:rustc-env=API_KEY={}", config.agent.api_key);

    // 采集配置
    println!("cargo:rustc-env=CAPTURE_SAMPLE_RATE={}", config.capture.sample_rate);
    println!("cargo:rustc-env=CAPTURE_FRAME_DURATION_MS={}", config.capture.frame_duration_ms);

    // 下行音频流配置
    println!("cargo:rustc-env=OUTPUT_FORMAT={}", config.stream.output_format);
    println!("cargo:rustc-env=OUTPUT_SAMPLE_RATE={}", config.stream.output_sample_rate);
    println!("cargo:rustc-env=ACCUMULATE_THRESHOLD={}", config.stream.accumulate_threshold);
    println!("cargo:rustc-env=FLUSH_MAX_WAIT_MS={}", config.stream.flush_max_wait_ms);
}
