use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    // Agent 服务配置
    pub ws_url: &'static str,
    pub agent_id: &'static str,
    pub api_key: &'static str,

    // 采集配置
    pub capture_sample_rate: u32,
    pub capture_frame_duration_ms: u32,

    // 下行音频流配置
    pub output_format: &'static str,
    pub output_sample_rate: u32,
    pub accumulate_threshold: usize,
    pub flush_max_wait_ms: u64,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            // Agent 服务配置
            ws_url: env!("WS_URL"),
            agent_id: env!("AGENT_ID"),
            api_key: env!("API_KEY"),

            // 采集配置
            capture_sample_rate: env!("CAPTURE_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse CAPTURE_SAMPLE_RATE")?,
            capture_frame_duration_ms: env!("CAPTURE_FRAME_DURATION_MS").parse()
                .map_err(|_| "Failed to parse CAPTURE_FRAME_DURATION_MS")?,

            // 下行音频流配置
            output_format: env!("OUTPUT_FORMAT"),
            output_sample_rate: env!("OUTPUT_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse OUTPUT_SAMPLE_RATE")?,
            accumulate_threshold: env!("ACCUMULATE_THRESHOLD").parse()
                .map_err(|_| "Failed to parse ACCUMULATE_THRESHOLD")?,
            flush_max_wait_ms: env!("FLUSH_MAX_WAIT_MS").parse()
                .map_err(|_| "Failed to parse FLUSH_MAX_WAIT_MS")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}
