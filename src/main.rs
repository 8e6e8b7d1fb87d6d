mod audio;
mod config;
mod error;
mod net_link;
mod protocol;
mod session;
mod state_machine;

use std::thread;
use std::time::Duration;

use tokio::signal;
use tokio::sync::mpsc;

use audio::capture::{AudioEvent, CaptureConfig, CapturePipeline};
use audio::device::{NullSink, SilenceSource, SourceFactory};
use audio::playback::{PlaybackCommand, PlaybackQueue, playback_thread};
use audio::{Accumulator, create_decoder};
use config::Config;
use error::AgentError;
use net_link::{NetCommand, NetEvent, NetLink};
use session::SessionController;
use state_machine::SessionState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let config = Config::new().map_err(|e| anyhow::anyhow!(e))?;

    // 创建通道，用于组件间通信
    // 网络事件通道
    let (tx_net_event, mut rx_net_event) = mpsc::channel::<NetEvent>(100);

    // 网络命令通道
    let (tx_net_cmd, rx_net_cmd) = mpsc::channel::<NetCommand>(100);

    // 采集帧通道
    let (tx_audio_event, mut rx_audio_event) = mpsc::channel::<AudioEvent>(100);

    // 播放队列通道
    let (tx_playback, rx_playback) = mpsc::channel::<PlaybackCommand>(100);

    // 错误显示通道
    let (tx_error, mut rx_error) = mpsc::channel::<AgentError>(16);

    // 启动播放线程，串行播放下行音频块
    let decoder = create_decoder(config.output_format)?;
    let sink = Box::new(NullSink::new(config.output_sample_rate));
    let playback_queue = PlaybackQueue::new(decoder, sink);
    let playback_handle = thread::Builder::new()
        .name("audio-play".into())
        .spawn(move || playback_thread(rx_playback, playback_queue))?;

    // 采集管线，麦克风 -> mu-law -> 上行
    let capture_config = CaptureConfig {
        sample_rate: config.capture_sample_rate,
        frame_duration_ms: config.capture_frame_duration_ms,
    };
    let source_rate = config.capture_sample_rate;
    let source_factory: SourceFactory =
        Box::new(move || Ok(Box::new(SilenceSource::new(source_rate, 100))));
    let capture = CapturePipeline::new(capture_config, source_factory, tx_audio_event);

    // 会话控制器
    let accumulator = Accumulator::new(
        config.accumulate_threshold,
        Duration::from_millis(config.flush_max_wait_ms),
    );
    let mut controller = SessionController::new(
        accumulator,
        capture,
        tx_net_cmd,
        tx_playback,
        tx_error,
    );

    // 启动网络链接，与 Agent 服务器通信
    let net_link = NetLink::new(config.clone(), tx_net_event, rx_net_cmd);
    tokio::spawn(async move {
        net_link.run().await;
    });
    controller.connect_requested();

    log::info!("Voice agent client started. State: {:?}", controller.state());

    // 主事件循环，所有共享状态只在这里被修改
    loop {
        let flush_at = controller.flush_deadline();
        tokio::select! {
            // 监听 Ctrl+C 信号
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                controller.close().await;
                break;
            }

            // 监听与服务器的网络事件
            Some(event) = rx_net_event.recv() => {
                controller.handle_net_event(event).await;
                if controller.state() == SessionState::Closed {
                    break;
                }
            }

            // 监听采集管线产出的编码帧
            Some(event) = rx_audio_event.recv() => {
                controller.handle_audio_event(event).await;
            }

            // 错误显示
            Some(err) = rx_error.recv() => {
                log::error!("Agent error surfaced: {}", err);
            }

            // 积累超时，强制刷新到播放队列
            _ = async { tokio::time::sleep_until(flush_at.unwrap()).await }, if flush_at.is_some() => {
                controller.flush_accumulator().await;
            }
        }
    }

    // 关闭播放通道，等待播放线程退出
    drop(controller);
    let _ = playback_handle.join();
    Ok(())
}
