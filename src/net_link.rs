use crate::config::Config;
use crate::protocol::{ServerMessage, SetupMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

#[derive(Debug)]
pub enum NetEvent {
    Connected,
    Message(ServerMessage),
    Disconnected,
}

#[derive(Debug)]
pub enum NetCommand {
    SendText(String),
}

pub struct NetLink {
    config: Config,
    tx: mpsc::Sender<NetEvent>,
    rx_cmd: mpsc::Receiver<NetCommand>,
}

impl NetLink {
    pub fn new(config: Config, tx: mpsc::Sender<NetEvent>, rx_cmd: mpsc::Receiver<NetCommand>) -> Self {
        Self { config, tx, rx_cmd }
    }

    // 连接断开即会话结束，不做自动重连
    pub async fn run(mut self) {
        if let Err(e) = self.connect_and_loop().await {
            log::error!("Connection error: {}", e);
        }
        let _ = self.tx.send(NetEvent::Disconnected).await;
    }

    // 进入连接和主循环，处理WebSocket消息和发送命令
    async fn connect_and_loop(&mut self) -> anyhow::Result<()> {
        // agentId 作为查询参数放在连接 URL 中
        let mut url = Url::parse(self.config.ws_url)?;
        url.query_pairs_mut()
            .append_pair("agentId", self.config.agent_id);

        log::info!("Connecting to {}...", self.config.ws_url);
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        log::info!("Connected!");

        let (mut write, mut read) = ws_stream.split();

        // 发送 Setup 消息进行初始化，声明鉴权和下行音频格式
        let setup = SetupMessage::new(
            self.config.api_key,
            self.config.output_format,
            self.config.output_sample_rate,
        );
        let setup_json = serde_json::to_string(&setup)?;
        write.send(Message::Text(setup_json.into())).await?;

        self.tx.send(NetEvent::Connected).await?;

        // 主循环，处理读取和写入
        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(msg)) => {
                            match msg {
                                Message::Text(text) => {
                                    // 无法识别的消息只记录日志，不影响会话
                                    match serde_json::from_str::<ServerMessage>(&text) {
                                        Ok(parsed) => {
                                            self.tx.send(NetEvent::Message(parsed)).await?;
                                        }
                                        Err(e) => {
                                            log::warn!("Ignoring malformed server message: {} ({})", text, e);
                                        }
                                    }
                                }
                                Message::Binary(data) => {
                                    log::warn!("Ignoring unexpected binary frame: {} bytes", data.len());
                                }
                                Message::Close(frame) => {
                                    log::info!("Server closed connection: {:?}", frame);
                                    return Err(anyhow::anyhow!("Connection closed"));
                                }
                                _ => {}
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(anyhow::anyhow!("Connection closed")),
                    }
                }
                Some(cmd) = self.rx_cmd.recv() => {
                    match cmd {
                        NetCommand::SendText(text) => {
                            write.send(Message::Text(text.into())).await?;
                        }
                    }
                }
                else => break,
            }
        }
        Ok(())
    }
}
