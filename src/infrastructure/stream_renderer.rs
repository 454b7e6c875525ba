// Renderer that forwards frames to a streaming response
use crate::application::render::{RenderFrame, Renderer};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamMessageType {
    Draw,
    Update,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamMessage {
    #[serde(rename = "type")]
    pub kind: StreamMessageType,
    pub frame: RenderFrame,
}

pub struct StreamRenderer {
    tx: mpsc::Sender<StreamMessage>,
}

impl StreamRenderer {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    async fn send(&self, kind: StreamMessageType, frame: RenderFrame) -> anyhow::Result<()> {
        self.tx
            .send(StreamMessage { kind, frame })
            .await
            .map_err(|_| anyhow::anyhow!("stream closed by client"))
    }
}

#[async_trait]
impl Renderer for StreamRenderer {
    async fn draw(&self, frame: RenderFrame) -> anyhow::Result<()> {
        self.send(StreamMessageType::Draw, frame).await
    }

    async fn update(&self, frame: RenderFrame) -> anyhow::Result<()> {
        self.send(StreamMessageType::Update, frame).await
    }
}
