use cmdbridge::error::HandlerError;
use example_cmdbridge_command_definition::{CreateRectangleParams, DocumentInfo, NodeRef};
use tokio::sync::Mutex;

/// The document-model collaborator the example handlers operate on.
///
/// Handlers only ever see it through this trait; the real design-tool API
/// would sit behind an implementation living inside the sandbox.
#[async_trait::async_trait]
pub trait DocumentModel: Send + Sync {
    async fn info(&self) -> DocumentInfo;

    async fn create_rectangle(
        &self,
        params: CreateRectangleParams,
    ) -> Result<NodeRef, HandlerError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A document held entirely in memory.
pub struct InMemoryDocument {
    name: String,
    max_nodes: usize,
    nodes: Mutex<Vec<Rectangle>>,
}

impl InMemoryDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, usize::MAX)
    }

    /// A document that refuses to grow past `max_nodes`.
    pub fn with_capacity(name: impl Into<String>, max_nodes: usize) -> Self {
        Self {
            name: name.into(),
            max_nodes,
            nodes: Mutex::new(Vec::new()),
        }
    }

    pub async fn nodes(&self) -> Vec<Rectangle> {
        self.nodes.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl DocumentModel for InMemoryDocument {
    async fn info(&self) -> DocumentInfo {
        DocumentInfo {
            name: self.name.clone(),
            node_count: self.nodes.lock().await.len(),
        }
    }

    async fn create_rectangle(
        &self,
        params: CreateRectangleParams,
    ) -> Result<NodeRef, HandlerError> {
        let mut nodes = self.nodes.lock().await;
        if nodes.len() >= self.max_nodes {
            return Err(HandlerError::new(format!(
                "document `{}` is full ({} nodes)",
                self.name, self.max_nodes
            )));
        }

        let id = format!("1:{}", nodes.len() + 1);
        let name = params
            .name
            .unwrap_or_else(|| format!("Rectangle {}", nodes.len() + 1));
        nodes.push(Rectangle {
            id: id.clone(),
            name: name.clone(),
            x: params.x,
            y: params.y,
            width: params.width,
            height: params.height,
        });

        Ok(NodeRef { id, name })
    }
}
