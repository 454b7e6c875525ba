// Graph session - one drawn graph with its refresh timer
use crate::application::fetch::DataFetcher;
use crate::application::refresh::RefreshScheduler;
use crate::application::render::{RenderPass, RenderSettings, Renderer};
use crate::domain::error::GraphError;
use crate::domain::graph::GraphConfig;
use std::ops::ControlFlow;
use std::sync::Arc;

/// How a successful draw ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The graph has no targets; nothing was fetched or drawn
    Empty,
    Rendered,
}

pub struct GraphSession {
    graph: GraphConfig,
    fetcher: Arc<DataFetcher>,
    renderer: Arc<dyn Renderer>,
    settings: RenderSettings,
    refresh: RefreshScheduler,
}

impl GraphSession {
    pub fn new(
        graph: GraphConfig,
        fetcher: Arc<DataFetcher>,
        renderer: Arc<dyn Renderer>,
        settings: RenderSettings,
    ) -> Self {
        Self {
            graph,
            fetcher,
            renderer,
            settings,
            refresh: RefreshScheduler::new(),
        }
    }

    /// Draw the graph and start its refresh timer. Any running timer is
    /// cancelled first. On failure nothing is handed to the renderer, so
    /// previously drawn content stays in place.
    pub async fn draw(&mut self) -> Result<RenderOutcome, GraphError> {
        self.refresh.cancel();

        let pass = RenderPass::new(self.graph.clone(), self.fetcher.clone(), self.settings)?;

        if !self.graph.has_targets() {
            return Ok(RenderOutcome::Empty);
        }

        if pass.variables().len() > 1 && !self.graph.has_variables() {
            tracing::warn!(
                "Graph {} defines {} variable sets but no target uses a variable",
                self.graph.id,
                pass.variables().len()
            );
        }

        let frame = pass.frame().await?;
        self.renderer.draw(frame).await.map_err(GraphError::Render)?;

        if let Some(period) = pass.refresh_period() {
            tracing::debug!("Refreshing graph {} every {:?}", self.graph.id, period);

            let pass = Arc::new(pass);
            let renderer = self.renderer.clone();
            self.refresh.schedule(period, move || {
                let pass = pass.clone();
                let renderer = renderer.clone();
                async move { refresh_tick(&pass, renderer.as_ref()).await }
            });
        }

        Ok(RenderOutcome::Rendered)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_active()
    }
}

/// One refresh: a failed pass keeps the drawn content and waits for the next
/// tick, a renderer that is gone stops the timer.
async fn refresh_tick(pass: &RenderPass, renderer: &dyn Renderer) -> ControlFlow<()> {
    let frame = match pass.frame().await {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Refresh of graph {} failed: {}", pass.graph().id, e);
            return ControlFlow::Continue(());
        }
    };

    match renderer.update(frame).await {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => {
            tracing::info!("Stopping refresh of graph {}: {:#}", pass.graph().id, e);
            ControlFlow::Break(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{fetcher, graph, utc, Drawn, MemoryRenderer, MockTransport};
    use crate::domain::time_scale::Timezone;
    use std::time::Duration;

    fn settings(default_refresh: Option<u64>) -> RenderSettings {
        RenderSettings {
            default_refresh,
            tick_count: 4,
            timezone: Timezone::Fixed(utc()),
        }
    }

    fn transport() -> Arc<MockTransport> {
        Arc::new(MockTransport::default().series("web.cpu", &[(1.0, 0), (2.0, 60)]))
    }

    #[tokio::test(start_paused = true)]
    async fn test_draw_then_refresh() {
        let renderer = Arc::new(MemoryRenderer::default());
        let transport = transport();
        let mut graph = graph(&[("web.cpu", "graphite")]);
        graph.refresh = Some(30);

        let mut session = GraphSession::new(graph, fetcher(transport.clone()), renderer.clone(), settings(None));
        assert_eq!(session.draw().await.unwrap(), RenderOutcome::Rendered);
        assert!(session.is_refreshing());

        tokio::time::sleep(Duration::from_secs(65)).await;

        let frames = renderer.frames();
        assert_eq!(frames.len(), 3);
        assert!(matches!(frames[0], Drawn::Draw(_)));
        assert!(matches!(frames[1], Drawn::Update(_)));
        assert_eq!(transport.requests().len(), 3);

        // dropping the session stops its timer
        drop(session);
        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_redraw_keeps_one_timer() {
        let renderer = Arc::new(MemoryRenderer::default());
        let transport = transport();
        let graph = graph(&[("web.cpu", "graphite")]);

        let mut session = GraphSession::new(graph, fetcher(transport.clone()), renderer.clone(), settings(Some(10)));
        session.draw().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        session.draw().await.unwrap();

        tokio::time::sleep(Duration::from_secs(12)).await;

        // two draws, then a single update from the second timer only
        let frames = renderer.frames();
        assert_eq!(frames.len(), 3);
        assert!(matches!(frames[2], Drawn::Update(_)));
    }

    #[tokio::test]
    async fn test_empty_graph() {
        let renderer = Arc::new(MemoryRenderer::default());
        let transport = transport();
        let graph = graph(&[]);

        let mut session = GraphSession::new(graph, fetcher(transport.clone()), renderer.clone(), settings(Some(10)));
        assert_eq!(session.draw().await.unwrap(), RenderOutcome::Empty);
        assert!(renderer.frames().is_empty());
        assert!(transport.requests().is_empty());
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn test_failed_draw_renders_nothing() {
        let renderer = Arc::new(MemoryRenderer::default());
        let transport = Arc::new(MockTransport::default().fail("http://graphite/render"));
        let graph = graph(&[("web.cpu", "graphite")]);

        let mut session = GraphSession::new(graph, fetcher(transport), renderer.clone(), settings(Some(10)));
        assert!(matches!(session.draw().await, Err(GraphError::Fetch(_))));
        assert!(renderer.frames().is_empty());
        assert!(!session.is_refreshing());
    }

    #[tokio::test]
    async fn test_bad_variables() {
        let renderer = Arc::new(MemoryRenderer::default());
        let mut graph = graph(&[("web.cpu", "graphite")]);
        graph.variables = Some("[".to_string());

        let mut session = GraphSession::new(graph, fetcher(transport()), renderer, settings(None));
        assert!(matches!(session.draw().await, Err(GraphError::ConfigParse(_))));
    }
}
