//! The main loop: read a line, resolve it, answer on every sink.
//!
//! One presentation is completely handled, including the name delay and the
//! optional clear signal, before the next line is read.

use doorlock_protocol::{Frame, InboundFormat};
use doorlock_storage::CredentialStore;
use doorlock_transport::{ByteSink, LineSource};
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::engine::{Action, Presentation, ResolutionEngine};
use crate::error::Result;

/// One outbound link and whether it receives the name frame.
pub struct OutboundSink<K> {
    sink: K,
    send_name: bool,
}

impl<K: ByteSink> OutboundSink<K> {
    pub fn new(sink: K, send_name: bool) -> Self {
        Self { sink, send_name }
    }

    pub fn name(&self) -> &str {
        self.sink.name()
    }
}

/// Counters kept by the main loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines: u64,
    pub presentations: u64,
    /// Lines that were not presentations.
    pub ignored: u64,
    pub malformed: u64,
    /// Presentations aborted by a store failure.
    pub failed: u64,
}

pub struct MainLoop<S, L, K> {
    engine: ResolutionEngine<S>,
    source: L,
    sinks: Vec<OutboundSink<K>>,
    format: InboundFormat,
    config: RunnerConfig,
    stats: RunStats,
}

impl<S, L, K> MainLoop<S, L, K>
where
    S: CredentialStore,
    L: LineSource,
    K: ByteSink,
{
    pub fn new(
        engine: ResolutionEngine<S>,
        source: L,
        sinks: Vec<OutboundSink<K>>,
        format: InboundFormat,
        config: RunnerConfig,
    ) -> Self {
        Self {
            engine,
            source,
            sinks,
            format,
            config,
            stats: RunStats::default(),
        }
    }

    pub fn engine(&self) -> &ResolutionEngine<S> {
        &self.engine
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run until the line source ends.
    ///
    /// # Errors
    ///
    /// Only `EngineError::TransportUnavailable`. Store failures and bad
    /// lines are logged and skipped.
    pub async fn run(&mut self) -> Result<RunStats> {
        info!(sinks = self.sinks.len(), "main loop started");

        while let Some(line) = self.source.next_line().await? {
            self.handle_line(&line).await?;
        }

        info!(stats = ?self.stats, "inbound link closed, main loop finished");
        Ok(self.stats.clone())
    }

    /// Handle one raw inbound line.
    pub async fn handle_line(&mut self, line: &str) -> Result<()> {
        self.stats.lines += 1;

        let id = match self.format.parse_line(line) {
            Ok(Some(id)) => id,
            Ok(None) => {
                debug!(line = line.trim_end(), "ignoring non-presentation line");
                self.stats.ignored += 1;
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "discarding malformed line");
                self.stats.malformed += 1;
                return Ok(());
            }
        };

        self.stats.presentations += 1;

        let presentation = match self.engine.present(id).await {
            Ok(presentation) => presentation,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!(card_id = %id, error = %e, "presentation failed, no response sent");
                self.stats.failed += 1;
                return Ok(());
            }
        };

        self.dispatch(&presentation).await?;

        if self.config.reprovision_after_wipe
            && matches!(presentation.action, Action::Wiped { .. })
        {
            match self.engine.provision_defaults().await {
                Ok(report) => {
                    info!(created = report.created_count(), "bootstrap restored after wipe")
                }
                Err(e) => error!(error = %e, "bootstrap provisioning after wipe failed"),
            }
        }

        if let Some(clear) = self.config.clear_signal {
            tokio::time::sleep(clear.after).await;
            self.broadcast(&Frame::Control(clear.byte), false).await?;
        }

        Ok(())
    }

    async fn dispatch(&mut self, presentation: &Presentation) -> Result<()> {
        for frame in presentation.response.frames(self.config.echo_card_id) {
            if frame.is_name() {
                if !self.sinks.iter().any(|s| s.send_name) {
                    continue;
                }
                if !self.config.name_delay.is_zero() {
                    tokio::time::sleep(self.config.name_delay).await;
                }
                self.broadcast(&frame, true).await?;
            } else {
                self.broadcast(&frame, false).await?;
            }
        }
        Ok(())
    }

    /// Write `frame` to every sink, or only to name sinks.
    async fn broadcast(&mut self, frame: &Frame, names_only: bool) -> Result<()> {
        let bytes = frame.encode(self.config.rank_encoding);
        for outbound in self.sinks.iter_mut().filter(|s| s.send_name || !names_only) {
            outbound.sink.send(&bytes).await.inspect_err(|e| {
                error!(sink = outbound.sink.name(), error = %e, "outbound write failed");
            })?;
        }
        Ok(())
    }
}
