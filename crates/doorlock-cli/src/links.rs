//! Concrete links for a deployment.
//!
//! The main loop is generic over one source type and one sink type, so the
//! serial and stdio variants are folded into small enums here.

use doorlock_transport::{
    ByteSink, LineSource, SerialLineSource, SerialLink, SerialSettings, SerialSink,
    StreamLineSource, StreamSink,
};
use tracing::info;

use crate::config::{DeploymentConfig, STDIO_DEVICE};

pub enum InboundLink {
    Serial(SerialLineSource),
    Stdin(StreamLineSource<tokio::io::Stdin>),
}

impl LineSource for InboundLink {
    async fn next_line(&mut self) -> doorlock_transport::Result<Option<String>> {
        match self {
            InboundLink::Serial(source) => source.next_line().await,
            InboundLink::Stdin(source) => source.next_line().await,
        }
    }
}

pub enum OutboundLink {
    Serial(SerialSink),
    Stdout(StreamSink<tokio::io::Stdout>),
}

impl ByteSink for OutboundLink {
    fn name(&self) -> &str {
        match self {
            OutboundLink::Serial(sink) => sink.name(),
            OutboundLink::Stdout(sink) => sink.name(),
        }
    }

    async fn send(&mut self, bytes: &[u8]) -> doorlock_transport::Result<()> {
        match self {
            OutboundLink::Serial(sink) => sink.send(bytes).await,
            OutboundLink::Stdout(sink) => sink.send(bytes).await,
        }
    }
}

/// Open every link the deployment names.
///
/// An outbound link on the inbound serial device shares its port handle
/// instead of opening the device a second time.
pub fn open(
    config: &DeploymentConfig,
) -> doorlock_transport::Result<(InboundLink, Vec<(OutboundLink, bool)>)> {
    let inbound_device = config.inbound.device.as_str();
    let shared = if inbound_device == STDIO_DEVICE {
        None
    } else {
        Some(SerialLink::open(SerialSettings::new(
            inbound_device,
            config.inbound.baud_rate,
        ))?)
    };

    let mut outbound = Vec::new();
    for link in config.outbound_links() {
        let sink = match (&shared, link.device.as_str()) {
            (_, STDIO_DEVICE) => OutboundLink::Stdout(StreamSink::stdout()),
            (Some(shared), device) if device == inbound_device => {
                OutboundLink::Serial(shared.sink()?)
            }
            (_, device) => OutboundLink::Serial(SerialSink::open(SerialSettings::new(
                device,
                link.baud_rate,
            ))?),
        };
        info!(link = sink.name(), send_name = link.send_name, "outbound link open");
        outbound.push((sink, link.send_name));
    }

    let inbound = match shared {
        Some(link) => InboundLink::Serial(link.into_line_source()?),
        None => InboundLink::Stdin(StreamLineSource::stdin()),
    };
    info!(device = inbound_device, "inbound link open");

    Ok((inbound, outbound))
}
