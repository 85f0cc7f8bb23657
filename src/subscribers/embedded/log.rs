//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [deferred-created] channel="grid"
//! [staged] channel="grid" items=2
//! [registered] channel="grid"
//! [deferred-resolved] channel="grid"
//! [applied] channel="grid" len=3
//! [removed] channel="grid" len=2
//! [deregistered] channel="grid"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Renders one event as a single log line.
fn render(e: &Event) -> String {
    let channel = e.channel.as_deref().unwrap_or("unknown");
    let reason = e.reason.as_deref().unwrap_or("unknown");
    match e.kind {
        EventKind::ChannelRegistered => format!("[registered] channel={channel:?}"),
        EventKind::ChannelDeregistered => format!("[deregistered] channel={channel:?}"),
        EventKind::RegisterRejected => {
            format!("[register-rejected] channel={channel:?} err={reason}")
        }
        EventKind::DeferredCreated => format!("[deferred-created] channel={channel:?}"),
        EventKind::DeferredResolved => format!("[deferred-resolved] channel={channel:?}"),
        EventKind::ContainersStaged => {
            format!("[staged] channel={channel:?} items={}", e.items.unwrap_or(0))
        }
        EventKind::ContainersApplied => {
            format!("[applied] channel={channel:?} len={}", e.items.unwrap_or(0))
        }
        EventKind::ContainerRemoved => {
            format!("[removed] channel={channel:?} len={}", e.items.unwrap_or(0))
        }
        EventKind::RemoveRejected => {
            format!("[remove-rejected] channel={channel:?} err={reason}")
        }
        EventKind::DelegatorPanicked => {
            format!("[delegator-panicked] channel={channel:?} info={reason}")
        }
        EventKind::SubscriberOverflow => {
            format!("[subscriber-overflow] subscriber={channel} reason={reason}")
        }
        EventKind::SubscriberPanicked => {
            format!("[subscriber-panicked] subscriber={channel} info={reason}")
        }
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        println!("{}", render(e));
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
