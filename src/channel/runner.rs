//! Executes [`ChannelCmd`]s against a transport and a scheduler.
//!
//! Single-threaded: the owner calls [`ChannelRunner::step`] from its event
//! loop, interleaved with its own work (input, redraws). Each step fires due
//! reconnect timers, then waits briefly for at most one inbound event.

#![allow(missing_docs)]

use std::time::Duration;

use crate::channel::manager::{ChannelCmd, ChannelEvent, ChannelSink, ChannelState, LiveChannel};
use crate::channel::scheduler::{Scheduler, TimerId};
use crate::channel::transport::{Transport, TransportEvent};

#[derive(Debug)]
pub struct ChannelRunner<T, C> {
    channel: LiveChannel,
    transport: T,
    scheduler: C,
    reconnect_timer: Option<TimerId>,
}

impl<T: Transport, C: Scheduler> ChannelRunner<T, C> {
    #[must_use]
    pub const fn new(channel: LiveChannel, transport: T, scheduler: C) -> Self {
        Self {
            channel,
            transport,
            scheduler,
            reconnect_timer: None,
        }
    }

    #[must_use]
    pub const fn channel(&self) -> &LiveChannel {
        &self.channel
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    #[must_use]
    pub const fn scheduler(&self) -> &C {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut C {
        &mut self.scheduler
    }

    #[must_use]
    pub const fn reconnect_pending(&self) -> bool {
        self.reconnect_timer.is_some()
    }

    pub fn start<K: ChannelSink + ?Sized>(&mut self, sink: &mut K) {
        let cmd = self.channel.start();
        self.execute(cmd, sink);
    }

    /// Run one iteration. Returns whether any event was processed.
    pub fn step<K: ChannelSink + ?Sized>(&mut self, sink: &mut K, wait: Duration) -> bool {
        let mut progressed = false;
        for id in self.scheduler.take_due() {
            if self.reconnect_timer == Some(id) {
                self.reconnect_timer = None;
                let cmd = self.channel.handle(ChannelEvent::ReconnectDue, sink);
                self.execute(cmd, sink);
                progressed = true;
            }
        }

        if self.channel.state() == ChannelState::Open {
            if let Some(event) = self.transport.poll(wait) {
                let event = match event {
                    TransportEvent::Message(raw) => ChannelEvent::Message(raw),
                    TransportEvent::Closed { reason } => ChannelEvent::Closed { reason },
                };
                let cmd = self.channel.handle(event, sink);
                self.execute(cmd, sink);
                progressed = true;
            }
        } else if !progressed {
            self.scheduler.idle(wait);
        }
        progressed
    }

    fn execute<K: ChannelSink + ?Sized>(&mut self, mut cmd: ChannelCmd, sink: &mut K) {
        loop {
            cmd = match cmd {
                ChannelCmd::None => return,
                ChannelCmd::Connect => match self.transport.connect() {
                    Ok(()) => self.channel.handle(ChannelEvent::Opened, sink),
                    Err(err) => self.channel.handle(
                        ChannelEvent::Closed {
                            reason: format!(" ({err})"),
                        },
                        sink,
                    ),
                },
                ChannelCmd::ScheduleReconnect(delay) => {
                    self.reconnect_timer = Some(self.scheduler.schedule(delay));
                    return;
                }
            };
        }
    }
}
