//! Live channel lifecycle against a scripted transport and virtual time.

mod common;

use std::time::Duration;

use chrono::FixedOffset;

use common::RecordingSink;
use validator_dash::channel::manager::{
    CONNECTION_LOST_PREFIX, ChannelCmd, ChannelEvent, ChannelState, LiveChannel, RECONNECT_DELAY,
};
use validator_dash::channel::runner::ChannelRunner;
use validator_dash::channel::scheduler::{Scheduler, VirtualScheduler};
use validator_dash::channel::transport::{ScriptedConnection, ScriptedTransport};
use validator_dash::core::model::Visibility;
use validator_dash::dashboard::view::Dashboard;
use validator_dash::logger::diagnostics::DiagnosticEvent;
use validator_dash::render::geometry::GeometryResolver;
use validator_dash::render::surface::RecordingSurface;

fn runner(
    channel: LiveChannel,
    script: Vec<ScriptedConnection>,
) -> ChannelRunner<ScriptedTransport, VirtualScheduler> {
    ChannelRunner::new(channel, ScriptedTransport::new(script), VirtualScheduler::new())
}

fn drain<K: validator_dash::channel::manager::ChannelSink>(
    r: &mut ChannelRunner<ScriptedTransport, VirtualScheduler>,
    sink: &mut K,
) {
    while r.step(sink, Duration::ZERO) {}
}

#[test]
fn log_update_then_drop_schedules_exactly_one_reconnect() {
    let mut sink = RecordingSink::default();
    let mut r = runner(
        LiveChannel::default(),
        vec![
            ScriptedConnection::accepted([
                common::log_frame(10, "block 1"),
                common::update_frame(&[("A", "a", 1, &[3])]),
            ])
            .then_close(""),
        ],
    );
    r.start(&mut sink);
    drain(&mut r, &mut sink);

    assert_eq!(sink.logs.len(), 1);
    assert_eq!(sink.updates.len(), 1);
    assert_eq!(sink.lines, vec![CONNECTION_LOST_PREFIX.to_string()]);
    assert_eq!(r.channel().state(), ChannelState::ReconnectWait);
    assert_eq!(r.scheduler().pending(), 1);
    assert_eq!(r.scheduler().next_deadline(), Some(RECONNECT_DELAY));
    assert_eq!(r.channel().stats().reconnects_scheduled, 1);

    r.scheduler_mut().advance(RECONNECT_DELAY - Duration::from_millis(1));
    assert!(!r.step(&mut sink, Duration::ZERO));
    assert_eq!(r.transport().connects(), 1);

    r.scheduler_mut().advance(Duration::from_millis(1));
    assert!(r.step(&mut sink, Duration::ZERO));
    assert_eq!(r.transport().connects(), 2);
}

#[test]
fn refused_attempts_retry_every_delay_indefinitely() {
    let mut sink = RecordingSink::default();
    let mut r = runner(LiveChannel::default(), Vec::new());
    r.start(&mut sink);
    assert_eq!(r.transport().connects(), 1);

    for round in 1..=5u32 {
        r.scheduler_mut().advance(RECONNECT_DELAY);
        assert!(r.step(&mut sink, Duration::ZERO));
        assert_eq!(r.transport().connects(), round as usize + 1);
        assert_eq!(r.scheduler().pending(), 1);
    }
    assert_eq!(r.scheduler().next_deadline(), Some(RECONNECT_DELAY * 6));
    assert_eq!(sink.lines.len(), 6);
    assert!(sink.lines.iter().all(|l| l.starts_with(CONNECTION_LOST_PREFIX)));
    assert_eq!(
        sink.diagnostics
            .iter()
            .filter(|e| matches!(e, DiagnosticEvent::ReconnectScheduled { .. }))
            .count(),
        6
    );
}

#[test]
fn recovery_after_outage_resumes_delivery() {
    let mut sink = RecordingSink::default();
    let mut r = runner(
        LiveChannel::default(),
        vec![
            ScriptedConnection::refused("down"),
            ScriptedConnection::refused("still down"),
            ScriptedConnection::accepted([common::log_frame(5, "back")]),
        ],
    );
    r.start(&mut sink);
    r.scheduler_mut().advance(RECONNECT_DELAY);
    r.step(&mut sink, Duration::ZERO);
    r.scheduler_mut().advance(RECONNECT_DELAY);
    r.step(&mut sink, Duration::ZERO);
    drain(&mut r, &mut sink);

    assert_eq!(r.channel().state(), ChannelState::Open);
    assert_eq!(r.channel().stats().opened, 1);
    assert_eq!(sink.logs.len(), 1);
    assert!(sink.lines[0].contains("down"));
    assert!(!r.reconnect_pending());
}

#[test]
fn duplicate_close_does_not_arm_a_second_timer() {
    let mut sink = RecordingSink::default();
    let mut channel = LiveChannel::default();
    assert_eq!(channel.start(), ChannelCmd::Connect);
    channel.handle(ChannelEvent::Opened, &mut sink);
    let first = channel.handle(
        ChannelEvent::Closed {
            reason: " (1006)".to_string(),
        },
        &mut sink,
    );
    let second = channel.handle(
        ChannelEvent::Closed {
            reason: " (1006)".to_string(),
        },
        &mut sink,
    );
    assert_eq!(first, ChannelCmd::ScheduleReconnect(RECONNECT_DELAY));
    assert_eq!(second, ChannelCmd::None);
    assert_eq!(sink.lines, vec![format!("{CONNECTION_LOST_PREFIX} (1006)")]);
}

#[test]
fn configured_delay_is_honoured() {
    let mut sink = RecordingSink::default();
    let delay = Duration::from_millis(750);
    let mut r = runner(LiveChannel::new(delay), Vec::new());
    r.start(&mut sink);
    assert_eq!(r.scheduler().next_deadline(), Some(delay));
}

#[test]
fn hidden_sink_drops_updates_but_keeps_logs() {
    let mut sink = RecordingSink {
        visibility: Visibility::Hidden,
        ..RecordingSink::default()
    };
    let mut r = runner(
        LiveChannel::default(),
        vec![ScriptedConnection::accepted([
            common::update_frame(&[("A", "a", 1, &[])]),
            common::log_frame(1, "kept"),
        ])],
    );
    r.start(&mut sink);
    drain(&mut r, &mut sink);
    assert!(sink.updates.is_empty());
    assert_eq!(sink.logs.len(), 1);
    assert_eq!(r.channel().stats().updates_dropped, 1);
    assert!(sink.diagnostics.contains(&DiagnosticEvent::UpdateDropped));
}

#[test]
fn dashboard_sink_shows_the_connection_lost_line_on_top() {
    let mut dash = Dashboard::new(
        RecordingSurface::new(960.0, 100.0, 1.0),
        RecordingSurface::new(960.0, 30.0, 1.0),
        GeometryResolver::default(),
    )
    .with_utc_offset(FixedOffset::east_opt(0).expect("utc"));
    let mut r = runner(
        LiveChannel::default(),
        vec![
            ScriptedConnection::accepted([
                common::log_frame(3_600, "hello"),
                common::update_frame(&[("A", "a", 1, &[3, 0])]),
            ])
            .then_close(" (going away)"),
        ],
    );
    r.start(&mut dash);
    drain(&mut r, &mut dash);

    assert_eq!(dash.grid().render_count(), 1);
    assert_eq!(dash.grid().surface().fills().count(), 2);
    let lines: Vec<&str> = dash.log().lines().collect();
    assert_eq!(
        lines,
        vec![
            "Socket is closed, retrying /ws ... (going away)",
            "01:00:00 - hello",
        ]
    );
}
