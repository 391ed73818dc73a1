//! Snapshot reconciliation for remote agents.
//!
//! Snapshots arrive far less often than frames are drawn. Between two
//! snapshots each segment eases from its previous reported position to the
//! new one; when the next snapshot is late the chain keeps moving along the
//! last observed velocity for a bounded overshoot.
//!
//!   factor = clamp((now - window_start) / INTERPOLATION_WINDOW_MS, 0, MAX_EXTRAPOLATION_FACTOR)
//!   factor <= 1: pos = prev + (new - prev) * smooth_step(factor)
//!   factor  > 1: pos = new + velocity * (factor - 1) * INTERPOLATION_WINDOW_MS
//!
//! The window is fixed and does not follow the broadcast rate. At the default
//! 30 Hz a new snapshot restarts the window after about 33 ms, so `factor`
//! stays near 0.33 and each arrival snaps the pose forward to where the last
//! blend left off. Extrapolation only kicks in once snapshots stall for more
//! than a full window.

use crate::utils::{clamp, smooth_step};
use glam::Vec2;
use protocol::{AgentSnapshot, Color, PowerKind};

/// Expected spacing between snapshots, in ms.
pub const INTERPOLATION_WINDOW_MS: f64 = 100.0;
/// Extrapolation stops at 20% past the window.
pub const MAX_EXTRAPOLATION_FACTOR: f64 = 1.2;
/// Distance the corrective pass restores between consecutive segments.
pub const SEGMENT_SPACING: f32 = 20.0;

/// One remote agent's interpolation buffers plus its latest reported state.
#[derive(Debug, Clone)]
pub struct RemoteAgent {
    pub id: u32,
    pub name: String,
    pub color: Color,
    pub score: u32,
    pub alive: bool,
    pub moving: bool,
    pub powers: Vec<PowerKind>,
    /// Latest reported segments, head first.
    segments: Vec<Vec2>,
    /// Segments reported by the snapshot before the latest one.
    previous: Option<Vec<Vec2>>,
    /// Units per ms, per segment.
    velocities: Vec<Vec2>,
    /// When the latest snapshot was applied.
    update_time: f64,
    window_start: f64,
}

impl RemoteAgent {
    /// Track a newly seen agent. Until a second snapshot arrives it renders as reported.
    pub fn new(snapshot: &AgentSnapshot, now: f64) -> Self {
        let segments: Vec<Vec2> = snapshot.segments.iter().map(|&p| p.into()).collect();
        Self {
            id: snapshot.id,
            name: snapshot.name.clone(),
            color: snapshot.color,
            score: snapshot.score,
            alive: snapshot.alive,
            moving: snapshot.moving,
            powers: snapshot.powers.clone(),
            velocities: vec![Vec2::ZERO; segments.len()],
            segments,
            previous: None,
            update_time: now,
            window_start: now,
        }
    }

    /// Take in a newer snapshot and restart the interpolation window at `now`.
    pub fn apply_snapshot(&mut self, snapshot: &AgentSnapshot, now: f64) {
        let incoming: Vec<Vec2> = snapshot.segments.iter().map(|&p| p.into()).collect();
        let dt = (now - self.update_time) as f32;

        self.velocities = incoming
            .iter()
            .enumerate()
            .map(|(i, new)| match self.segments.get(i) {
                Some(old) if dt > 0.0 => (*new - *old) / dt,
                _ => Vec2::ZERO,
            })
            .collect();
        self.previous = Some(std::mem::replace(&mut self.segments, incoming));
        self.update_time = now;
        self.window_start = now;

        self.name.clone_from(&snapshot.name);
        self.color = snapshot.color;
        self.score = snapshot.score;
        self.alive = snapshot.alive;
        self.moving = snapshot.moving;
        self.powers.clone_from(&snapshot.powers);
    }

    pub fn reported_segments(&self) -> &[Vec2] {
        &self.segments
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Interpolation factor at `now`, in `[0, MAX_EXTRAPOLATION_FACTOR]`.
    pub fn factor(&self, now: f64) -> f64 {
        clamp(
            (now - self.window_start) / INTERPOLATION_WINDOW_MS,
            0.0,
            MAX_EXTRAPOLATION_FACTOR,
        )
    }

    /// Segment positions to draw at `now`, head first.
    pub fn render_pose(&self, now: f64) -> Vec<Vec2> {
        let Some(previous) = &self.previous else {
            return self.segments.clone();
        };

        let factor = self.factor(now);
        let mut pose: Vec<Vec2> = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, &target)| match previous.get(i) {
                // Segments added by growth have no history yet.
                None => target,
                Some(&from) if factor <= 1.0 => from.lerp(target, smooth_step(factor as f32)),
                Some(_) => {
                    let overshoot = ((factor - 1.0) * INTERPOLATION_WINDOW_MS) as f32;
                    target + self.velocities[i] * overshoot
                }
            })
            .collect();

        enforce_spacing(&mut pose);
        pose
    }
}

/// Put every segment exactly `SEGMENT_SPACING` from its already-corrected predecessor.
fn enforce_spacing(pose: &mut [Vec2]) {
    for i in 1..pose.len() {
        let leader = pose[i - 1];
        if let Some(direction) = (pose[i] - leader).try_normalize() {
            pose[i] = leader + direction * SEGMENT_SPACING;
        }
    }
}
