//! Client-side state for snake-arena.
//!
//! The server sends snapshots at a lower rate than frames are drawn; this
//! crate turns the snapshot stream into smooth per-frame poses. Transport and
//! drawing belong to the embedding application: feed every text frame to
//! [`ClientView::handle_text`] with a millisecond clock, then ask for
//! [`ClientView::render_poses`] each frame.

pub mod interpolation; // Per-agent interpolation and extrapolation
pub mod view; // Applies server messages, leaderboard
mod utils; // Easing and clamping helpers

pub use interpolation::{RemoteAgent, INTERPOLATION_WINDOW_MS, MAX_EXTRAPOLATION_FACTOR};
pub use view::{ClientEvent, ClientView, LeaderboardEntry};
