pub mod time;

pub use time::{current_epoch, format_play_duration, persona_status_text, shanghai_today};
