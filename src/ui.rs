// ui.rs

use crate::broadcaster::TickReport;
use crate::encoder::{TempoRange, MIN_BPM};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

pub fn create_clock_spinner() -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    let style = ProgressStyle::default_spinner()
        .template("{prefix:.bold.dim} {spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_prefix("Clock");
    pb
}

/// One-line description of what was last sent
pub fn describe_report(report: Option<&TickReport>) -> String {
    match report {
        None => "waiting for first tick".to_string(),
        Some(TickReport::Idle) => "idle (no playing sync leader)".to_string(),
        Some(TickReport::SendFailed(reason)) => format!("not sent: {}", reason),
        Some(TickReport::Active { selection, fields }) => {
            let sent_bpm = format!(
                "{}.{:02}",
                MIN_BPM + u64::from(fields.bpm_whole),
                fields.bpm_fractional
            );
            let clamped = match fields.range {
                TempoRange::InRange => "",
                TempoRange::BelowRange | TempoRange::AboveRange => " (clamped)",
            };
            format!(
                "BPM: {}{}, Phase: {}/127, Tempo deck: {}, Phase deck: {}",
                sent_bpm,
                clamped,
                fields.phase,
                selection.tempo_source + 1,
                selection.phase_source + 1
            )
        }
    }
}

pub fn update_clock_spinner(pb: &ProgressBar, report: Option<&TickReport>) {
    pb.set_message(describe_report(report));
    pb.tick();
}
