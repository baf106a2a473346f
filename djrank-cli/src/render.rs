//! Plain-text rendering of the board and performer records

use std::fmt::Write;

use djrank_common::{Board, Bucket, Performer, Score, Tier};

/// One line per performer: id, name, score and suggested tier
fn performer_line(performer: &Performer) -> String {
    let score = performer.score();
    format!(
        "  [{}] {} ({:.1} -> {})",
        performer.id,
        performer.name,
        score.total,
        score.tier()
    )
}

/// Tier rows S..F followed by the queue
///
/// `filter` narrows the queue by name; tiers are always shown in full.
pub fn board(board: &Board, filter: Option<&str>) -> String {
    let mut out = String::new();

    for tier in Tier::ALL {
        let members = board.bucket(Bucket::Tier(tier));
        let _ = writeln!(out, "{} ({})", tier, members.len());
        for performer in members {
            let _ = writeln!(out, "{}", performer_line(performer));
        }
    }

    let queue = board.queue_matching(filter.unwrap_or(""));
    match filter.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => {
            let _ = writeln!(out, "Queue ({} matching \"{}\")", queue.len(), f);
        }
        None => {
            let _ = writeln!(out, "Queue ({})", queue.len());
        }
    }
    for performer in queue {
        let _ = writeln!(out, "{}", performer_line(performer));
    }

    out
}

pub fn score(score: &Score) -> String {
    format!(
        "core {} + bonus {:.1} - penalty {:.1} = {:.1} (suggests {})",
        score.core,
        score.bonus,
        score.penalty.abs(),
        score.total,
        score.tier()
    )
}

fn field(out: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        let _ = writeln!(out, "{:<12} {}", label, value);
    }
}

/// Full record view
pub fn performer(performer: &Performer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", performer.name, performer.id);
    let _ = writeln!(out, "{:<12} {}", "bucket", performer.bucket());
    let _ = writeln!(out, "{:<12} {}", "score", score(&performer.score()));

    let c = &performer.rubric.criteria;
    let _ = writeln!(
        out,
        "{:<12} flow {} / vibes {} / visuals {} / creativity {}",
        "criteria", c.flow, c.vibes, c.visuals, c.creativity
    );

    let b = &performer.rubric.bonuses;
    let bonuses: Vec<&str> = [
        (b.crowd_control, "crowd control"),
        (b.signature_moment, "signature moment"),
        (b.bold_risks, "bold risks"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();
    let p = &performer.rubric.penalties;
    let penalties: Vec<&str> = [
        (p.cliche_tracks, "cliche tracks"),
        (p.overreliance, "overreliance"),
        (p.poor_energy, "poor energy"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect();
    field(&mut out, "bonuses", Some(&bonuses.join(", ")));
    field(&mut out, "penalties", Some(&penalties.join(", ")));

    field(&mut out, "bio", performer.bio.as_deref());
    field(&mut out, "notes", performer.notes.as_deref());
    field(&mut out, "soundcloud", performer.links.soundcloud_url.as_deref());
    field(&mut out, "spotify", performer.links.spotify_url.as_deref());
    field(&mut out, "apple music", performer.links.apple_music_url.as_deref());

    let event = &performer.event;
    let date = event.date.map(|d| d.to_string());
    field(&mut out, "venue", event.venue.as_deref());
    field(&mut out, "city", event.city.as_deref());
    field(&mut out, "date", date.as_deref());
    field(&mut out, "event type", event.kind.as_deref());
    field(&mut out, "slot", event.slot.as_deref());
    field(&mut out, "set length", event.set_duration.as_deref());

    for photo in &performer.photos {
        field(&mut out, "photo", Some(photo));
    }
    for video in &performer.videos {
        field(&mut out, "video", Some(video));
    }

    out
}
