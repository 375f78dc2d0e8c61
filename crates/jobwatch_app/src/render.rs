//! Plain-text rendering of the job list for the terminal.

use chrono::{DateTime, Local};
use jobwatch_core::{JobCardView, WatchViewModel};

pub fn render_view(view: &WatchViewModel, site_url: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Status: {}\n", view.status));
    out.push_str(&format!(
        "Last check: {} ({} new)\n",
        view.last_check
            .as_deref()
            .map(local_time)
            .unwrap_or_else(|| "never".to_string()),
        view.new_jobs_in_last_run
    ));
    if view.jobs.is_empty() {
        out.push_str("No recent jobs.\n");
        return out;
    }
    let site = site_url.trim_end_matches('/');
    for card in &view.jobs {
        out.push_str(&render_card(card, site));
    }
    out
}

fn render_card(card: &JobCardView, site: &str) -> String {
    let marker = match (card.collapsed, card.excluded_by_title, card.low_priority) {
        (_, true, _) => "x",
        (_, _, true) => "-",
        (true, _, _) => "~",
        _ => "*",
    };
    let mut line = format!("{marker} {} [{}]\n", card.title, card.id);
    if card.collapsed {
        return line;
    }
    line.push_str(&format!(
        "    {} | {} | spent {}{}{}\n",
        card.budget,
        card.client_country.as_deref().unwrap_or("Unknown country"),
        card.client_spent,
        card.client_rating
            .map(|rating| format!(" | rated {rating:.1}"))
            .unwrap_or_default(),
        if card.payment_verified { " | verified" } else { "" },
    ));
    if !card.skills.is_empty() {
        line.push_str(&format!("    skills: {}\n", card.skills.join(", ")));
    }
    if card.applied {
        line.push_str("    already applied\n");
    }
    line.push_str(&format!("    {site}{}\n", card.page_path));
    line
}

fn local_time(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|time| {
            time.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| timestamp.to_string())
}
