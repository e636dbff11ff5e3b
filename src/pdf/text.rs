use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};

use super::fonts::Font;

const MONTHS: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

fn weekday_pt(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// "15 de março de 2025"
pub fn format_date_pt(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// "15 de março de 2025 (sábado)"
pub fn format_date_with_weekday(date: NaiveDate) -> String {
    format!("{} ({})", format_date_pt(date), weekday_pt(date.weekday()))
}

/// "15/03/2025 18:30" in UTC.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%d/%m/%Y %H:%M").to_string()
}

/// "18:30" -> "18h30". Anything that is not `HH:MM` is returned trimmed.
pub fn format_time_pt(time: &str) -> String {
    let time = time.trim();
    match time.split_once(':') {
        Some((h, m)) if !h.is_empty() && m.len() >= 2 && h.chars().chain(m.chars()).all(|c| c.is_ascii_digit() || c == ':') => {
            format!("{h}h{}", &m[..2])
        }
        _ => time.to_string(),
    }
}

/// Greedy word wrap to `max_width` millimetres. Explicit newlines are kept and
/// a word longer than a full line is split by characters.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if font.text_width_mm(&candidate, size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if font.text_width_mm(word, size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if font.text_width_mm(&current, size) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }
        if !current.is_empty() || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Millimetres between baselines for text at `size` points.
pub fn line_height(size: f32) -> f32 {
    size * 0.45
}
