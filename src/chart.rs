//! Circular 24-hour chart rendered as a standalone SVG document. 00:00
//! sits at the top and a day is one full revolution.

use crate::model::{Category, ScheduleItem};
use crate::schedule::{
    has_midnight_split, parse_time, sorted_by_start, visible_on_dial, TimeParseError,
    DAY_MINUTES,
};
use std::f64::consts::{PI, TAU};
use std::fmt::Write as _;

/// Labels disappear under ~3.5% of the circle (about an hour) where they
/// would not be readable anyway.
pub const LABEL_MIN_FRACTION: f64 = 0.035;

const OUTER_RADIUS_RATIO: f64 = 0.4;
const INNER_RADIUS_RATIO: f64 = 0.15;
const MARKER_HOURS: [u32; 8] = [0, 3, 6, 9, 12, 15, 18, 21];

#[derive(Debug, Clone)]
pub struct Slice {
    pub item: ScheduleItem,
    pub path: String,
    pub fill: &'static str,
    pub label: String,
    pub label_x: f64,
    pub label_y: f64,
    pub show_label: bool,
}

fn polar(center: f64, radius: f64, fraction: f64) -> (f64, f64) {
    let x = center + radius * (TAU * fraction - PI / 2.0).cos();
    let y = center + radius * (TAU * fraction - PI / 2.0).sin();
    (x, y)
}

/// Annular sector between the inner and outer radii; the large-arc flag is
/// set once the span exceeds half the circle.
fn sector_path(center: f64, inner: f64, outer: f64, start: f64, end: f64) -> String {
    let (sx, sy) = polar(center, outer, start);
    let (ex, ey) = polar(center, outer, end);
    let (isx, isy) = polar(center, inner, start);
    let (iex, iey) = polar(center, inner, end);
    let large_arc = if end - start > 0.5 { 1 } else { 0 };
    format!(
        "M {sx:.2} {sy:.2} A {outer:.2} {outer:.2} 0 {large_arc} 1 {ex:.2} {ey:.2} \
         L {iex:.2} {iey:.2} A {inner:.2} {inner:.2} 0 {large_arc} 0 {isx:.2} {isy:.2} Z"
    )
}

fn category_fill(category: Category) -> &'static str {
    match category {
        Category::Research => "#f3e8ff",
        Category::University => "#fce7f3",
        Category::Work => "#dbeafe",
        Category::Dev => "#cffafe",
        Category::Study => "#e0e7ff",
        Category::Reading => "#ccfbf1",
        Category::Hobby => "#dcfce7",
        Category::Routine => "#ffedd5",
        Category::Commute => "#fef9c3",
        Category::Sleep => "#cbd5e1",
        Category::Other => "#f3f4f6",
    }
}

fn slice_label(item: &ScheduleItem) -> String {
    let label = if item.title.is_empty() {
        item.category.key().to_string()
    } else {
        item.title.clone()
    };
    if label.chars().count() > 8 {
        let head: String = label.chars().take(7).collect();
        format!("{head}..")
    } else {
        label
    }
}

/// Geometry for every visible arc; the midnight-split tail segment is
/// filtered out here, not in the schedule itself.
pub fn slices(schedule: &[ScheduleItem], size: f64) -> Result<Vec<Slice>, TimeParseError> {
    let center = size / 2.0;
    let outer = size * OUTER_RADIUS_RATIO;
    let inner = size * INNER_RADIUS_RATIO;
    let split = has_midnight_split(schedule);

    let mut slices = Vec::new();
    for item in sorted_by_start(schedule) {
        if !visible_on_dial(&item, split) {
            continue;
        }
        let start = parse_time(&item.start_time)? as f64 / DAY_MINUTES as f64;
        let end = parse_time(&item.end_time)? as f64 / DAY_MINUTES as f64;
        let path = sector_path(center, inner, outer, start, end);
        let mid = (start + end) / 2.0;
        let (label_x, label_y) = polar(center, (outer + inner) / 2.0, mid);
        slices.push(Slice {
            fill: category_fill(item.category),
            label: slice_label(&item),
            label_x,
            label_y,
            show_label: end - start > LABEL_MIN_FRACTION,
            path,
            item,
        });
    }
    Ok(slices)
}

/// The full SVG document for one day's schedule.
pub fn render_svg(schedule: &[ScheduleItem], size: f64) -> Result<String, TimeParseError> {
    let center = size / 2.0;
    let outer = size * OUTER_RADIUS_RATIO;
    let inner = size * INNER_RADIUS_RATIO;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{size}\" height=\"{size}\" \
         viewBox=\"0 0 {size} {size}\">"
    );
    let _ = writeln!(
        svg,
        "  <circle cx=\"{center}\" cy=\"{center}\" r=\"{outer}\" fill=\"#f9fafb\" \
         stroke=\"#f3f4f6\" stroke-width=\"1\"/>"
    );

    for slice in slices(schedule, size)? {
        let _ = writeln!(
            svg,
            "  <path d=\"{}\" fill=\"{}\" stroke=\"#ffffff\" opacity=\"0.8\"/>",
            slice.path, slice.fill
        );
        if slice.show_label {
            let _ = writeln!(
                svg,
                "  <text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" \
                 dominant-baseline=\"middle\" font-size=\"10\" fill=\"#374151\">{}</text>",
                slice.label_x,
                slice.label_y,
                escape_text(&slice.label)
            );
        }
    }

    let _ = writeln!(
        svg,
        "  <circle cx=\"{center}\" cy=\"{center}\" r=\"{inner}\" fill=\"#ffffff\"/>"
    );

    for hour in MARKER_HOURS {
        let fraction = (hour * 60) as f64 / DAY_MINUTES as f64;
        let (x, y) = polar(center, outer + 15.0, fraction);
        let _ = writeln!(
            svg,
            "  <text x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" \
             dominant-baseline=\"middle\" font-size=\"10\" fill=\"#9ca3af\">{hour}</text>"
        );
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::default_schedule;

    fn item(start: &str, end: &str, title: &str, category: Category) -> ScheduleItem {
        ScheduleItem {
            id: "x".into(),
            start_time: start.into(),
            end_time: end.into(),
            title: title.into(),
            description: None,
            category,
        }
    }

    #[test]
    fn short_spans_lose_their_label() {
        let schedule = vec![
            item("09:00", "09:30", "standup", Category::Work), // ~2% of the day
            item("10:00", "12:00", "deep work", Category::Dev),
        ];
        let slices = slices(&schedule, 300.0).unwrap();
        assert!(!slices[0].show_label);
        assert!(slices[1].show_label);
    }

    #[test]
    fn large_arc_flag_set_past_half_circle() {
        let long = vec![item("00:00", "14:00", "", Category::Sleep)];
        let short = vec![item("00:00", "04:00", "", Category::Sleep)];
        let long_slices = slices(&long, 300.0).unwrap();
        let short_slices = slices(&short, 300.0).unwrap();
        assert!(long_slices[0].path.contains(" 1 1 "));
        assert!(short_slices[0].path.contains(" 0 1 "));
    }

    #[test]
    fn midnight_split_tail_is_not_drawn() {
        let slices = slices(&default_schedule(), 300.0).unwrap();
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].item.start_time, "00:00");
    }

    #[test]
    fn long_titles_are_truncated() {
        let schedule = vec![item("09:00", "12:00", "extraordinarily long", Category::Work)];
        let slices = slices(&schedule, 300.0).unwrap();
        assert_eq!(slices[0].label, "extraor..");
    }

    #[test]
    fn svg_document_has_markers_and_slices() {
        let schedule = vec![item("06:00", "12:00", "morning", Category::Routine)];
        let svg = render_svg(&schedule, 300.0).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("morning"));
        // hour markers every three hours
        assert_eq!(svg.matches("fill=\"#9ca3af\"").count(), 8);
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
