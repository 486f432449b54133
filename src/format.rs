//! Pure display formatting shared by the live cards, the detail modal and
//! the full-history table.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

/// Placeholder shown for absent durations.
pub const NO_DURATION: &str = "--";

const SIDE_LEFT: &str = "Izq";
const SIDE_RIGHT: &str = "Der";

/// Human label for a raw slot code.
///
/// Recognized shapes, case-insensitive, first match wins:
/// - `UNICO` → empty label
/// - `IZQUIERDA` / `DERECHA` → `Izq` / `Der`
/// - `E1_IZQUIERDA` (prefix `E`, `M` or `L`, camera digits) → `Cam 1 · Izq`
/// - `M_DERECHA` → `Der`
///
/// Anything else is returned unchanged.
#[must_use]
pub fn slot_label(code: &str) -> String {
    let upper = code.to_ascii_uppercase();

    if upper == "UNICO" {
        return String::new();
    }
    if let Some(side) = side_label(&upper) {
        return side.to_owned();
    }

    let Some((prefix, side)) = upper.split_once('_') else {
        return code.to_owned();
    };
    let Some(side) = side_label(side) else {
        return code.to_owned();
    };

    let mut chars = prefix.chars();
    if !matches!(chars.next(), Some('E' | 'M' | 'L')) {
        return code.to_owned();
    }
    let camera = chars.as_str();
    if camera.is_empty() {
        return side.to_owned();
    }
    if camera.bytes().all(|b| b.is_ascii_digit()) {
        return format!("Cam {camera} · {side}");
    }
    code.to_owned()
}

fn side_label(upper: &str) -> Option<&'static str> {
    match upper {
        "IZQUIERDA" => Some(SIDE_LEFT),
        "DERECHA" => Some(SIDE_RIGHT),
        _ => None,
    }
}

/// Label for an optional slot; `None` renders as empty.
#[must_use]
pub fn slot_label_opt(code: Option<&str>) -> String {
    code.map(slot_label).unwrap_or_default()
}

/// Compact `Xd Yh ZZm` rendering of a duration in seconds.
///
/// The day component is omitted when zero; the hour component only when
/// both day and hour are zero. Minutes are always two digits. Negative
/// inputs clamp to zero.
#[must_use]
pub fn format_duration(seconds: Option<i64>) -> String {
    let Some(seconds) = seconds else {
        return NO_DURATION.to_owned();
    };
    let seconds = seconds.max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes:02}m")
    } else if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else {
        format!("{minutes:02}m")
    }
}
