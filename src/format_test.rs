use super::*;

// =============================================================
// slot_label
// =============================================================

#[test]
fn slot_label_unico_is_empty() {
    assert_eq!(slot_label("UNICO"), "");
    assert_eq!(slot_label("unico"), "");
}

#[test]
fn slot_label_legacy_sides() {
    assert_eq!(slot_label("IZQUIERDA"), "Izq");
    assert_eq!(slot_label("DERECHA"), "Der");
    assert_eq!(slot_label("derecha"), "Der");
}

#[test]
fn slot_label_camera_and_side() {
    assert_eq!(slot_label("E1_DERECHA"), "Cam 1 · Der");
    assert_eq!(slot_label("M12_IZQUIERDA"), "Cam 12 · Izq");
    assert_eq!(slot_label("l3_derecha"), "Cam 3 · Der");
}

#[test]
fn slot_label_side_without_camera() {
    assert_eq!(slot_label("M_IZQUIERDA"), "Izq");
    assert_eq!(slot_label("E_DERECHA"), "Der");
}

#[test]
fn slot_label_passes_through_unknown_shapes() {
    assert_eq!(slot_label("X_RANDOM"), "X_RANDOM");
    assert_eq!(slot_label("X1_DERECHA"), "X1_DERECHA");
    assert_eq!(slot_label("E1A_DERECHA"), "E1A_DERECHA");
    assert_eq!(slot_label("E1_ARRIBA"), "E1_ARRIBA");
    assert_eq!(slot_label("Bahia 4"), "Bahia 4");
    assert_eq!(slot_label(""), "");
}

#[test]
fn slot_label_opt_handles_none() {
    assert_eq!(slot_label_opt(None), "");
    assert_eq!(slot_label_opt(Some("E2_IZQUIERDA")), "Cam 2 · Izq");
}

// =============================================================
// format_duration
// =============================================================

#[test]
fn format_duration_documented_values() {
    assert_eq!(format_duration(Some(0)), "00m");
    assert_eq!(format_duration(Some(90)), "01m");
    assert_eq!(format_duration(Some(3661)), "1h 01m");
    assert_eq!(format_duration(Some(90_000)), "1d 1h 00m");
    assert_eq!(format_duration(None), "--");
}

#[test]
fn format_duration_keeps_zero_hours_when_days_present() {
    assert_eq!(format_duration(Some(86_400)), "1d 0h 00m");
    assert_eq!(format_duration(Some(2 * 86_400 + 59 * 60)), "2d 0h 59m");
}

#[test]
fn format_duration_clamps_negative() {
    assert_eq!(format_duration(Some(-30)), "00m");
}
