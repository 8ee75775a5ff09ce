/// First-fit scan over a slot-availability bitset.
///
/// `needed = ceil(duration_minutes / slot_minutes)` consecutive `'1'` slots;
/// returns the earliest qualifying start slot, or `None` when no contiguous
/// block is free. Bitsets are bounded by slots-per-day, so the linear scan
/// is plenty.
pub fn earliest_free_slot(bitset: &str, slot_minutes: u32, duration_minutes: u32) -> Option<usize> {
    if slot_minutes == 0 || duration_minutes == 0 {
        return None;
    }
    let needed = duration_minutes.div_ceil(slot_minutes) as usize;
    let slots = bitset.as_bytes();
    if needed == 0 || needed > slots.len() {
        return None;
    }
    slots
        .windows(needed)
        .position(|w| w.iter().all(|&b| b == b'1'))
}

/// Parse "HH:MM" into minutes since midnight.
pub fn hhmm_to_minutes(hhmm: &str) -> Option<u32> {
    let (h, m) = hhmm.split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Render minutes since midnight as a 12-hour clock label, e.g. "8:00 AM".
pub fn minutes_to_12h(minutes: u32) -> String {
    let h24 = (minutes / 60) % 24;
    let m = minutes % 60;
    let suffix = if h24 < 12 { "AM" } else { "PM" };
    let mut h = h24 % 12;
    if h == 0 {
        h = 12;
    }
    format!("{h}:{m:02} {suffix}")
}

/// Wall-clock label for a slot index given the space's opening time.
pub fn slot_to_12h(slot_index: usize, opening_hhmm: &str, slot_minutes: u32) -> Option<String> {
    let open = hhmm_to_minutes(opening_hhmm)?;
    Some(minutes_to_12h(open + slot_index as u32 * slot_minutes))
}
