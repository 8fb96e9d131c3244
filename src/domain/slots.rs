use serde::Serialize;

/// A named day-part with fixed clock boundaries.
///
/// `duration_hours` is an independent fact, not derived from `start`/`end`:
/// the advertised duration must stay stable even if the boundaries move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotDef {
    pub id: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    pub duration_hours: u32,
}

pub const SLOT_CATALOG: [SlotDef; 3] = [
    SlotDef {
        id: "morning",
        start: "09:00",
        end: "12:00",
        duration_hours: 3,
    },
    SlotDef {
        id: "afternoon",
        start: "12:00",
        end: "17:00",
        duration_hours: 5,
    },
    SlotDef {
        id: "evening",
        start: "17:00",
        end: "21:00",
        duration_hours: 4,
    },
];

pub fn slot_by_id(slot_id: &str) -> Option<&'static SlotDef> {
    SLOT_CATALOG.iter().find(|slot| slot.id == slot_id)
}
