//! Slot transition policy
//!
//! Pure decision functions over the slot status graph:
//!
//! ```text
//! available   -> occupied | reserved
//! occupied    -> available | maintenance
//! reserved    -> occupied | available
//! maintenance -> available
//! ```
//!
//! Charging pads carry a battery sub-state. Entering `occupied` starts
//! charging, entering `available` means charged, and a swap toggles
//! `charging <-> swapped` without touching the slot status.

use crate::domain::{BatteryStatus, DomainError, DomainResult, Slot, SlotKind, SlotStatus};
use crate::support::random::RandomSource;

/// How the next status is chosen
pub enum TransitionContext<'a> {
    /// Uniform choice among outgoing edges
    Random(&'a mut dyn RandomSource),
    /// Follow exactly this edge
    Target(SlotStatus),
}

/// Decided status change for one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SlotStatus,
    pub to: SlotStatus,
    /// Next battery status; `None` for parking spaces
    pub battery: Option<BatteryStatus>,
}

impl Transition {
    /// Whether the station's available count may change
    pub fn affects_availability(&self) -> bool {
        self.from != self.to && (self.from == SlotStatus::Available || self.to == SlotStatus::Available)
    }
}

/// Outgoing edges of `status`
pub fn outgoing(status: SlotStatus) -> &'static [SlotStatus] {
    match status {
        SlotStatus::Available => &[SlotStatus::Occupied, SlotStatus::Reserved],
        SlotStatus::Occupied => &[SlotStatus::Available, SlotStatus::Maintenance],
        SlotStatus::Reserved => &[SlotStatus::Occupied, SlotStatus::Available],
        SlotStatus::Maintenance => &[SlotStatus::Available],
    }
}

pub fn is_allowed(from: SlotStatus, to: SlotStatus) -> bool {
    outgoing(from).contains(&to)
}

/// Battery status after a slot of `kind` enters `to`
pub fn battery_on_enter(
    kind: SlotKind,
    to: SlotStatus,
    current: Option<BatteryStatus>,
) -> Option<BatteryStatus> {
    if !kind.has_battery() {
        return None;
    }
    match to {
        SlotStatus::Occupied => Some(BatteryStatus::Charging),
        SlotStatus::Available => Some(BatteryStatus::Charged),
        SlotStatus::Reserved | SlotStatus::Maintenance => {
            Some(current.unwrap_or(BatteryStatus::Charged))
        }
    }
}

/// Decide the next status and battery for a slot
pub fn decide(
    status: SlotStatus,
    kind: SlotKind,
    battery: Option<BatteryStatus>,
    context: TransitionContext<'_>,
) -> DomainResult<Transition> {
    let to = match context {
        TransitionContext::Random(rng) => {
            let edges = outgoing(status);
            edges[rng.index(edges.len())]
        }
        TransitionContext::Target(to) => {
            if !is_allowed(status, to) {
                return Err(DomainError::InvalidTransition { from: status, to });
            }
            to
        }
    };

    Ok(Transition {
        from: status,
        to,
        battery: battery_on_enter(kind, to, battery),
    })
}

/// [`decide`] for an existing slot
pub fn decide_for(slot: &Slot, context: TransitionContext<'_>) -> DomainResult<Transition> {
    decide(slot.status, slot.kind, slot.battery_status, context)
}

/// Battery after a swap: `charging -> swapped`, anything else `-> charging`
pub fn toggle_battery(current: BatteryStatus) -> BatteryStatus {
    match current {
        BatteryStatus::Charging => BatteryStatus::Swapped,
        _ => BatteryStatus::Charging,
    }
}

/// Whether a battery swap can happen on `slot` right now
pub fn can_swap(slot: &Slot) -> bool {
    slot.is_charging_pad() && slot.status == SlotStatus::Occupied
}

/// Battery after swapping on `slot`, or `None` if the slot is not swappable
pub fn battery_swap(slot: &Slot) -> Option<BatteryStatus> {
    can_swap(slot).then(|| toggle_battery(slot.battery_status.unwrap_or(BatteryStatus::Charging)))
}

// ── Tests ──────────────────────────────────────────────────────
