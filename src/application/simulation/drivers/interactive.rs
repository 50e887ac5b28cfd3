//! Interactive driver
//!
//! Reads one command per line and applies a single station-scoped change.
//! Input and output are generic async streams so the loop can be driven
//! from stdin/stdout or from in-memory buffers.

use std::fmt::Write as _;
use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::application::simulation::context::{report, AppliedChange, SimulationContext};
use crate::application::simulation::policy;
use crate::domain::{DomainError, DomainResult, SlotStatus};
use crate::support::shutdown::ShutdownSignal;

pub const HELP: &str = "\
Commands:
  arrive <station_id>  - vehicle arrives at a random available slot
  depart <station_id>  - vehicle leaves a random occupied slot
  swap <station_id>    - battery swap at a random occupied charging pad
  status               - show all stations and slots
  quit                 - exit";

pub const PROMPT: &str = "> ";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Arrive(String),
    Depart(String),
    Swap(String),
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    /// Tokens after the ones a command takes are ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().map(str::to_lowercase);
        let station = parts.next().map(str::to_string);

        match (verb.as_deref(), station) {
            (Some("arrive"), Some(station)) => Ok(Self::Arrive(station)),
            (Some("depart"), Some(station)) => Ok(Self::Depart(station)),
            (Some("swap"), Some(station)) => Ok(Self::Swap(station)),
            (Some("status"), _) => Ok(Self::Status),
            (Some("quit" | "exit"), _) => Ok(Self::Quit),
            _ => Err("Invalid command".to_string()),
        }
    }
}

pub struct InteractiveDriver {
    ctx: SimulationContext,
}

impl InteractiveDriver {
    pub fn new(ctx: SimulationContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// Run one command and return the text to show the operator
    pub async fn execute(&mut self, command: &Command) -> String {
        let outcome = match command {
            Command::Status => return self.status_report(),
            Command::Quit => return "Bye".to_string(),
            Command::Arrive(station) => self.arrive(station).await,
            Command::Depart(station) => self.depart(station).await,
            Command::Swap(station) => self.swap(station).await,
        };

        match outcome {
            Ok(applied) => describe(&applied),
            Err(DomainError::NoCandidates(notice)) => notice,
            Err(e) => {
                report("interactive", &e);
                format!("Update failed: {e}")
            }
        }
    }

    async fn arrive(&mut self, station: &str) -> DomainResult<AppliedChange> {
        let slot = self
            .ctx
            .pick_slot(|s| s.station_id == station && s.status == SlotStatus::Available)
            .ok_or_else(|| DomainError::NoCandidates(format!("No available slots at station {station}")))?;
        self.ctx.transition(&slot.id, Some(SlotStatus::Occupied)).await
    }

    async fn depart(&mut self, station: &str) -> DomainResult<AppliedChange> {
        let slot = self
            .ctx
            .pick_slot(|s| s.station_id == station && s.status == SlotStatus::Occupied)
            .ok_or_else(|| DomainError::NoCandidates(format!("No occupied slots at station {station}")))?;
        self.ctx.transition(&slot.id, Some(SlotStatus::Available)).await
    }

    async fn swap(&mut self, station: &str) -> DomainResult<AppliedChange> {
        let slot = self
            .ctx
            .pick_slot(|s| s.station_id == station && policy::can_swap(s))
            .ok_or_else(|| {
                DomainError::NoCandidates(format!(
                    "No occupied charging pads at station {station}"
                ))
            })?;
        self.ctx.swap_battery(&slot.id).await
    }

    /// Per-station availability and per-slot status lines
    pub fn status_report(&self) -> String {
        let registry = self.ctx.registry();
        let mut out = String::new();
        for station in registry.stations() {
            let slots = registry.get_slots_by_station(&station.id);
            let available = slots.iter().filter(|s| s.status == SlotStatus::Available).count();
            let occupied = slots.iter().filter(|s| s.status == SlotStatus::Occupied).count();

            let _ = writeln!(out, "{} ({})", station.name, station.id);
            let _ = writeln!(
                out,
                "  Slots: {}/{} available, {} occupied",
                available,
                slots.len(),
                occupied
            );
            for slot in slots {
                let battery = slot.battery_status.map(|b| b.as_str()).unwrap_or("N/A");
                let _ = writeln!(
                    out,
                    "    Slot {}: {} (battery: {})",
                    slot.slot_index, slot.status, battery
                );
            }
        }
        out.trim_end().to_string()
    }

    /// Read commands until `quit`, end of input, or shutdown
    pub async fn run<R, W>(
        &mut self,
        input: R,
        output: &mut W,
        shutdown: &ShutdownSignal,
    ) -> std::io::Result<u64>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("▶️ Interactive simulation started");
        output.write_all(HELP.as_bytes()).await?;
        output.write_all(b"\n").await?;

        let mut lines = input.lines();
        let mut executed = 0u64;
        loop {
            if shutdown.is_triggered() {
                break;
            }
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = shutdown.stopped() => break,
            };
            let Some(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let reply = match line.parse::<Command>() {
                Ok(Command::Quit) => break,
                Ok(command) => {
                    executed += 1;
                    self.execute(&command).await
                }
                Err(invalid) => invalid,
            };
            output.write_all(reply.as_bytes()).await?;
            output.write_all(b"\n").await?;
        }

        output.flush().await?;
        info!(commands = executed, "⏹️ Interactive simulation stopped");
        Ok(executed)
    }
}

fn describe(applied: &AppliedChange) -> String {
    let battery = applied
        .battery
        .map(|b| format!(" (battery: {b})"))
        .unwrap_or_default();
    if applied.from == applied.to {
        format!(
            "Slot {} at station {}: battery swapped{}",
            applied.slot_index, applied.station_id, battery
        )
    } else {
        format!(
            "Slot {} at station {}: {} -> {}{}",
            applied.slot_index, applied.station_id, applied.from, applied.to, battery
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::application::simulation::registry::SlotRegistry;
    use crate::config::CollectionIds;
    use crate::domain::{BatteryStatus, DocumentId, DocumentStore, Slot, SlotKind, Station, StationKind};
    use crate::infrastructure::InMemoryStore;
    use crate::support::random::ScriptedRandom;
    use crate::support::time::SystemClock;

    async fn driver(slots: Vec<Slot>) -> (Arc<InMemoryStore>, InteractiveDriver) {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let station = Station::new("st1", "MG Road Hub", StationKind::Hybrid, slots.len() as u32);
        store
            .create("stations", DocumentId::Custom("st1".into()), station.to_fields(now))
            .await
            .unwrap();
        for slot in &slots {
            store
                .create("slots", DocumentId::Custom(slot.id.clone()), slot.to_fields(now))
                .await
                .unwrap();
        }
        let ctx = SimulationContext::new(
            store.clone(),
            CollectionIds::default(),
            Arc::new(SystemClock),
            Box::new(ScriptedRandom::new()),
        )
        .with_registry(SlotRegistry::from_parts(vec![station], slots));
        (store, InteractiveDriver::new(ctx))
    }

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!("ARRIVE st1".parse::<Command>(), Ok(Command::Arrive("st1".into())));
        assert_eq!("  status ".parse::<Command>(), Ok(Command::Status));
        assert_eq!("Quit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!("arrive".parse::<Command>(), Err("Invalid command".to_string()));
        assert_eq!("dance st1".parse::<Command>(), Err("Invalid command".to_string()));
    }

    #[test]
    fn extra_tokens_are_ignored() {
        assert_eq!("arrive st1 foo".parse::<Command>(), Ok(Command::Arrive("st1".into())));
        assert_eq!("swap St_2 now please".parse::<Command>(), Ok(Command::Swap("St_2".into())));
        assert_eq!("status all".parse::<Command>(), Ok(Command::Status));
        assert_eq!("quit now".parse::<Command>(), Ok(Command::Quit));
    }

    #[tokio::test]
    async fn double_swap_returns_to_charging() {
        let (store, mut driver) = driver(vec![Slot::new(
            "p1",
            "st1",
            1,
            SlotKind::ChargingPad,
            SlotStatus::Occupied,
            Some(BatteryStatus::Charging),
        )])
        .await;

        driver.execute(&Command::Swap("st1".into())).await;
        let slot = driver.context().registry().slot("p1").unwrap();
        assert_eq!(slot.status, SlotStatus::Occupied);
        assert_eq!(slot.battery_status, Some(BatteryStatus::Swapped));

        driver.execute(&Command::Swap("st1".into())).await;
        let slot = driver.context().registry().slot("p1").unwrap();
        assert_eq!(slot.battery_status, Some(BatteryStatus::Charging));

        let doc = store.get("slots", "p1").await.unwrap();
        assert_eq!(doc.get_str("batteryStatus"), Some("charging"));
        assert_eq!(doc.get_str("status"), Some("occupied"));
    }

    #[tokio::test]
    async fn arrive_then_depart_restores_availability() {
        let (store, mut driver) = driver(vec![Slot::new(
            "p1",
            "st1",
            1,
            SlotKind::ChargingPad,
            SlotStatus::Available,
            Some(BatteryStatus::Charged),
        )])
        .await;

        driver.execute(&Command::Arrive("st1".into())).await;
        assert_eq!(
            driver.context().registry().station("st1").unwrap().available_slots,
            0
        );

        driver.execute(&Command::Depart("st1".into())).await;
        let slot = driver.context().registry().slot("p1").unwrap();
        assert_eq!(slot.status, SlotStatus::Available);
        assert_eq!(slot.battery_status, Some(BatteryStatus::Charged));

        let station = store.get("stations", "st1").await.unwrap();
        assert_eq!(station.fields["availableSlots"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn missing_candidate_prints_notice() {
        let (_store, mut driver) = driver(vec![Slot::new(
            "s1",
            "st1",
            1,
            SlotKind::ParkingSpace,
            SlotStatus::Available,
            None,
        )])
        .await;
        let reply = driver.execute(&Command::Depart("st1".into())).await;
        assert_eq!(reply, "No occupied slots at station st1");
        let reply = driver.execute(&Command::Swap("st1".into())).await;
        assert_eq!(reply, "No occupied charging pads at station st1");
    }

    #[tokio::test]
    async fn status_lists_every_slot() {
        let (_store, driver) = driver(vec![
            Slot::new("s1", "st1", 1, SlotKind::ParkingSpace, SlotStatus::Available, None),
            Slot::new(
                "p1",
                "st1",
                2,
                SlotKind::ChargingPad,
                SlotStatus::Occupied,
                Some(BatteryStatus::Charging),
            ),
        ])
        .await;

        let report = driver.status_report();
        assert_eq!(
            report,
            "MG Road Hub (st1)\n  Slots: 1/2 available, 1 occupied\n    Slot 1: available (battery: N/A)\n    Slot 2: occupied (battery: charging)"
        );
    }

    #[tokio::test]
    async fn run_stops_at_quit_and_reports_invalid_input() {
        let (_store, mut driver) = driver(vec![Slot::new(
            "s1",
            "st1",
            1,
            SlotKind::ParkingSpace,
            SlotStatus::Available,
            None,
        )])
        .await;

        let input: &[u8] = b"hello\narrive st1\nquit\narrive st1\n";
        let mut output: Vec<u8> = Vec::new();
        let executed = driver
            .run(input, &mut output, &ShutdownSignal::new())
            .await
            .unwrap();

        assert_eq!(executed, 1);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Invalid command"));
        assert!(text.contains("available -> occupied"));
        assert_eq!(
            driver.context().registry().slot("s1").unwrap().status,
            SlotStatus::Occupied
        );
    }
}
