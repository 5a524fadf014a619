use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use common::req::{Device, DeviceId, DevicePatch, DeviceType};
use log::{info, warn};

use crate::error::ApiError;
use crate::request::Gateway;

/// Load lifecycle of the directory as a whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    /// The previous collection (if any) is preserved; retry by calling
    /// [`DeviceStore::load`] again.
    Failed(ApiError),
}

/// Read-only aggregates over the directory, for dashboard header cards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectoryStats {
    pub total: usize,
    pub active: usize,
    pub offline: usize,
    pub low_battery: usize,
    pub by_type: HashMap<DeviceType, usize>,
}

const LOW_BATTERY_PCT: u8 = 20;

#[derive(Default)]
struct StoreState {
    devices: Vec<Device>,
    load: LoadState,
    busy: HashSet<DeviceId>,
    // pre-mutation records of in-flight optimistic actions, restored on revert
    pending: HashMap<DeviceId, Device>,
    action_errors: HashMap<DeviceId, ApiError>,
}

impl StoreState {
    fn position(&self, id: DeviceId) -> Option<usize> {
        self.devices.iter().position(|d| d.id == id)
    }
}

/// Canonical in-memory device collection with optimistic CRUD.
///
/// The single writer of device state; everything else reads snapshots.
/// Mutating actions are serialized per device id: a second trigger for an id
/// already in flight is a no-op (`Ok(false)`), surfaced through
/// [`DeviceStore::is_busy`]. Failures are recorded per id and dismissible;
/// none is fatal to the store.
pub struct DeviceStore<G> {
    gateway: Rc<G>,
    state: Rc<RefCell<StoreState>>,
}

impl<G> Clone for DeviceStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            state: self.state.clone(),
        }
    }
}

impl<G: Gateway> DeviceStore<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self {
            gateway,
            state: Rc::new(RefCell::new(StoreState::default())),
        }
    }

    /// Fetch the full collection and replace local state wholesale.
    ///
    /// On failure the previous collection stays in place and the error is
    /// exposed through [`DeviceStore::load_state`].
    pub async fn load(&self) -> Result<(), ApiError> {
        self.state.borrow_mut().load = LoadState::Loading;
        match self.gateway.devices().await {
            Ok(devices) => {
                info!("loaded {} devices", devices.len());
                let mut state = self.state.borrow_mut();
                state.devices = devices;
                state.load = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                warn!("device load failed: {err}");
                self.state.borrow_mut().load = LoadState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Optimistic toggle: flip locally, then commit the server's canonical
    /// record or revert to the saved one.
    ///
    /// Returns `Ok(false)` when the device already has an action in flight.
    pub async fn toggle_active(&self, id: DeviceId) -> Result<bool, ApiError> {
        {
            let mut state = self.state.borrow_mut();
            if state.busy.contains(&id) {
                return Ok(false);
            }
            let Some(idx) = state.position(id) else {
                state.action_errors.insert(id, ApiError::NotFound);
                return Err(ApiError::NotFound);
            };
            let saved = state.devices[idx].clone();
            state.devices[idx].active = !saved.active;
            state.pending.insert(id, saved);
            state.busy.insert(id);
            state.action_errors.remove(&id);
        }

        let result = self.gateway.toggle_device(id).await;

        let mut state = self.state.borrow_mut();
        state.busy.remove(&id);
        let saved = state.pending.remove(&id);
        match result {
            Ok(canonical) => {
                if let Some(idx) = state.position(id) {
                    state.devices[idx] = canonical;
                }
                Ok(true)
            }
            Err(err) => {
                if let (Some(saved), Some(idx)) = (saved, state.position(id)) {
                    state.devices[idx] = saved;
                }
                warn!("toggle for device {id} failed, reverted: {err}");
                state.action_errors.insert(id, err.clone());
                Err(err)
            }
        }
    }

    /// Send a partial edit (name, location). No speculative apply: the local
    /// record changes only when the server's canonical response arrives.
    pub async fn update(&self, id: DeviceId, patch: DevicePatch) -> Result<bool, ApiError> {
        {
            let mut state = self.state.borrow_mut();
            if state.busy.contains(&id) {
                return Ok(false);
            }
            if state.position(id).is_none() {
                state.action_errors.insert(id, ApiError::NotFound);
                return Err(ApiError::NotFound);
            }
            state.busy.insert(id);
            state.action_errors.remove(&id);
        }

        let result = self.gateway.update_device(id, &patch).await;

        let mut state = self.state.borrow_mut();
        state.busy.remove(&id);
        match result {
            Ok(canonical) => {
                // the server may normalize fields; its record wins
                if let Some(idx) = state.position(id) {
                    state.devices[idx] = canonical;
                }
                Ok(true)
            }
            Err(err) => {
                warn!("update for device {id} failed: {err}");
                state.action_errors.insert(id, err.clone());
                Err(err)
            }
        }
    }

    /// Request deletion. The local record is removed only after the server
    /// confirms; delete is irreversible and must never look succeeded early.
    pub async fn remove(&self, id: DeviceId) -> Result<bool, ApiError> {
        {
            let mut state = self.state.borrow_mut();
            if state.busy.contains(&id) {
                return Ok(false);
            }
            if state.position(id).is_none() {
                state.action_errors.insert(id, ApiError::NotFound);
                return Err(ApiError::NotFound);
            }
            state.busy.insert(id);
            state.action_errors.remove(&id);
        }

        let result = self.gateway.delete_device(id).await;

        let mut state = self.state.borrow_mut();
        state.busy.remove(&id);
        match result {
            Ok(()) => {
                info!("device {id} deleted");
                state.devices.retain(|d| d.id != id);
                state.action_errors.remove(&id);
                Ok(true)
            }
            Err(err) => {
                warn!("delete for device {id} failed: {err}");
                state.action_errors.insert(id, err.clone());
                Err(err)
            }
        }
    }
}

impl<G> DeviceStore<G> {
    pub fn snapshot(&self) -> Vec<Device> {
        self.state.borrow().devices.clone()
    }

    pub fn get(&self, id: DeviceId) -> Option<Device> {
        self.state.borrow().devices.iter().find(|d| d.id == id).cloned()
    }

    pub fn load_state(&self) -> LoadState {
        self.state.borrow().load.clone()
    }

    pub fn is_busy(&self, id: DeviceId) -> bool {
        self.state.borrow().busy.contains(&id)
    }

    pub fn action_error(&self, id: DeviceId) -> Option<ApiError> {
        self.state.borrow().action_errors.get(&id).cloned()
    }

    pub fn dismiss_action_error(&self, id: DeviceId) {
        self.state.borrow_mut().action_errors.remove(&id);
    }

    pub fn stats(&self) -> DirectoryStats {
        let state = self.state.borrow();
        let mut stats = DirectoryStats {
            total: state.devices.len(),
            ..Default::default()
        };
        for device in &state.devices {
            if device.active {
                stats.active += 1;
            } else {
                stats.offline += 1;
            }
            if device.battery_level.is_some_and(|level| level < LOW_BATTERY_PCT) {
                stats.low_battery += 1;
            }
            *stats.by_type.entry(device.device_type).or_default() += 1;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::req::DeviceType;

    fn device(id: DeviceId, device_type: DeviceType, active: bool, battery: Option<u8>) -> Device {
        Device {
            id,
            name: format!("dev-{id}"),
            device_type,
            location: "Centro".to_owned(),
            active,
            battery_level: battery,
            signal_strength: None,
            last_seen: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn stats_counts() {
        let devices = vec![
            device(1, DeviceType::TrafficLight, true, Some(90)),
            device(2, DeviceType::TrafficLight, false, Some(10)),
            device(3, DeviceType::AirQuality, true, None),
            device(4, DeviceType::SolarPanel, false, Some(0)),
        ];
        let mut state = StoreState::default();
        state.devices = devices;

        let store = DeviceStore {
            gateway: Rc::new(()),
            state: Rc::new(RefCell::new(state)),
        };
        let stats = store.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.offline, 2);
        assert_eq!(stats.low_battery, 2); // 10% and 0%, absent excluded
        assert_eq!(stats.by_type[&DeviceType::TrafficLight], 2);
        assert_eq!(stats.by_type[&DeviceType::AirQuality], 1);
    }
}
