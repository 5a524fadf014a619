use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use common::req::{Device, DeviceId, ReadingQuery, SensorReading, SensorType};
use log::{debug, info, warn};

use crate::dataset::{self, AggregatedRow, SeriesSummary};
use crate::error::ApiError;
use crate::request::Gateway;
use crate::utils;

#[derive(Default)]
struct BrowserState {
    directory: Vec<Device>,
    types: Vec<SensorType>,
    /// Stage-2 choices: the full directory until a type narrows it.
    eligible: Vec<Device>,
    selected_type: Option<SensorType>,
    selected_device: Option<DeviceId>,
    /// None = now-24h..now, evaluated at query time.
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    readings: Vec<SensorReading>,
    rows: Vec<AggregatedRow>,
    summary: Option<SeriesSummary>,
    /// Bumped on every selection change; a response is applied only while
    /// it still matches, so superseded requests are discarded, never
    /// applied out of order.
    generation: u64,
    loading: bool,
    error: Option<ApiError>,
}

impl BrowserState {
    fn clear_chart(&mut self) {
        self.readings.clear();
        self.rows.clear();
        self.summary = None;
    }
}

/// Two-stage dependent selection: a sensor type, then a device constrained
/// to those that have reported that type. A reading query is issued only
/// when BOTH are selected.
///
/// Single-threaded and cooperative: methods take `&self`, share state
/// through `Rc`, and never hold a borrow across an await point.
pub struct SensorBrowser<G> {
    gateway: Rc<G>,
    state: Rc<RefCell<BrowserState>>,
}

impl<G> Clone for SensorBrowser<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            state: self.state.clone(),
        }
    }
}

impl<G: Gateway> SensorBrowser<G> {
    pub fn new(gateway: Rc<G>) -> Self {
        Self {
            gateway,
            state: Rc::new(RefCell::new(BrowserState::default())),
        }
    }

    async fn fetch_catalog(&self) -> Result<(Vec<Device>, Vec<SensorType>), ApiError> {
        let devices = self.gateway.devices().await?;
        let types = self.gateway.sensor_types().await?;
        Ok((devices, types))
    }

    /// Fetch the full directory and the available sensor types.
    pub async fn load(&self) -> Result<(), ApiError> {
        {
            let mut state = self.state.borrow_mut();
            state.loading = true;
            state.error = None;
        }
        match self.fetch_catalog().await {
            Ok((devices, types)) => {
                let mut state = self.state.borrow_mut();
                info!(
                    "catalog loaded: {} devices, {} sensor types",
                    devices.len(),
                    types.len()
                );
                if state.selected_type.is_none() {
                    state.eligible = devices.clone();
                }
                state.directory = devices;
                state.types = types;
                state.loading = false;
                Ok(())
            }
            Err(err) => {
                warn!("catalog load failed: {err}");
                let mut state = self.state.borrow_mut();
                state.loading = false;
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Stage-1 selection. `None` clears the type and restores the full
    /// directory without a network call; `Some` queries the devices
    /// eligible for that type and clears the device selection if it is
    /// absent from the response. A response for a superseded selection is
    /// discarded.
    pub async fn select_type(&self, sensor_type: Option<SensorType>) -> Result<(), ApiError> {
        let Some(sensor_type) = sensor_type else {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.selected_type = None;
            state.clear_chart();
            state.error = None;
            let directory = state.directory.clone();
            state.eligible = directory;
            state.loading = false;
            return Ok(());
        };

        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.selected_type = Some(sensor_type);
            state.clear_chart();
            state.error = None;
            state.loading = true;
            state.generation
        };

        let result = self.gateway.devices_by_type(sensor_type).await;
        {
            let mut state = self.state.borrow_mut();
            if state.generation != generation {
                debug!("discarding stale device list for {sensor_type}");
                return Ok(());
            }
            state.loading = false;
            match result {
                Ok(devices) => {
                    if let Some(id) = state.selected_device {
                        if !devices.iter().any(|d| d.id == id) {
                            debug!("device {id} not eligible for {sensor_type}, selection cleared");
                            state.selected_device = None;
                        }
                    }
                    state.eligible = devices;
                }
                Err(err) => {
                    warn!("eligibility query for {sensor_type} failed: {err}");
                    state.error = Some(err.clone());
                    return Err(err);
                }
            }
        }

        // a surviving device selection re-issues the reading query
        if self.state.borrow().selected_device.is_some() {
            self.fetch_readings(generation).await?;
        }
        Ok(())
    }

    /// Stage-2 selection. Rejected as a no-op (`Ok(false)`) when the device
    /// is not in the current eligible list.
    pub async fn select_device(&self, device: Option<DeviceId>) -> Result<bool, ApiError> {
        let generation = {
            let mut state = self.state.borrow_mut();
            if let Some(id) = device {
                if !state.eligible.iter().any(|d| d.id == id) {
                    warn!("device {id} is not eligible for the current sensor type");
                    return Ok(false);
                }
            }
            state.generation += 1;
            state.selected_device = device;
            state.clear_chart();
            state.error = None;
            state.generation
        };
        self.fetch_readings(generation).await?;
        Ok(true)
    }

    /// Re-issue the reading query for the current selection (manual retry,
    /// or a periodic refresh).
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.error = None;
            state.generation
        };
        self.fetch_readings(generation).await
    }

    /// Bound the reading window and re-query when fully selected.
    pub async fn set_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let generation = {
            let mut state = self.state.borrow_mut();
            state.window = Some((start, end));
            state.generation += 1;
            state.generation
        };
        self.fetch_readings(generation).await
    }

    /// Reading query for the current pair; a no-op unless both a type and a
    /// device are selected. The response is dropped if the selection moved
    /// on while it was in flight.
    async fn fetch_readings(&self, generation: u64) -> Result<(), ApiError> {
        let query = {
            let state = self.state.borrow();
            let (Some(sensor_type), Some(device_id)) =
                (state.selected_type, state.selected_device)
            else {
                return Ok(());
            };
            let (start, end) = state.window.unwrap_or_else(utils::default_window);
            ReadingQuery {
                device_id,
                sensor_type,
                start,
                end,
            }
        };
        self.state.borrow_mut().loading = true;

        let result = self.gateway.readings(&query).await;

        let mut state = self.state.borrow_mut();
        if state.generation != generation {
            debug!("discarding stale readings for device {}", query.device_id);
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(readings) => {
                debug!(
                    "{} readings for device {} ({})",
                    readings.len(),
                    query.device_id,
                    query.sensor_type
                );
                state.rows = dataset::aggregate(&readings);
                state.summary = dataset::summarize(&readings, query.sensor_type);
                state.readings = readings;
                Ok(())
            }
            Err(err) => {
                warn!("reading query for device {} failed: {err}", query.device_id);
                state.error = Some(err.clone());
                Err(err)
            }
        }
    }
}

impl<G> SensorBrowser<G> {
    pub fn types(&self) -> Vec<SensorType> {
        self.state.borrow().types.clone()
    }

    /// The stage-2 device list: the full directory until a type narrows it.
    pub fn devices(&self) -> Vec<Device> {
        self.state.borrow().eligible.clone()
    }

    pub fn selected_type(&self) -> Option<SensorType> {
        self.state.borrow().selected_type
    }

    pub fn selected_device(&self) -> Option<DeviceId> {
        self.state.borrow().selected_device
    }

    pub fn readings(&self) -> Vec<SensorReading> {
        self.state.borrow().readings.clone()
    }

    /// Chart-ready rows for the applied reading set.
    pub fn rows(&self) -> Vec<AggregatedRow> {
        self.state.borrow().rows.clone()
    }

    pub fn summary(&self) -> Option<SeriesSummary> {
        self.state.borrow().summary
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// View-scoped error of the last failed read, if any. Retry with
    /// [`SensorBrowser::load`], [`SensorBrowser::refresh`] or by
    /// re-selecting.
    pub fn error(&self) -> Option<ApiError> {
        self.state.borrow().error.clone()
    }
}
