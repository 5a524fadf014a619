//! Terminal walk-through of the state layer against a live gateway:
//! loads the directory, prints it battery-first, then drills into the
//! first sensor type / eligible device pair and dumps the chart rows.
//!
//! Point it at a gateway with `IOT_API_URL` (default
//! `http://127.0.0.1:8080/api`).

use std::rc::Rc;

use anyhow::Result;
use client::devices::DeviceStore;
use client::filter::{filter_and_sort, DeviceQuery, SortKey};
use client::sensors::SensorBrowser;
use client::{utils, Config, HttpGateway};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env();
    let gateway = Rc::new(HttpGateway::new(&config)?);

    let store = DeviceStore::new(gateway.clone());
    store.load().await?;

    let query = DeviceQuery {
        sort: SortKey::Battery,
        ..Default::default()
    };
    let now = chrono::Utc::now();
    for device in filter_and_sort(&store.snapshot(), &query) {
        println!(
            "{} {:<24} {:<20} bat {:>3}%  seen {} ago",
            device.device_type.icon(),
            device.name,
            device.location,
            device.battery_level.map_or("  -".to_owned(), |v| v.to_string()),
            utils::last_seen_age(device.last_seen, now),
        );
    }

    let stats = store.stats();
    println!(
        "\n{} devices, {} active, {} offline, {} low battery",
        stats.total, stats.active, stats.offline, stats.low_battery
    );

    let browser = SensorBrowser::new(gateway);
    browser.load().await?;

    let Some(sensor_type) = browser.types().first().copied() else {
        println!("no sensor data reported yet");
        return Ok(());
    };
    browser.select_type(Some(sensor_type)).await?;

    let Some(device_id) = browser.devices().first().map(|d| d.id) else {
        println!("no device has reported {}", sensor_type.label());
        return Ok(());
    };
    browser.select_device(Some(device_id)).await?;

    println!(
        "\n{} on device {device_id}, last 24h:",
        sensor_type.label()
    );
    for row in browser.rows() {
        let value = row
            .values
            .get(&sensor_type)
            .map_or("-".to_owned(), |v| format!("{v:.1}"));
        println!("  {}  {value} {}", row.bucket, sensor_type.unit());
    }
    if let Some(summary) = browser.summary() {
        println!(
            "  current {:.1} / avg {:.1} / min {:.1} / max {:.1} {}",
            summary.current,
            summary.average,
            summary.min,
            summary.max,
            sensor_type.unit()
        );
    }

    Ok(())
}
