//! Demultiplexing of transport notifications into readings.
//!
//! The transport delivers notifications for every device on one channel.
//! A [`NotificationRouter`] belongs to one device: it drops notifications
//! addressed to other devices, resolves the characteristic back to component
//! names, decodes the payload, caches the result and publishes it.
//!
//! Routing is synchronous and performs no I/O, so it can run directly on the
//! task that drains the transport channel.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use sensorlink_types::{DeviceFamily, Reading};

use crate::events::{DeviceEvent, EventDispatcher};
use crate::transport::RawNotification;

/// Routes notifications for a single device.
#[derive(Debug)]
pub struct NotificationRouter {
    device_id: String,
    address: String,
    family: DeviceFamily,
    last_readings: RwLock<HashMap<String, Reading>>,
    events: EventDispatcher,
}

impl NotificationRouter {
    /// Create a router for one device.
    pub fn new(
        device_id: impl Into<String>,
        address: impl Into<String>,
        family: DeviceFamily,
        events: EventDispatcher,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            address: address.into(),
            family,
            last_readings: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Handle one notification, returning the readings it produced.
    ///
    /// Zero values are treated as noise: they are neither cached nor
    /// published.
    pub fn route(&self, notification: &RawNotification) -> Vec<Reading> {
        if notification.address != self.address {
            return Vec::new();
        }

        let components = self.family.components_for(&notification.profile);
        if components.is_empty() {
            debug!(
                "{}: no component for {}, ignoring",
                self.device_id, notification.profile
            );
            return Vec::new();
        }

        let mut published = Vec::with_capacity(components.len());
        for component in components {
            let decoded = match self.family.decode(component, &notification.payload) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!("{}: dropping {} notification: {}", self.device_id, component, e);
                    continue;
                }
            };

            if decoded.value.is_zero() {
                debug!("{}: skipping zero {} value", self.device_id, component);
                continue;
            }

            let reading = Reading::now(&self.device_id, component, &decoded);
            debug!(
                "Device notification component {} value {}",
                component, reading.value
            );

            self.last_readings
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(component.to_string(), reading.clone());
            self.events.send(DeviceEvent::Reading {
                reading: reading.clone(),
            });
            published.push(reading);
        }
        published
    }

    /// Most recent reading of a component.
    pub fn last_reading(&self, component: &str) -> Option<Reading> {
        self.last_readings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(component)
            .cloned()
    }

    /// Most recent reading of every component that has reported.
    pub fn last_readings(&self) -> Vec<Reading> {
        let cache = self.last_readings.read().unwrap_or_else(|e| e.into_inner());
        let mut readings: Vec<Reading> = cache.values().cloned().collect();
        readings.sort_by(|a, b| a.component.cmp(&b.component));
        readings
    }
}

/// A running notification listener.
///
/// Dropping the handle cancels the listener task.
#[derive(Debug)]
pub struct ListenerHandle {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ListenerHandle {
    /// Drain `receiver` into `router` on a background task.
    pub fn spawn(
        router: Arc<NotificationRouter>,
        mut receiver: broadcast::Receiver<RawNotification>,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => {
                        debug!("{}: notification listener stopped", router.device_id);
                        break;
                    }
                    received = receiver.recv() => match received {
                        Ok(notification) => {
                            router.route(&notification);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("{}: notification listener lagged, {} dropped", router.device_id, skipped);
                        }
                        Err(RecvError::Closed) => {
                            debug!("{}: notification channel closed", router.device_id);
                            break;
                        }
                    }
                }
            }
        });

        Self {
            cancel_token,
            handle,
        }
    }

    /// Stop the listener.
    pub fn stop(self) {
        self.cancel_token.cancel();
    }

    /// Whether the listener task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
