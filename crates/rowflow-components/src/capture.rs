//! Capture: in-memory destination with a shared inspection handle

use rowflow_core::{ClassRef, Component, Destination, Row};
use rowflow_registry::{ComponentRegistry, RegistryError, Role};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct CaptureState {
    rows: Vec<Row>,
    closes: usize,
}

/// Shared view of what a [`CaptureDestination`] received.
///
/// Cloning the handle shares the same buffer, so a job's destination and the
/// code inspecting it after the run see the same rows.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    state: Arc<Mutex<CaptureState>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CaptureState> {
        // A poisoned buffer still holds every row written before the panic.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn rows(&self) -> Vec<Row> {
        self.state().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.state().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().rows.is_empty()
    }

    /// How many times a destination writing here was closed.
    pub fn closes(&self) -> usize {
        self.state().closes
    }

    pub fn destination(&self) -> CaptureDestination {
        CaptureDestination {
            capture: self.clone(),
            closed: false,
        }
    }

    /// Class form writing into this handle: `CaptureDestination()`.
    pub fn class(&self) -> ClassRef {
        self.named_class("CaptureDestination")
    }

    /// Same as [`Capture::class`] under another name, for jobs with several
    /// capture destinations in one registry.
    pub fn named_class(&self, name: &str) -> ClassRef {
        let capture = self.clone();
        ClassRef::new(name, move |_args: &[Value]| {
            Ok(Component::destination(capture.destination()))
        })
        .with_arity(0)
    }

    pub fn register(&self, registry: &mut ComponentRegistry) -> Result<(), RegistryError> {
        registry.register(Role::Destination, self.class())
    }
}

/// Collects written rows into a [`Capture`].
#[derive(Debug)]
pub struct CaptureDestination {
    capture: Capture,
    closed: bool,
}

impl Destination for CaptureDestination {
    fn write(&mut self, row: &Row) -> anyhow::Result<()> {
        if self.closed {
            anyhow::bail!("write after close");
        }
        self.capture.state().rows.push(row.clone());
        Ok(())
    }

    fn close(&mut self) -> anyhow::Result<()> {
        if self.closed {
            anyhow::bail!("already closed");
        }
        self.closed = true;
        self.capture.state().closes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_and_closes_once() {
        let capture = Capture::new();
        let mut destination = capture.destination();

        destination.write(&json!({"id": 1})).unwrap();
        destination.write(&json!({"id": 2})).unwrap();
        destination.close().unwrap();

        assert_eq!(capture.rows(), vec![json!({"id": 1}), json!({"id": 2})]);
        assert_eq!(capture.closes(), 1);
        assert!(destination.write(&json!({"id": 3})).is_err());
        assert!(destination.close().is_err());
        assert_eq!(capture.len(), 2);
    }

    #[test]
    fn test_class_takes_no_arguments() {
        let capture = Capture::new();
        assert!(capture.class().construct(&[]).is_ok());
        assert!(capture.class().construct(&[json!(1)]).is_err());
        assert!(capture.is_empty());
    }
}
