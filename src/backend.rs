//! Backend driver boundary.
//!
//! A backend accepts a [`Program`] and returns a [`Readout`]. Teardown is
//! scoped: a [`Session`] disconnects its backend when dropped, so every exit
//! path from a run (success, error, or panic) releases the device state.

use tracing::debug;

use crate::engine::{EngineConfig, ExecutionEngine, Readout};
use crate::error::{Error, Result};
use crate::isa::Program;

/// Name accepted by [`connect`] for the built-in simulator.
pub const SIMULATOR: &str = "simulator";

/// A device (simulated or physical) that executes programs.
pub trait Backend {
    fn name(&self) -> &str;

    /// Executes a full program and returns its readout.
    fn execute(&mut self, program: &Program) -> Result<Readout>;

    /// Releases all device state. Must be idempotent.
    fn disconnect(&mut self);
}

/// Backend running programs on an [`ExecutionEngine`].
#[derive(Debug)]
pub struct SimulatorBackend {
    engine: ExecutionEngine,
}

impl SimulatorBackend {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self {
            engine: ExecutionEngine::new(config)?,
        })
    }

    pub fn engine(&self) -> &ExecutionEngine {
        &self.engine
    }
}

impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        SIMULATOR
    }

    fn execute(&mut self, program: &Program) -> Result<Readout> {
        self.engine.execute(program)
    }

    fn disconnect(&mut self) {
        self.engine.disconnect();
    }
}

/// Connects to a backend by name.
///
/// Only the built-in `"simulator"` is available; any other name yields
/// [`Error::BackendUnavailable`].
pub fn connect(name: &str, config: EngineConfig) -> Result<Box<dyn Backend + Send>> {
    match name {
        SIMULATOR => {
            debug!(backend = name, "connected");
            Ok(Box::new(SimulatorBackend::new(config)?))
        }
        other => Err(Error::BackendUnavailable(format!(
            "no backend named '{other}' (available: {SIMULATOR})"
        ))),
    }
}

/// Scoped use of a backend; disconnects on drop.
pub struct Session<'a, B: Backend + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: Backend + ?Sized> Session<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    pub fn execute(&mut self, program: &Program) -> Result<Readout> {
        self.backend.execute(program)
    }
}

impl<B: Backend + ?Sized> Drop for Session<'_, B> {
    fn drop(&mut self) {
        self.backend.disconnect();
        debug!(backend = self.backend.name(), "disconnected");
    }
}

/// Executes `program` inside a [`Session`], disconnecting afterwards.
pub fn execute_scoped<B: Backend + ?Sized>(backend: &mut B, program: &Program) -> Result<Readout> {
    Session::new(backend).execute(program)
}
