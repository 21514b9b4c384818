//! RenderSink trait - synchronizer output interface
//!
//! Defines the abstract interface for the composite renderer.

use crate::{Composite, ContractError};

/// Composite output trait
///
/// All render sink implementations must implement this trait. The
/// synchronizer owns its sink and calls it from its own thread.
pub trait RenderSink<P>: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Draw one composite grid
    ///
    /// # Errors
    /// Returns render error (should include context). The synchronizer logs
    /// it and keeps running.
    fn render_grid(&mut self, composite: &Composite<P>) -> Result<(), ContractError>;

    /// Check whether the user asked to quit
    fn poll_quit(&mut self) -> bool;

    /// Release sink resources
    fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

impl<P, S: RenderSink<P> + ?Sized> RenderSink<P> for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn render_grid(&mut self, composite: &Composite<P>) -> Result<(), ContractError> {
        (**self).render_grid(composite)
    }

    fn poll_quit(&mut self) -> bool {
        (**self).poll_quit()
    }

    fn close(&mut self) -> Result<(), ContractError> {
        (**self).close()
    }
}
