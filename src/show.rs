//! Display settings handed to a visualization backend.

use std::num::NonZeroU32;

use crate::error::{OperationError, Result};
use crate::math::Positions;

/// Display options for a point pool. The set of options is closed; each
/// setter validates its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowOptions {
    radius: Option<NonZeroU32>,
    color: Option<[u8; 3]>,
    alpha: Option<f32>,
    vertex_ids: bool,
}

impl ShowOptions {
    /// Point radius in pixels.
    #[must_use]
    pub fn radius(&self) -> Option<NonZeroU32> {
        self.radius
    }

    /// Sets the point radius in pixels.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` for a zero radius.
    pub fn set_radius(&mut self, pixels: u32) -> Result<()> {
        let radius = NonZeroU32::new(pixels)
            .ok_or_else(|| OperationError::InvalidInput("radius must be positive".into()))?;
        self.radius = Some(radius);
        Ok(())
    }

    /// Point color as RGB.
    #[must_use]
    pub fn color(&self) -> Option<[u8; 3]> {
        self.color
    }

    /// Sets the point color.
    pub fn set_color(&mut self, rgb: [u8; 3]) {
        self.color = Some(rgb);
    }

    /// Opacity in `[0, 1]`.
    #[must_use]
    pub fn alpha(&self) -> Option<f32> {
        self.alpha
    }

    /// Sets the opacity.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::InvalidInput` if `alpha` is outside `[0, 1]`.
    pub fn set_alpha(&mut self, alpha: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&alpha) {
            let message = format!("alpha {alpha} is outside [0, 1]");
            return Err(OperationError::InvalidInput(message).into());
        }
        self.alpha = Some(alpha);
        Ok(())
    }

    /// Whether vertex ids are labelled.
    #[must_use]
    pub fn vertex_ids(&self) -> bool {
        self.vertex_ids
    }

    /// Turns vertex id labels on or off.
    pub fn set_vertex_ids(&mut self, on: bool) {
        self.vertex_ids = on;
    }

    /// Resets every option.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A visualization backend that turns read-only positions and display options
/// into something it can show.
pub trait Backend {
    /// Backend-specific showable object.
    type Showable;

    /// Builds a point showable.
    fn points(&self, positions: &Positions, options: &ShowOptions) -> Self::Showable;
}
