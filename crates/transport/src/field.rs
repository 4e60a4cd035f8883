/// The electric field at a point inside the drift medium.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSample {
    /// Field vector `[ex, ey, ez]` in V/cm.
    pub field: [f64; 3],
}

impl FieldSample {
    /// Returns the field strength in V/cm.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        let [ex, ey, ez] = self.field;
        (ex * ex + ey * ey + ez * ez).sqrt()
    }

    /// Returns the unit vector along which an electron drifts.
    ///
    /// Electrons move against the field. Returns `None` where the field
    /// vanishes.
    #[must_use]
    pub fn drift_direction(&self) -> Option<[f64; 3]> {
        let magnitude = self.magnitude();
        if magnitude > 0.0 && magnitude.is_finite() {
            let [ex, ey, ez] = self.field;
            Some([-ex / magnitude, -ey / magnitude, -ez / magnitude])
        } else {
            None
        }
    }
}

/// A static electric field over a region of drift medium.
pub trait ElectricField {
    /// Returns the field at `position` (cm).
    ///
    /// Returns `None` where there is no drift medium, for example outside the
    /// extent of a field map.
    fn sample(&self, position: [f64; 3]) -> Option<FieldSample>;
}

/// A field that is the same everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformField {
    /// Field vector `[ex, ey, ez]` in V/cm.
    pub field: [f64; 3],
}

impl ElectricField for UniformField {
    fn sample(&self, _position: [f64; 3]) -> Option<FieldSample> {
        Some(FieldSample { field: self.field })
    }
}

impl<F: ElectricField + ?Sized> ElectricField for &F {
    fn sample(&self, position: [f64; 3]) -> Option<FieldSample> {
        (**self).sample(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn electrons_drift_against_the_field() {
        let sample = FieldSample {
            field: [0.0, 3.0, 4.0],
        };

        assert_relative_eq!(sample.magnitude(), 5.0);
        let [dx, dy, dz] = sample.drift_direction().unwrap();
        assert_relative_eq!(dx, 0.0);
        assert_relative_eq!(dy, -0.6);
        assert_relative_eq!(dz, -0.8);
    }

    #[test]
    fn vanishing_field_has_no_drift_direction() {
        let sample = FieldSample {
            field: [0.0, 0.0, 0.0],
        };
        assert!(sample.drift_direction().is_none());
    }

    #[test]
    fn uniform_field_is_position_independent() {
        let field = UniformField {
            field: [0.0, 0.0, 40e3],
        };

        assert_eq!(
            field.sample([0.0, 0.0, 0.0]),
            field.sample([5.0, -2.0, 1.0])
        );
    }
}
