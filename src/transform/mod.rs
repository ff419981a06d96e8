//! Real grid fields to spectral coefficients and back.
//!
//! On periodic axes the transform is a complex DFT in standard FFT order.
//! The normalisation follows the convention of most FFT libraries: the
//! forward transform is unnormalised and the backward transform divides by
//! the number of periodic grid points. On the Chebyshev axis the coefficients
//! are those of the interpolating Chebyshev series.


pub mod chebyshev;

use self::chebyshev::ChebyshevTransform;
use crate::errors::*;
use crate::mesh::GridGeometry;
use log::debug;
use ndarray::{Array, Array4, ArrayView4, Axis, Zip};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// FFT along all three axes.
    FullyPeriodic,
    /// FFT along x and y, Chebyshev along z.
    Chebyshev,
}

/// Spectral coefficients of a grid field, shape `(Nx, Ny, Nz, dof)`.
#[derive(Debug, Clone)]
pub struct SpectralField {
    data: Array4<Complex64>,
    kind: TransformKind,
    geometry: GridGeometry,
}

impl SpectralField {
    pub fn new(
        data: Array4<Complex64>,
        kind: TransformKind,
        geometry: &GridGeometry,
    ) -> Result<SpectralField> {
        if data.dim() != geometry.field_shape() {
            return configuration(format!(
                "spectral data of shape {:?} does not fit grid of shape {:?}",
                data.dim(),
                geometry.field_shape()
            ));
        }
        if (kind == TransformKind::Chebyshev) != geometry.is_doubly_periodic() {
            return configuration(format!(
                "transform {:?} does not fit the grid axes {:?}",
                kind,
                geometry.axes()
            ));
        }
        Ok(SpectralField {
            data,
            kind,
            geometry: geometry.clone(),
        })
    }

    pub fn data(&self) -> &Array4<Complex64> {
        &self.data
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn real_part(&self) -> Array4<f64> {
        self.data.mapv(|v| v.re)
    }

    pub fn imag_part(&self) -> Array4<f64> {
        self.data.mapv(|v| v.im)
    }

    /// Returns true if any coefficient is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|v| !(v.re.is_finite() && v.im.is_finite()))
    }
}

/// Transforms every lane along `axis` with `fft`.
fn fft_lanes(data: &mut Array4<Complex64>, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    Zip::from(data.lanes_mut(axis)).par_for_each(|mut lane| {
        let mut buffer = lane.to_vec();
        fft.process(&mut buffer);
        for (l, b) in lane.iter_mut().zip(buffer) {
            *l = b;
        }
    });
}

fn chebyshev_lanes<F>(data: &mut Array4<Complex64>, f: F)
where
    F: Fn(&mut [Complex64]) + Sync,
{
    Zip::from(data.lanes_mut(Axis(2))).par_for_each(|mut lane| {
        let mut buffer = lane.to_vec();
        f(&mut buffer);
        for (l, b) in lane.iter_mut().zip(buffer) {
            *l = b;
        }
    });
}

#[derive(Clone)]
struct Plans {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl Plans {
    fn new(planner: &mut FftPlanner<f64>, n: usize) -> Plans {
        Plans {
            forward: planner.plan_fft_forward(n),
            inverse: planner.plan_fft_inverse(n),
        }
    }
}

enum ZTransform {
    Fourier(Plans),
    Chebyshev(ChebyshevTransform),
}

/// Planned transforms for one grid geometry.
pub struct TransformEngine {
    geometry: GridGeometry,
    // x and y
    plans: [Plans; 2],
    z: ZTransform,
}

impl TransformEngine {
    /// Plans all transforms for `geometry`.
    pub fn new(geometry: &GridGeometry) -> Result<TransformEngine> {
        let mut planner = FftPlanner::new();
        let n = geometry.size().as_array();

        let plans = [Plans::new(&mut planner, n[0]), Plans::new(&mut planner, n[1])];

        let z = if geometry.is_doubly_periodic() {
            ZTransform::Chebyshev(ChebyshevTransform::new(n[2], &mut planner)?)
        } else {
            ZTransform::Fourier(Plans::new(&mut planner, n[2]))
        };

        debug!(
            "Planned transforms for grid {:?} ({:?})",
            n,
            TransformEngine::kind_of(geometry)
        );

        Ok(TransformEngine {
            geometry: geometry.clone(),
            plans,
            z,
        })
    }

    fn kind_of(geometry: &GridGeometry) -> TransformKind {
        if geometry.is_doubly_periodic() {
            TransformKind::Chebyshev
        } else {
            TransformKind::FullyPeriodic
        }
    }

    pub fn kind(&self) -> TransformKind {
        TransformEngine::kind_of(&self.geometry)
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Forward transform of a real field on the planned grid.
    pub fn forward(&self, field: &ArrayView4<f64>) -> Result<SpectralField> {
        if field.dim() != self.geometry.field_shape() {
            return configuration(format!(
                "field of shape {:?} does not fit planned grid of shape {:?}",
                field.dim(),
                self.geometry.field_shape()
            ));
        }

        let mut data = field.mapv(|v| Complex64::new(v, 0.));

        fft_lanes(&mut data, Axis(0), &self.plans[0].forward);
        fft_lanes(&mut data, Axis(1), &self.plans[1].forward);
        match self.z {
            ZTransform::Fourier(ref p) => fft_lanes(&mut data, Axis(2), &p.forward),
            ZTransform::Chebyshev(ref c) => chebyshev_lanes(&mut data, |l| c.coefficients(l)),
        }

        SpectralField::new(data, self.kind(), &self.geometry)
    }

    /// Backward transform. Returns the real part of the normalised inverse.
    pub fn backward(&self, spectral: &SpectralField) -> Result<Array4<f64>> {
        if spectral.geometry() != &self.geometry || spectral.kind() != self.kind() {
            return stale("spectral field was produced for a different grid");
        }

        let mut data = spectral.data().clone();
        let n = self.geometry.size().as_array();

        fft_lanes(&mut data, Axis(0), &self.plans[0].inverse);
        fft_lanes(&mut data, Axis(1), &self.plans[1].inverse);
        let norm = match self.z {
            ZTransform::Fourier(ref p) => {
                fft_lanes(&mut data, Axis(2), &p.inverse);
                (n[0] * n[1] * n[2]) as f64
            }
            ZTransform::Chebyshev(ref c) => {
                chebyshev_lanes(&mut data, |l| c.synthesize(l));
                (n[0] * n[1]) as f64
            }
        };

        let mut field: Array4<f64> = Array::zeros(data.dim());
        Zip::from(&mut field)
            .and(&data)
            .par_for_each(|f, d| *f = d.re / norm);

        Ok(field)
    }
}
