// DOVESIM: Vanilla BGP Path Inference and Dovetail Path Sampling on the AS Graph
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Complex roots of real polynomials via the companion-matrix eigenvalues.

use nalgebra::{Complex, DMatrix};

/// All complex roots of `coeff[0] + coeff[1] x + ... + coeff[n-1] x^(n-1)`.
///
/// The leading coefficient must be nonzero. Real roots come out of the real
/// Schur decomposition with an imaginary part of exactly zero.
pub fn poly_roots(coeff: &[f64]) -> Vec<Complex<f64>> {
    let degree = coeff.len().saturating_sub(1);
    if degree == 0 {
        return Vec::new();
    }

    let lead = coeff[degree];
    assert!(lead != 0.0, "leading coefficient must be nonzero");

    let mut companion = DMatrix::<f64>::zeros(degree, degree);
    for i in 1..degree {
        companion[(i, i - 1)] = 1.0;
    }
    for i in 0..degree {
        companion[(i, degree - 1)] = -coeff[i] / lead;
    }

    companion.complex_eigenvalues().iter().copied().collect()
}
