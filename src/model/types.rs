//! The canonical quadratic energy model.

use crate::error::{Error, Result};

/// Relative tolerance used when checking `J[i][j] == J[j][i]`.
pub const SYMMETRY_TOLERANCE: f64 = 1e-12;

/// Quadratic pseudo-Boolean energy `E(x) = -0.5·xᵀJx - hᵀx`.
///
/// `J` is stored row-major as an `n × n` buffer with a zero diagonal and
/// `J[i][j] == J[j][i]`; `h` has length `n`. A model is validated once at
/// construction and immutable afterwards. Constraints are expressed as
/// quadratic penalty terms, so every binary vector has a finite energy;
/// infeasible states are disfavored, never excluded.
///
/// # Examples
///
/// ```
/// use vpu_anneal::model::EnergyModel;
///
/// let model = EnergyModel::from_rows(&[vec![0.0, -1.0], vec![-1.0, 0.0]], vec![0.0, 0.0]).unwrap();
/// assert_eq!(model.n(), 2);
/// // Anti-ferromagnetic pair: aligned states cost energy.
/// assert!(model.energy(&[1.0, 1.0]) > model.energy(&[1.0, 0.0]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyModel {
    n: usize,
    coupling: Vec<f64>,
    bias: Vec<f64>,
}

impl EnergyModel {
    /// Builds a model from a row-major `n × n` coupling buffer and a bias vector.
    pub fn new(n: usize, coupling: Vec<f64>, bias: Vec<f64>) -> Result<Self> {
        validate_coefficients(n, &coupling, &bias)?;
        Ok(Self { n, coupling, bias })
    }

    /// Builds a model from coupling rows.
    pub fn from_rows(rows: &[Vec<f64>], bias: Vec<f64>) -> Result<Self> {
        let n = rows.len();
        let mut coupling = Vec::with_capacity(n * n);
        for row in rows {
            if row.len() != n {
                return Err(Error::DimensionMismatch {
                    what: "coupling row",
                    expected: n,
                    found: row.len(),
                });
            }
            coupling.extend_from_slice(row);
        }
        Self::new(n, coupling, bias)
    }

    /// Number of variables.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Coupling coefficient `J[i][j]`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is out of range.
    pub fn coupling(&self, i: usize, j: usize) -> f64 {
        self.coupling[i * self.n + j]
    }

    /// Row-major coupling buffer.
    pub fn coupling_matrix(&self) -> &[f64] {
        &self.coupling
    }

    /// Row `i` of the coupling matrix.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.coupling[i * self.n..(i + 1) * self.n]
    }

    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    /// Largest absolute coefficient across `J` and `h`.
    pub fn max_abs(&self) -> f64 {
        self.coupling
            .iter()
            .chain(self.bias.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    /// Whether every coefficient lies inside `[-range, +range]`.
    pub fn is_within(&self, range: f64) -> bool {
        self.max_abs() <= range
    }

    /// Evaluates `E(x) = -0.5·xᵀJx - hᵀx`.
    ///
    /// # Panics
    /// Panics if `x.len() != n`.
    pub fn energy(&self, x: &[f64]) -> f64 {
        assert_eq!(x.len(), self.n, "state length must match model size");
        let mut quadratic = 0.0;
        for (i, &xi) in x.iter().enumerate() {
            if xi == 0.0 {
                continue;
            }
            let row = self.row(i);
            quadratic += xi * row.iter().zip(x).map(|(j, xj)| j * xj).sum::<f64>();
        }
        let linear: f64 = self.bias.iter().zip(x).map(|(h, xi)| h * xi).sum();
        -0.5 * quadratic - linear
    }

    /// Energy of a discrete 0/1 assignment.
    pub fn energy_of_solution(&self, solution: &[u8]) -> f64 {
        let x: Vec<f64> = solution.iter().map(|&b| f64::from(b)).collect();
        self.energy(&x)
    }

    /// Returns a copy with every coefficient multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> EnergyModel {
        EnergyModel {
            n: self.n,
            coupling: self.coupling.iter().map(|v| v * factor).collect(),
            bias: self.bias.iter().map(|v| v * factor).collect(),
        }
    }
}

fn validate_coefficients(n: usize, coupling: &[f64], bias: &[f64]) -> Result<()> {
    if n == 0 {
        return Err(Error::Configuration(
            "energy model needs at least one variable".into(),
        ));
    }
    if coupling.len() != n * n {
        return Err(Error::DimensionMismatch {
            what: "coupling",
            expected: n * n,
            found: coupling.len(),
        });
    }
    if bias.len() != n {
        return Err(Error::DimensionMismatch {
            what: "bias",
            expected: n,
            found: bias.len(),
        });
    }
    if let Some(v) = coupling.iter().chain(bias).find(|v| !v.is_finite()) {
        return Err(Error::Configuration(format!(
            "non-finite coefficient {v} in energy model"
        )));
    }
    check_symmetric(n, coupling)
}

/// Checks zero diagonal and symmetry of a row-major `n × n` buffer.
pub(crate) fn check_symmetric(n: usize, coupling: &[f64]) -> Result<()> {
    for i in 0..n {
        if coupling[i * n + i] != 0.0 {
            return Err(Error::Configuration(format!(
                "coupling diagonal J[{i}][{i}] must be zero, got {}",
                coupling[i * n + i]
            )));
        }
        for j in (i + 1)..n {
            let a = coupling[i * n + j];
            let b = coupling[j * n + i];
            if (a - b).abs() > SYMMETRY_TOLERANCE * a.abs().max(b.abs()) {
                return Err(Error::Configuration(format!(
                    "coupling is not symmetric: J[{i}][{j}]={a} but J[{j}][{i}]={b}"
                )));
            }
        }
    }
    Ok(())
}

/// Accumulating builder for [`EnergyModel`].
///
/// Pairwise contributions are symmetric by construction: every pair term
/// lands on both `J[i][j]` and `J[j][i]`, so directed costs between the same
/// two variables (e.g. `d_ij` and `d_ji`) simply add up on the shared pair.
///
/// Two vocabularies are offered. `add_coupling`/`add_bias` write `J`/`h`
/// directly. `add_quadratic_term`/`add_linear_term` take coefficients of a
/// cost function `H(x)` to be minimized and convert them to the model's sign
/// convention (`H = c·x_i·x_j` becomes `J_ij += -c`, `H = c·x_i` becomes
/// `h_i += -c`).
#[derive(Debug, Clone)]
pub struct EnergyModelBuilder {
    n: usize,
    coupling: Vec<f64>,
    bias: Vec<f64>,
}

impl EnergyModelBuilder {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            coupling: vec![0.0; n * n],
            bias: vec![0.0; n],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Adds `w` to `J[i][j]` and `J[j][i]`.
    pub fn add_coupling(&mut self, i: usize, j: usize, w: f64) -> Result<()> {
        self.check_index(i)?;
        self.check_index(j)?;
        if i == j {
            return Err(Error::Configuration(format!(
                "self-coupling on variable {i}; fold x_i² into the bias instead"
            )));
        }
        self.coupling[i * self.n + j] += w;
        self.coupling[j * self.n + i] += w;
        Ok(())
    }

    /// Adds `w` to `h[i]`.
    pub fn add_bias(&mut self, i: usize, w: f64) -> Result<()> {
        self.check_index(i)?;
        self.bias[i] += w;
        Ok(())
    }

    /// Adds the cost term `c·x_i·x_j`.
    ///
    /// For binary variables `x_i² = x_i`, so `i == j` is folded into the
    /// linear part.
    pub fn add_quadratic_term(&mut self, i: usize, j: usize, c: f64) -> Result<()> {
        if i == j {
            return self.add_linear_term(i, c);
        }
        self.add_coupling(i, j, -c)
    }

    /// Adds the cost term `c·x_i`.
    pub fn add_linear_term(&mut self, i: usize, c: f64) -> Result<()> {
        self.add_bias(i, -c)
    }

    pub fn build(self) -> Result<EnergyModel> {
        EnergyModel::new(self.n, self.coupling, self.bias)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.n {
            return Err(Error::IndexOutOfRange {
                what: "variable",
                index,
                size: self.n,
            });
        }
        Ok(())
    }
}
