//! Correlation matrix with a non-failing Cholesky decomposition.
//!
//! ## Mathematical Background
//!
//! Given `n` independent standard normals `Z`, correlated normals are
//!
//! ```text
//! W = L * Z,   C = L * L^T
//! ```
//!
//! where `L` is the lower triangular Cholesky factor of the correlation
//! matrix `C`.
//!
//! ## Degraded factorisation
//!
//! When `C` is not positive semi-definite, a diagonal term under the square
//! root goes negative. It is clamped to zero instead of failing; the
//! resulting factor no longer reproduces `C` exactly, and
//! [`CholeskyFactor::was_clamped`] reports it so the engine can surface a
//! warning.

use super::error::CorrelationError;
use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One configured correlation between two named variables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorrelationPair {
    /// First variable name
    pub first: String,
    /// Second variable name
    pub second: String,
    /// Correlation coefficient in [-1, 1]
    pub coefficient: f64,
}

impl CorrelationPair {
    /// Creates a new correlation pair.
    pub fn new(first: impl Into<String>, second: impl Into<String>, coefficient: f64) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            coefficient,
        }
    }
}

/// Symmetric correlation matrix with unit diagonal.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix<T: Float> {
    /// Matrix elements in row-major order
    data: Vec<T>,
    /// Matrix dimension (n x n)
    dim: usize,
}

impl<T: Float> CorrelationMatrix<T> {
    /// Create an identity correlation matrix (no correlation).
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![T::zero(); dim * dim];
        for i in 0..dim {
            data[i * dim + i] = T::one();
        }
        Self { data, dim }
    }

    /// Builds the matrix for `variables` from named pairs.
    ///
    /// Unspecified pairs default to zero; each pair fills both `(i, j)` and
    /// `(j, i)`.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError`] if a pair names an unknown variable,
    /// repeats a variable, repeats an unordered pair, or carries a
    /// coefficient outside [-1, 1].
    ///
    /// # Examples
    ///
    /// ```
    /// use cashflow_core::correlation::{CorrelationMatrix, CorrelationPair};
    ///
    /// let names = ["revenue", "expenses"];
    /// let pairs = [CorrelationPair::new("revenue", "expenses", 0.6)];
    /// let m = CorrelationMatrix::<f64>::from_pairs(&names, &pairs).unwrap();
    /// assert_eq!(m.get(0, 1), 0.6);
    /// assert_eq!(m.get(1, 0), 0.6);
    /// assert_eq!(m.get(1, 1), 1.0);
    /// ```
    pub fn from_pairs<S: AsRef<str>>(
        variables: &[S],
        pairs: &[CorrelationPair],
    ) -> Result<Self, CorrelationError> {
        let dim = variables.len();
        let mut matrix = Self::identity(dim);
        let mut seen: HashSet<(usize, usize)> = HashSet::with_capacity(pairs.len());

        let index_of = |name: &str| -> Result<usize, CorrelationError> {
            variables
                .iter()
                .position(|v| v.as_ref() == name)
                .ok_or_else(|| CorrelationError::UnknownVariable {
                    name: name.to_string(),
                })
        };

        for pair in pairs {
            let i = index_of(&pair.first)?;
            let j = index_of(&pair.second)?;
            if i == j {
                return Err(CorrelationError::SelfCorrelation {
                    name: pair.first.clone(),
                });
            }

            let rho = pair.coefficient;
            let value = if rho.is_finite() && (-1.0..=1.0).contains(&rho) {
                T::from(rho)
            } else {
                None
            };
            let value = value.ok_or_else(|| CorrelationError::OutOfRange {
                first: pair.first.clone(),
                second: pair.second.clone(),
                value: rho,
            })?;

            if !seen.insert((i.min(j), i.max(j))) {
                return Err(CorrelationError::DuplicatePair {
                    first: pair.first.clone(),
                    second: pair.second.clone(),
                });
            }

            matrix.data[i * dim + j] = value;
            matrix.data[j * dim + i] = value;
        }

        Ok(matrix)
    }

    /// Get matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Get element at (i, j).
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.dim + j]
    }

    /// Returns true when every off-diagonal element is zero.
    pub fn is_identity(&self) -> bool {
        (0..self.dim).all(|i| (0..self.dim).all(|j| i == j || self.get(i, j) == T::zero()))
    }

    /// Compute the lower triangular factor `L` with `C = L * L^T`.
    ///
    /// Never fails: negative diagonal terms are clamped to zero and the
    /// column below a zero pivot is left at zero.
    pub fn cholesky(&self) -> CholeskyFactor<T> {
        let n = self.dim;
        let mut lower = vec![T::zero(); n * n];
        let mut clamped = false;

        for i in 0..n {
            for j in 0..=i {
                let mut sum = T::zero();

                if j == i {
                    for k in 0..j {
                        let l_jk = lower[j * n + k];
                        sum = sum + l_jk * l_jk;
                    }
                    let mut diag = self.get(j, j) - sum;
                    if diag < T::zero() {
                        clamped = true;
                        diag = T::zero();
                    }
                    lower[j * n + j] = diag.sqrt();
                } else {
                    for k in 0..j {
                        sum = sum + lower[i * n + k] * lower[j * n + k];
                    }
                    let l_jj = lower[j * n + j];
                    lower[i * n + j] = if l_jj > T::zero() {
                        (self.get(i, j) - sum) / l_jj
                    } else {
                        T::zero()
                    };
                }
            }
        }

        CholeskyFactor {
            data: lower,
            dim: n,
            clamped,
        }
    }
}

/// Lower triangular Cholesky factor of a correlation matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor<T: Float> {
    /// Lower triangular matrix elements (row-major)
    data: Vec<T>,
    /// Matrix dimension
    dim: usize,
    /// Whether a negative pivot was clamped during factorisation
    clamped: bool,
}

impl<T: Float> CholeskyFactor<T> {
    /// Get matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Returns true if the source matrix was not positive semi-definite.
    pub fn was_clamped(&self) -> bool {
        self.clamped
    }

    /// Get element at (i, j); zero above the diagonal.
    pub fn get(&self, i: usize, j: usize) -> T {
        if j > i {
            T::zero()
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Writes `L * z` into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `z` or `out` is shorter than the factor dimension.
    pub fn transform_into(&self, z: &[T], out: &mut [T]) {
        assert!(
            z.len() >= self.dim && out.len() >= self.dim,
            "Input length {} / output length {} below matrix dimension {}",
            z.len(),
            out.len(),
            self.dim
        );

        for (i, slot) in out.iter_mut().enumerate().take(self.dim) {
            let mut sum = T::zero();
            for (j, &zj) in z.iter().enumerate().take(i + 1) {
                sum = sum + self.get(i, j) * zj;
            }
            *slot = sum;
        }
    }

    /// Transform independent standard normals to correlated normals.
    pub fn transform(&self, z: &[T]) -> Vec<T> {
        let mut w = vec![T::zero(); self.dim];
        self.transform_into(z, &mut w);
        w
    }
}
