use serde::{Deserialize, Serialize};

/// Which lane boundary a quantity refers to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaneSide {
    Left,
    Right,
}

/// Lane boundary in rectified pixel space: `x = a*y^2 + b*y + c`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LanePolynomial {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LanePolynomial {
    pub const fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// A vertical line at column `x`.
    pub const fn vertical(x: f64) -> Self {
        Self::new(0.0, 0.0, x)
    }

    pub fn from_array(coeffs: [f64; 3]) -> Self {
        Self::new(coeffs[0], coeffs[1], coeffs[2])
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    #[inline]
    pub fn eval(&self, y: f64) -> f64 {
        (self.a * y + self.b) * y + self.c
    }

    /// `dx/dy` at row `y`.
    #[inline]
    pub fn slope(&self, y: f64) -> f64 {
        2.0 * self.a * y + self.b
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }
}

/// Left and right boundaries of the ego lane. Always produced together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LanePair {
    pub left: LanePolynomial,
    pub right: LanePolynomial,
}

impl LanePair {
    pub const fn new(left: LanePolynomial, right: LanePolynomial) -> Self {
        Self { left, right }
    }

    pub fn side(&self, side: LaneSide) -> &LanePolynomial {
        match side {
            LaneSide::Left => &self.left,
            LaneSide::Right => &self.right,
        }
    }

    /// Midpoint between the two boundaries at row `y`.
    pub fn center_at(&self, y: f64) -> f64 {
        0.5 * (self.left.eval(y) + self.right.eval(y))
    }

    pub fn width_at(&self, y: f64) -> f64 {
        self.right.eval(y) - self.left.eval(y)
    }

    /// Coefficients laid out as `[left a, b, c, right a, b, c]`.
    pub fn to_array(&self) -> [f64; 6] {
        let [la, lb, lc] = self.left.to_array();
        let [ra, rb, rc] = self.right.to_array();
        [la, lb, lc, ra, rb, rc]
    }

    pub fn from_array(coeffs: [f64; 6]) -> Self {
        Self::new(
            LanePolynomial::new(coeffs[0], coeffs[1], coeffs[2]),
            LanePolynomial::new(coeffs[3], coeffs[4], coeffs[5]),
        )
    }
}
