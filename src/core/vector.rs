//! Small fixed-size vector helpers over `[f64; DIM]`.

use super::particle::DIM;

/// A point or direction in simulation space.
pub type Vector = [f64; DIM];

/// The zero vector.
pub const ZERO: Vector = [0.0; DIM];

#[inline]
pub fn dot(a: &Vector, b: &Vector) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn norm_sq(a: &Vector) -> f64 {
    dot(a, a)
}

/// `a - b`.
#[inline]
pub fn sub(a: &Vector, b: &Vector) -> Vector {
    let mut out = ZERO;
    for ((o, &x), &y) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
        *o = x - y;
    }
    out
}

/// `a += s * b`.
#[inline]
pub fn add_scaled(a: &mut Vector, s: f64, b: &Vector) {
    for (x, &y) in a.iter_mut().zip(b.iter()) {
        *x += s * y;
    }
}

#[inline]
pub fn scale(a: &Vector, s: f64) -> Vector {
    let mut out = *a;
    out.iter_mut().for_each(|x| *x *= s);
    out
}

#[inline]
pub fn is_finite(a: &Vector) -> bool {
    a.iter().all(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, -1.0, 0.5];
        assert_eq!(dot(&a, &b), 4.0 - 2.0 + 1.5);
        assert_eq!(sub(&b, &a), [3.0, -3.0, -2.5]);
        let mut c = a;
        add_scaled(&mut c, 2.0, &b);
        assert_eq!(c, [9.0, 0.0, 4.0]);
        assert_eq!(scale(&a, -1.0), [-1.0, -2.0, -3.0]);
        assert_eq!(norm_sq(&[3.0, 4.0, 0.0]), 25.0);
        assert!(!is_finite(&[0.0, f64::NAN, 0.0]));
    }
}
