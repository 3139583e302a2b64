// crates/cs_cdo/src/linalg/vector_ops.rs

//! 向量运算（BLAS Level 1 风格）
//!
//! - [`dot`]: 点积 x·y
//! - [`norm2`]: 二范数 ||x||₂
//! - [`axpy`]: y = α*x + y
//! - [`xpay`]: y = x + α*y
//! - [`scale`]: x = α*x
//! - [`copy`]: y = x
//! - [`fill`]: x[:] = α

/// 点积 x·y
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y.iter()).map(|(&xi, &yi)| xi * yi).sum()
}

/// 二范数 ||x||₂
#[inline]
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// 无穷范数（最大绝对值）
#[inline]
pub fn norm_inf(x: &[f64]) -> f64 {
    x.iter().map(|&v| v.abs()).fold(0.0, f64::max)
}

/// AXPY: y = α*x + y
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

/// XPAY: y = x + α*y
#[inline]
pub fn xpay(x: &[f64], alpha: f64, y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi = xi + alpha * *yi;
    }
}

/// 缩放: x = α*x
#[inline]
pub fn scale(alpha: f64, x: &mut [f64]) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// 复制: y = x
#[inline]
pub fn copy(x: &[f64], y: &mut [f64]) {
    y.copy_from_slice(x);
}

/// 填充: x[:] = α
#[inline]
pub fn fill(alpha: f64, x: &mut [f64]) {
    x.fill(alpha);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_and_norms() {
        let x = [1.0, 2.0, 3.0];
        let y = [4.0, 5.0, 6.0];
        assert_eq!(dot(&x, &y), 32.0);
        assert!((norm2(&[3.0, 4.0]) - 5.0).abs() < 1e-15);
        assert_eq!(norm_inf(&[1.0, -7.0, 2.0]), 7.0);
    }

    #[test]
    fn test_updates() {
        let x = [1.0, 2.0, 3.0];
        let mut y = [4.0, 5.0, 6.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, [6.0, 9.0, 12.0]);

        xpay(&x, 0.5, &mut y);
        assert_eq!(y, [4.0, 6.5, 9.0]);

        scale(2.0, &mut y);
        assert_eq!(y, [8.0, 13.0, 18.0]);

        copy(&x, &mut y);
        assert_eq!(y, x);

        fill(0.0, &mut y);
        assert_eq!(y, [0.0; 3]);
    }
}
