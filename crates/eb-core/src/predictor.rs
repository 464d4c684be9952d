//! Parallelogram geometry prediction.
//!
//! Predicts a new vertex from up to three already-reconstructed reference
//! points: the two vertices incident on the active gate (`A`, `B`) and the
//! third vertex of the previously processed triangle (`D`). Completing the
//! parallelogram `A + B - D` is the classic Edgebreaker geometry predictor;
//! the degenerate cases below seed the first vertices of a mesh, where
//! fewer than three references are available yet.

/// An integer 3-D point, i.e. a quantized vertex coordinate.
pub type IPoint3 = [i64; 3];

fn sub(a: IPoint3, b: IPoint3) -> IPoint3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn add(a: IPoint3, b: IPoint3) -> IPoint3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Truncating (toward zero) integer halving, componentwise.
fn half_trunc(a: IPoint3) -> IPoint3 {
    [a[0] / 2, a[1] / 2, a[2] / 2]
}

/// Predicts the next vertex from up to three reference points.
///
/// `d` is only meaningful when `a` and `b` are both present: passing `Some`
/// for `d` while `a`/`b` is `None` is a caller error the predictor does not
/// attempt to detect, since the Edgebreaker traversal never does so (`d` is
/// always the third vertex of the previously processed triangle, `a`/`b`
/// are always the gate's two vertices, and they become available together).
pub fn predict(a: Option<IPoint3>, b: Option<IPoint3>, d: Option<IPoint3>) -> IPoint3 {
    match (a, b, d) {
        (None, None, _) => [0, 0, 0],
        (Some(a), None, _) => a,
        (Some(a), Some(b), None) => half_trunc(add(a, b)),
        (Some(a), Some(b), Some(d)) => sub(add(a, b), d),
        (None, Some(b), _) => b,
    }
}

/// `actual - predicted`, the residual the arithmetic coder compresses.
pub fn residual(actual: IPoint3, predicted: IPoint3) -> IPoint3 {
    sub(actual, predicted)
}

/// `predicted + residual`, the decoder-side inverse of [`residual`].
pub fn reconstruct(predicted: IPoint3, residual: IPoint3) -> IPoint3 {
    add(predicted, residual)
}
