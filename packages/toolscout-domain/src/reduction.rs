//! Dimensionality reduction for query embeddings.
//!
//! A single embedding is treated as a 1×N matrix `A = U Σ Vᵀ`. Its right singular vectors are
//! the columns of `V`, and the reduced representation is `A · V[:, ..width]`. For a rank-one
//! matrix the first right singular vector is `a / ‖a‖`; the remaining columns are completed with
//! a Householder reflection so that `V` stays orthonormal without materializing an N×N matrix.

/// Reduce `vector` to `target_width` components.
///
/// Vectors that already fit are returned untouched (never padded). If the factorization is
/// numerically impossible the leading `target_width` components are kept instead.
pub fn reduce_dimensions(vector: Vec<f32>, target_width: usize) -> Vec<f32> {
	if vector.len() <= target_width {
		return vector;
	}

	match RankOneSvd::factorize(&vector) {
		Some(svd) => svd.project(&vector, target_width),
		None => truncate(vector, target_width),
	}
}

fn truncate(mut vector: Vec<f32>, target_width: usize) -> Vec<f32> {
	vector.truncate(target_width);

	vector
}

struct RankOneSvd {
	/// Householder vector `w = v₁ - e₁`, where `v₁` is the first right singular vector.
	/// `None` when `v₁` already equals `e₁` and `V` is the identity.
	reflector: Option<Vec<f64>>,
	reflector_norm_sq: f64,
}
impl RankOneSvd {
	fn factorize(vector: &[f32]) -> Option<Self> {
		if vector.iter().any(|value| !value.is_finite()) {
			return None;
		}

		let sigma = vector.iter().map(|value| f64::from(*value).powi(2)).sum::<f64>().sqrt();

		if !sigma.is_normal() {
			return None;
		}

		let mut reflector: Vec<f64> =
			vector.iter().map(|value| f64::from(*value) / sigma).collect();

		reflector[0] -= 1.0;

		let reflector_norm_sq = reflector.iter().map(|value| value * value).sum::<f64>();

		if !reflector_norm_sq.is_finite() {
			return None;
		}
		if reflector_norm_sq <= f64::EPSILON {
			return Some(Self { reflector: None, reflector_norm_sq: 0.0 });
		}

		Some(Self { reflector: Some(reflector), reflector_norm_sq })
	}

	/// Computes `a · V[:, ..width]` one column at a time. Column `j` of the reflection
	/// `H = I - 2wwᵀ/‖w‖²` is `e_j - 2w·w_j/‖w‖²`.
	fn project(&self, vector: &[f32], width: usize) -> Vec<f32> {
		let Some(reflector) = self.reflector.as_ref() else {
			return vector[..width].to_vec();
		};
		let dot = vector
			.iter()
			.zip(reflector)
			.map(|(value, w)| f64::from(*value) * w)
			.sum::<f64>();
		let scale = 2.0 * dot / self.reflector_norm_sq;

		vector[..width]
			.iter()
			.zip(&reflector[..width])
			.map(|(value, w)| (f64::from(*value) - scale * w) as f32)
			.collect()
	}
}
