//! Bounding geometry and deterministic camera placement.

use glam::{Mat3, Quat, Vec3};
use rand::Rng;
use rand::rngs::StdRng;
use rand::{SeedableRng, thread_rng};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere {
	pub center: Vec3,
	pub radius: f32,
}

impl BoundingSphere {
	/// Center is the midpoint of the per-axis min/max, radius the max
	/// distance from there to any vertex. Not a minimal enclosing sphere,
	/// but a tight enough frame for camera placement.
	pub fn of_points(points: impl Iterator<Item = Vec3> + Clone) -> Self {
		let aabb = Aabb::of_points(points.clone());
		let center = (aabb.min + aabb.max) * 0.5;
		let radius = points.map(|p| p.distance(center)).fold(0., f32::max);
		Self { center, radius }
	}
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
	pub min: Vec3,
	pub max: Vec3,
}

impl Aabb {
	pub fn of_points(points: impl Iterator<Item = Vec3>) -> Self {
		let mut min = Vec3::INFINITY;
		let mut max = Vec3::NEG_INFINITY;
		for p in points {
			min = min.min(p);
			max = max.max(p);
		}
		Self { min, max }
	}

	/// Placement for a ground plane under the subject: slightly below the
	/// lowest vertex, scaled out to 3x the XY extents.
	pub fn ground_plane(&self) -> (Vec3, Vec3) {
		let center = (self.min + self.max) * 0.5;
		let offset = (self.max.z - self.min.z) * 0.001;
		let location = Vec3::new(center.x, center.y, self.min.z - offset);
		let scale = Vec3::new((self.max.x - self.min.x) * 3., (self.max.y - self.min.y) * 3., 1.);
		(location, scale)
	}
}

/// Distance at which a sphere of `radius` fits the frustum of a camera
/// with field of view `fov` (radians), padded by `offset_ratio`.
pub fn camera_distance(radius: f32, fov: f32, offset_ratio: f32) -> f32 {
	radius / (fov / 2.).sin() * (1. + offset_ratio)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraFrame {
	pub position: Vec3,
	pub rotation: Quat,
}

impl CameraFrame {
	/// Places a camera at `position` looking at `target`, -Z forward and
	/// +Y up.
	pub fn looking_at(position: Vec3, target: Vec3) -> Self {
		let forward = (target - position).normalize_or_zero();
		let up = if forward.abs_diff_eq(Vec3::Z, 1e-4) || forward.abs_diff_eq(-Vec3::Z, 1e-4) {
			Vec3::Y
		} else {
			Vec3::Z
		};
		let right = forward.cross(up).normalize_or_zero();
		let true_up = right.cross(forward);
		let rotation = Quat::from_mat3(&Mat3::from_cols(right, true_up, -forward));
		Self { position, rotation }
	}
}

/// One camera placement plus the subject rotation to apply for the shot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Shot {
	pub camera: CameraFrame,
	/// Z-axis subject rotation in radians, jitter included.
	pub subject_rotation: f32,
}

impl Shot {
	/// The camera frame with the subject rotation folded in: rotating the
	/// subject by `subject_rotation` about the vertical axis through
	/// `center` equals orbiting the camera the opposite way.
	pub fn world_camera(&self, center: Vec3) -> CameraFrame {
		let orbit = Quat::from_rotation_z(-self.subject_rotation);
		CameraFrame::looking_at(orbit * (self.camera.position - center) + center, center)
	}
}

#[derive(Clone, Debug)]
pub struct ShotSettings {
	pub fov: f32,
	pub offset_ratio: f32,
	/// Elevation angles of the camera rings.
	pub elevations: Vec<f32>,
	pub azimuth_start: f32,
	pub azimuth_step: f32,
	pub shots_per_ring: usize,
	/// Bound of the random subject-rotation jitter, radians.
	pub jitter: f32,
	/// Jitter is unseeded (and thus not reproducible) unless a seed is
	/// supplied here.
	pub seed: Option<u64>,
}

impl Default for ShotSettings {
	fn default() -> Self {
		Self {
			fov: 0.8,
			offset_ratio: 1.,
			elevations: vec![(0.2f32).atan(), (1.0f32).atan()],
			azimuth_start: 180f32.to_radians(),
			azimuth_step: 60f32.to_radians(),
			shots_per_ring: 6,
			jitter: 2f32.to_radians(),
			seed: None,
		}
	}
}

/// Generates the deterministic elevation x azimuth shot grid. The camera
/// stays fixed per ring; the subject rotates in `azimuth_step` increments
/// with bounded random jitter on top.
pub fn generate_shots(sphere: BoundingSphere, settings: &ShotSettings) -> Vec<Shot> {
	let mut rng: Box<dyn rand::RngCore> = match settings.seed {
		Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
		None => Box::new(thread_rng()),
	};
	let distance = camera_distance(sphere.radius, settings.fov, settings.offset_ratio);

	let mut shots = Vec::with_capacity(settings.elevations.len() * settings.shots_per_ring);
	for &elevation in &settings.elevations {
		let horizontal = elevation.cos();
		let direction = Vec3::new(
			settings.azimuth_start.cos() * horizontal,
			settings.azimuth_start.sin() * horizontal,
			elevation.sin(),
		);
		let camera = CameraFrame::looking_at(sphere.center + direction * distance, sphere.center);
		for i in 0..settings.shots_per_ring {
			let jitter = if settings.jitter > 0. {
				rng.gen_range(-settings.jitter..=settings.jitter)
			} else {
				0.
			};
			shots.push(Shot {
				camera,
				subject_rotation: settings.azimuth_step * i as f32 + jitter,
			});
		}
	}
	shots
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	fn unit_cube() -> impl Iterator<Item = Vec3> + Clone {
		(0..8).map(|i| Vec3::new((i & 1) as f32, ((i >> 1) & 1) as f32, ((i >> 2) & 1) as f32))
	}

	#[test]
	fn bounding_sphere_of_unit_cube() {
		let sphere = BoundingSphere::of_points(unit_cube());
		assert_relative_eq!(sphere.center.x, 0.5);
		assert_relative_eq!(sphere.center.y, 0.5);
		assert_relative_eq!(sphere.center.z, 0.5);
		assert_relative_eq!(sphere.radius, 0.75f32.sqrt(), epsilon = 1e-6);
	}

	#[test]
	fn ground_plane_sits_under_the_subject() {
		let aabb = Aabb::of_points(unit_cube());
		let (location, scale) = aabb.ground_plane();
		assert!(location.z < aabb.min.z);
		assert_relative_eq!(location.x, 0.5);
		assert_relative_eq!(location.y, 0.5);
		assert_relative_eq!(scale.x, 3.);
		assert_relative_eq!(scale.y, 3.);
	}

	#[test]
	fn camera_distance_reference_values() {
		// r=2, fov=0.8 rad, offset ratio 1.0: 2 / sin(0.4) * 2
		assert_relative_eq!(camera_distance(2., 0.8, 1.), 10.271746, epsilon = 1e-4);
		// no padding puts the sphere exactly at the frustum edge
		assert_relative_eq!(camera_distance(1., core::f32::consts::PI, 0.), 1., epsilon = 1e-6);
	}

	#[test]
	fn shot_grid_is_deterministic_without_jitter() {
		let sphere = BoundingSphere {
			center: Vec3::ZERO,
			radius: 1.,
		};
		let settings = ShotSettings {
			jitter: 0.,
			..ShotSettings::default()
		};
		let a = generate_shots(sphere, &settings);
		let b = generate_shots(sphere, &settings);
		assert_eq!(a.len(), 12);
		assert_eq!(a, b);
		assert_relative_eq!(a[1].subject_rotation, 60f32.to_radians());
	}

	#[test]
	fn seeded_jitter_is_reproducible_and_bounded() {
		let sphere = BoundingSphere {
			center: Vec3::ZERO,
			radius: 1.,
		};
		let settings = ShotSettings {
			seed: Some(7),
			..ShotSettings::default()
		};
		let a = generate_shots(sphere, &settings);
		let b = generate_shots(sphere, &settings);
		assert_eq!(a, b);
		for (i, shot) in a.iter().enumerate() {
			let base = 60f32.to_radians() * (i % 6) as f32;
			assert!((shot.subject_rotation - base).abs() <= 2f32.to_radians() + 1e-6);
		}
	}

	#[test]
	fn subject_rotation_orbits_the_camera_the_opposite_way() {
		let shot = Shot {
			camera: CameraFrame::looking_at(Vec3::new(10., 0., 0.), Vec3::ZERO),
			subject_rotation: 90f32.to_radians(),
		};
		let world = shot.world_camera(Vec3::ZERO);
		assert_relative_eq!(world.position.x, 0., epsilon = 1e-5);
		assert_relative_eq!(world.position.y, -10., epsilon = 1e-5);
		assert_relative_eq!(world.position.z, 0., epsilon = 1e-5);
	}

	#[test]
	fn camera_looks_at_the_sphere_center() {
		let camera = CameraFrame::looking_at(Vec3::new(0., -10., 10.), Vec3::ZERO);
		let forward = camera.rotation * -Vec3::Z;
		let expected = (Vec3::ZERO - camera.position).normalize();
		assert_relative_eq!(forward.dot(expected), 1., epsilon = 1e-5);
	}
}
