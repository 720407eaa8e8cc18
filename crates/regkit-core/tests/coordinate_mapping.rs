use nalgebra::SMatrix;
use proptest::prelude::*;
use regkit_core::image::Image;
use regkit_core::spatial::{Direction, Point, Spacing};

const D: usize = 3;

fn make_rotation(angle_x: f64, angle_y: f64, angle_z: f64) -> Direction<D> {
    let cx = angle_x.cos();
    let sx = angle_x.sin();
    let cy = angle_y.cos();
    let sy = angle_y.sin();
    let cz = angle_z.cos();
    let sz = angle_z.sin();

    let rz = SMatrix::<f64, 3, 3>::new(cz, -sz, 0.0, sz, cz, 0.0, 0.0, 0.0, 1.0);
    let ry = SMatrix::<f64, 3, 3>::new(cy, 0.0, sy, 0.0, 1.0, 0.0, -sy, 0.0, cy);
    let rx = SMatrix::<f64, 3, 3>::new(1.0, 0.0, 0.0, 0.0, cx, -sx, 0.0, sx, cx);

    let mut rot = Direction::<D>::identity();
    *rot.inner_mut() = rx * ry * rz;
    rot
}

proptest! {
    #[test]
    fn test_coordinate_roundtrip(
        ox in -100.0f64..100.0, oy in -100.0f64..100.0, oz in -100.0f64..100.0,
        sx in 0.1f64..5.0, sy in 0.1f64..5.0, sz in 0.1f64..5.0,
        ax in -3.14f64..3.14, ay in -3.14f64..3.14, az in -3.14f64..3.14,
        px in -50.0f64..50.0, py in -50.0f64..50.0, pz in -50.0f64..50.0
    ) {
        let origin = Point::<D>::new([ox, oy, oz]);
        let spacing = Spacing::<D>::new([sx, sy, sz]);
        let direction = make_rotation(ax, ay, az);

        let image = Image::new(vec![0.0; 8], [2, 2, 2], origin, spacing, direction);
        let point = Point::<D>::new([px, py, pz]);

        let index = image.transform_physical_point_to_continuous_index(&point);
        let recovered = image.transform_continuous_index_to_physical_point(&index);

        prop_assert!((point[0] - recovered[0]).abs() < 1e-4, "X mismatch: {} vs {}", point[0], recovered[0]);
        prop_assert!((point[1] - recovered[1]).abs() < 1e-4, "Y mismatch: {} vs {}", point[1], recovered[1]);
        prop_assert!((point[2] - recovered[2]).abs() < 1e-4, "Z mismatch: {} vs {}", point[2], recovered[2]);
    }

    #[test]
    fn test_gradient_pushforward_inverts_index_step(
        sx in 0.1f64..5.0, sy in 0.1f64..5.0, sz in 0.1f64..5.0,
        ax in -3.14f64..3.14
    ) {
        // A unit step in index space along axis d corresponds to a physical
        // step of Direction * spacing; the gradient push-forward must be its
        // dual: g_phys . step_phys == g_index . step_index.
        let spacing = Spacing::<D>::new([sx, sy, sz]);
        let direction = make_rotation(ax, 0.0, 0.0);
        let image = Image::new(vec![0.0; 8], [2, 2, 2], Point::origin(), spacing, direction);

        let g_index = regkit_core::spatial::Vector::<D>::new([1.0, -2.0, 0.5]);
        let g_phys = image.index_gradient_to_physical(&g_index);

        for d in 0..D {
            let mut step_index = Point::<D>::origin();
            step_index[d] = 1.0;
            let step_phys = image.transform_continuous_index_to_physical_point(&step_index)
                - *image.origin();
            let dual = g_phys.dot(&step_phys);
            prop_assert!((dual - g_index[d]).abs() < 1e-8,
                "axis {}: {} vs {}", d, dual, g_index[d]);
        }
    }
}
