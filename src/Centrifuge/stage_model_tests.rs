#[cfg(test)]
mod tests {
    use super::super::stage_model::*;
    use crate::Centrifuge::centrifuge_model::{CentrifugeModel, CentrifugeSpec};
    use crate::cascade_errors::CascadeError;
    use approx::assert_relative_eq;

    fn reference_model() -> CentrifugeModel {
        CentrifugeModel::new(CentrifugeSpec::default()).unwrap()
    }

    #[test]
    fn test_ideal_stage_natural_uranium() {
        let stage = StageModel::ideal(reference_model(), 0.0071, 1e-12, 100).unwrap();
        assert_relative_eq!(stage.cut, 0.46136313940859747, max_relative = 1e-8);
        assert_relative_eq!(stage.alpha, 1.1701078394418074, max_relative = 1e-10);
        assert_relative_eq!(stage.delta_u, 8.498168367038175e-08, max_relative = 1e-8);
        assert_relative_eq!(stage.product_assay, 0.008297743929862565, max_relative = 1e-10);
        assert_relative_eq!(stage.tail_assay, 0.006074086364824242, max_relative = 1e-10);
        assert!((stage.alpha - stage.beta).abs() < 1e-12);
        assert!(stage.cut_iterations <= 10);
    }

    #[test]
    fn test_ideal_stage_ten_percent_feed() {
        let stage = StageModel::ideal(reference_model(), 0.1, 1e-12, 100).unwrap();
        assert_relative_eq!(stage.cut, 0.46903489485091626, max_relative = 1e-8);
        assert_relative_eq!(stage.alpha, 1.1678166784829827, max_relative = 1e-10);
        assert_relative_eq!(stage.product_assay, 0.11485422243639608, max_relative = 1e-10);
        assert_relative_eq!(stage.tail_assay, 0.08687833043832338, max_relative = 1e-10);
    }

    #[test]
    fn test_ideal_stage_mass_balance() {
        let stage = StageModel::ideal(reference_model(), 0.0071, 1e-12, 100).unwrap();
        let mixed = stage.cut * stage.product_assay + (1.0 - stage.cut) * stage.tail_assay;
        assert_relative_eq!(mixed, stage.feed_assay, max_relative = 1e-10);
        assert!(stage.product_assay > stage.feed_assay);
        assert!(stage.feed_assay > stage.tail_assay);
    }

    #[test]
    fn test_ideal_cut_iteration_cap() {
        let result = StageModel::ideal(reference_model(), 0.0071, 1e-12, 1);
        match result {
            Err(CascadeError::NonConvergence { iterations, .. }) => assert_eq!(iterations, 1),
            other => panic!("expected NonConvergence, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_stage_tails_match_stage_below_feed() {
        let first = StageModel::ideal(reference_model(), 0.0071, 1e-12, 100).unwrap();
        let second = StageModel::with_reference(
            reference_model(),
            first.product_assay,
            1e-12,
            first.alpha,
            first.delta_u,
        )
        .unwrap();
        assert_eq!(second.alpha, second.beta);
        assert_relative_eq!(second.cut, 0.46145702673915623, max_relative = 1e-10);
        assert_relative_eq!(second.product_assay, 0.009695569815734119, max_relative = 1e-10);
        // in an ideal cascade the tails returned down have the feed assay of the stage below
        assert_relative_eq!(second.tail_assay, 0.0071, max_relative = 1e-10);
    }

    #[test]
    fn test_ideal_cut_search_stays_inside_seed_bracket() {
        // at 900 m/s the first secant step from (0.1, 0.9) lands near 0.06
        let spec = CentrifugeSpec {
            peripheral_velocity: 900.0,
            ..CentrifugeSpec::default()
        };
        let model = CentrifugeModel::new(spec).unwrap();
        match StageModel::ideal(model, 0.0071, 1e-12, 100) {
            Err(CascadeError::NonConvergence { iterations, .. }) => assert_eq!(iterations, 0),
            other => panic!("expected NonConvergence, got {:?}", other.map(|s| s.cut)),
        }
    }

    #[test]
    fn test_machine_feed_of_ideal_stage() {
        let stage = StageModel::ideal(reference_model(), 0.0071, 1e-12, 100).unwrap();
        let spec = CentrifugeSpec::default();
        // α is defined on f_m = F·(M_238/M)², the throughput carries the tails-side ratio θ/(1-θ)
        let f_m = spec.feed_rate * (spec.u238_molar_mass / spec.gas_molar_mass).powi(2);
        let ratio = stage.cut / (1.0 - stage.cut);
        assert_relative_eq!(stage.machine_feed(), f_m * ratio * ratio, max_relative = 1e-8);
        assert_relative_eq!(stage.machine_feed(), 5.030990451327201e-06, max_relative = 1e-8);
    }

    #[test]
    fn test_machines_rounded_up() {
        let mut stage = StageModel::ideal(reference_model(), 0.0071, 1e-12, 100).unwrap();
        let capacity = stage.machine_feed();

        stage.set_feed_flow(2.5 * capacity);
        assert_eq!(stage.machines_needed(1e-11).unwrap(), 3);

        stage.set_feed_flow(2.001 * capacity);
        assert_eq!(stage.machines_needed(1e-11).unwrap(), 3);

        stage.set_feed_flow(4.0 * capacity);
        assert_eq!(stage.machines_needed(1e-11).unwrap(), 4);
        assert_relative_eq!(
            stage.stage_separative_power(),
            4.0 * stage.delta_u,
            max_relative = 1e-12
        );

        stage.set_feed_flow(0.0);
        assert_eq!(stage.machines_needed(1e-11).unwrap(), 0);
    }

    #[test]
    fn test_fixed_cut_relations() {
        let mut stage = StageModel::new(reference_model(), 0.2, 1e-12).unwrap();
        stage.alpha = 1.2;
        stage.cut = 0.45;
        stage.compute_beta_from_alpha_and_cut();
        let r_p = stage.product_assay / (1.0 - stage.product_assay);
        assert_relative_eq!(r_p, 1.2 * 0.25, max_relative = 1e-12);
        let mixed = 0.45 * stage.product_assay + 0.55 * stage.tail_assay;
        assert_relative_eq!(mixed, 0.2, max_relative = 1e-12);
        // tail recomputed from β reproduces the mass-balance tail
        let tail = stage.tail_assay;
        stage.compute_tail_assay();
        assert_relative_eq!(stage.tail_assay, tail, max_relative = 1e-12);
        assert_relative_eq!(
            stage.compute_cut_from_alpha_beta().unwrap(),
            0.45,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_invalid_feed_assay() {
        for assay in [0.0, 1.0, -0.1, 1.2, f64::NAN] {
            assert!(matches!(
                StageModel::new(reference_model(), assay, 1e-12),
                Err(CascadeError::InvalidParameter(_))
            ));
        }
        let mut stage = StageModel::new(reference_model(), 0.0071, 1e-12).unwrap();
        assert!(stage.set_feed_assay(1.5).is_err());
        assert_eq!(stage.feed_assay, 0.0071);
    }

    #[test]
    fn test_reference_alpha_must_separate() {
        assert!(matches!(
            StageModel::with_reference(reference_model(), 0.0071, 1e-12, 1.0, 8e-8),
            Err(CascadeError::InvalidParameter(_))
        ));
    }
}
