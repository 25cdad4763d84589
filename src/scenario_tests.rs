// Copyright Catenary Transit Initiatives
#[cfg(test)]
mod tests {
    use crate::assembler::{AssemblyOutput, assemble};
    use crate::config::CableSettings;
    use crate::context::ResolutionContext;
    use crate::elevation::{NoTerrain, TerrainSampler};
    use crate::geodesy::METERS_PER_DEGREE;
    use crate::models::{AnchorTemplate, AxisOffset, ModelTransform, Span, SpanConductor, Tower};
    use crate::overrides::DEFAULT_MODEL_KEY;
    use crate::topology::HiddenSpans;
    use ahash::AHashMap;

    fn run(towers: &[Tower], spans: &[Span], settings: &CableSettings) -> AssemblyOutput {
        run_with_terrain(towers, spans, settings, &NoTerrain)
    }

    fn run_with_terrain(
        towers: &[Tower],
        spans: &[Span],
        settings: &CableSettings,
        terrain: &dyn TerrainSampler,
    ) -> AssemblyOutput {
        let instance: AHashMap<String, Vec<AnchorTemplate>> = AHashMap::new();
        let model: AHashMap<String, Vec<AnchorTemplate>> = AHashMap::new();
        let hidden = HiddenSpans::new();
        let ctx = ResolutionContext {
            settings,
            instance_templates: &instance,
            model_templates: &model,
            terrain,
            hidden: &hidden,
            reference_markers: &[],
        };
        assemble(towers, spans, &ctx)
    }

    fn tower(id: &str, name: &str, east_m: f64, north_m: f64) -> Tower {
        let mut t = Tower::new(id, name, north_m / METERS_PER_DEGREE, east_m / METERS_PER_DEGREE);
        t.elevation = Some(100.0);
        t
    }

    #[test]
    fn test_level_span_sags_within_bounds() {
        let settings = CableSettings::default();
        let towers = vec![tower("a", "1/1", 0.0, 0.0), tower("b", "1/2", 300.0, 0.0)];
        let out = run(&towers, &[], &settings);

        assert_eq!(out.paths.len(), 14);
        for cable in &out.paths {
            let first = cable.path[0];
            let last = cable.path[cable.path.len() - 1];
            let mid = cable.path[cable.path.len() / 2];
            assert!((first[2] - last[2]).abs() < 1e-9, "{} is not level", cable.id);

            let sag = first[2] - mid[2];
            assert!(
                sag > 0.0 && sag < settings.tower_vertical_offset + 5.0,
                "{} sag {}",
                cable.id,
                sag
            );
            for p in &cable.path[1..cable.path.len() - 1] {
                assert!(p[2] <= first[2]);
            }
        }
    }

    #[test]
    fn test_span_listing_phase_b_only_has_no_phase_a() {
        let mut settings = CableSettings::default();
        for c in settings.conductors.iter_mut() {
            c.circuit_id = Some("C1".to_string());
        }
        let towers = vec![tower("a", "1/1", 0.0, 0.0), tower("b", "1/2", 300.0, 0.0)];
        let mut span = Span::new("s1", "a", "b");
        span.conductors = Some(vec![SpanConductor {
            phase: "B".to_string(),
            circuit_id: Some("C1".to_string()),
        }]);

        let out = run(&towers, &[span], &settings);
        assert_eq!(out.paths.len(), 4);
        assert!(out.paths.iter().all(|p| p.conductor_id.starts_with("FB-")));
        assert!(out.paths.iter().all(|p| p.id.starts_with("explicit-s1-")));
    }

    #[test]
    fn test_close_structures_get_one_cable_per_conductor() {
        let settings = CableSettings::default();
        let towers = vec![tower("a", "1/1", 0.0, 0.0), tower("b", "1/2", 50.0, 0.0)];
        let out = run(&towers, &[], &settings);

        let mut per_conductor: AHashMap<&str, usize> = AHashMap::new();
        for p in &out.paths {
            *per_conductor.entry(p.conductor_id.as_str()).or_default() += 1;
        }
        assert_eq!(per_conductor.len(), 14);
        assert!(per_conductor.values().all(|n| *n == 1));
    }

    #[test]
    fn test_unknown_terrain_keeps_stored_elevation() {
        let settings = CableSettings::default();
        let mut t = tower("a", "1/1", 0.0, 0.0);
        t.elevation = Some(120.0);
        let unknown = |_lng: f64, _lat: f64| -> Option<f64> { None };
        let out = run_with_terrain(&[t], &[], &settings, &unknown);
        assert_eq!(out.poses[0].position.alt, 120.0 + settings.tower_vertical_offset);
    }

    #[test]
    fn test_individual_override_beats_any_phase_override() {
        let towers = vec![tower("a", "1/1", 0.0, 0.0), tower("b", "1/2", 300.0, 0.0)];
        let mut starts = Vec::new();
        for phase_value in [-20.0, 0.0, 7.5] {
            let mut transform = ModelTransform::default();
            transform
                .phase_overrides
                .insert("FASE A".to_string(), AxisOffset::new(phase_value, phase_value, phase_value));
            transform
                .anchor_overrides
                .insert("FA-1".to_string(), AxisOffset::new(1.0, -1.0, 2.0));
            let mut settings = CableSettings::default();
            settings
                .model_configs
                .insert(DEFAULT_MODEL_KEY.to_string(), transform);

            let out = run(&towers, &[], &settings);
            let cable = out.paths.iter().find(|p| p.conductor_id == "FA-1").unwrap();
            starts.push(cable.path[0]);
        }
        assert!(starts.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_output_ignores_input_order() {
        let settings = CableSettings::default();
        let towers = vec![
            tower("a", "1/1", 0.0, 0.0),
            tower("b", "1/2", 300.0, 40.0),
            tower("c", "1/3", 600.0, 0.0),
            tower("d", "1/4", 900.0, 90.0),
        ];
        let spans = vec![
            Span::new("s1", "a", "b"),
            Span::new("s2", "b", "c"),
            Span::new("s3", "c", "d"),
        ];
        let mut towers_rev = towers.clone();
        towers_rev.reverse();
        let mut spans_rev = spans.clone();
        spans_rev.reverse();

        for (s1, s2) in [(&spans[..0], &spans_rev[..0]), (&spans[..], &spans_rev[..])] {
            let a = run(&towers, s1, &settings);
            let b = run(&towers_rev, s2, &settings);
            assert_eq!(a.paths, b.paths);
            assert_eq!(a.poses, b.poses);

            let ids: ahash::AHashSet<&str> = a.paths.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids.len(), a.paths.len(), "duplicate cable");
        }
    }

    #[test]
    fn test_bend_tower_is_oriented_by_bisector() {
        // North, then east: the middle tower faces north-east.
        let settings = CableSettings::default();
        let towers = vec![
            tower("a", "1/1", 0.0, 0.0),
            tower("b", "1/2", 0.0, 300.0),
            tower("c", "1/3", 300.0, 300.0),
        ];
        let out = run(&towers, &[], &settings);
        assert!((out.orientations["b"] - 45.0).abs() < 0.01);
        let pose = out.poses.iter().find(|p| p.tower_id == "b").unwrap();
        assert!((pose.orientation.yaw - 45.0).abs() < 0.01);
    }
}
