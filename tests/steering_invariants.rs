use dotflock::config::FlockingRules;
use dotflock::steering::{flocking_forces, seek};
use dotflock::{Agent, Containment, FlockEngine, SimConfig, Vec2};
use proptest::prelude::*;

const TOLERANCE: f32 = 1.0e-4;

fn containment() -> impl Strategy<Value = Containment> {
    prop_oneof![
        Just(Containment::Wrap),
        (0.0f32..10.0).prop_map(|margin| Containment::Bounce { margin }),
        (5.0f32..40.0, 0.01f32..0.5)
            .prop_map(|(margin, strength)| Containment::Soft { margin, strength }),
    ]
}

fn agent() -> impl Strategy<Value = Agent> {
    (0.0f32..120.0, 0.0f32..120.0, -3.0f32..3.0, -3.0f32..3.0).prop_map(|(x, y, vx, vy)| {
        Agent::new(Vec2::new(x, y), Vec2::new(vx, vy), 3.0, [255; 3], 3.0, 0.05)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn speed_never_exceeds_the_limit(
        seed in any::<u64>(),
        dot_count in 2usize..60,
        interval in 1u32..40,
        duration in 1u32..40,
        containment in containment(),
    ) {
        let mut config = SimConfig {
            dot_count,
            seed: Some(seed),
            containment,
            ..SimConfig::default()
        };
        config.formation.interval_ticks = interval;
        config.formation.duration_ticks = duration;
        let mut engine = FlockEngine::new(config).expect("valid config");

        for _ in 0..80 {
            engine.tick();
            for agent in engine.agents() {
                prop_assert!(agent.velocity.length() <= agent.max_speed + TOLERANCE);
                prop_assert!(engine.bounds().contains(agent.position));
                prop_assert!(agent.velocity.x.is_finite() && agent.velocity.y.is_finite());
            }
        }
    }

    #[test]
    fn every_behavior_respects_max_force(agents in prop::collection::vec(agent(), 1..40)) {
        let rules = FlockingRules::default();

        for (index, agent) in agents.iter().enumerate() {
            let forces = flocking_forces(&agents, index, &rules);
            prop_assert!(forces.separation.length() <= agent.max_force + TOLERANCE);
            prop_assert!(forces.alignment.length() <= agent.max_force + TOLERANCE);
            prop_assert!(forces.cohesion.length() <= agent.max_force + TOLERANCE);
        }
    }

    #[test]
    fn seek_respects_max_force(agent in agent(), tx in -50.0f32..200.0, ty in -50.0f32..200.0) {
        let steer = seek(&agent, Vec2::new(tx, ty));
        prop_assert!(steer.length() <= agent.max_force + TOLERANCE);
        prop_assert!(steer.x.is_finite() && steer.y.is_finite());
    }
}
