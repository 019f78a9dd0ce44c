use cartpole::{
    Action, Env, EnvConfig, EpisodeController, FeatureVector, LookaheadPlanner, ScoreWeights, Scorer,
};

const SYMMETRIC: &str = r#"{
    "cart": {"x_position": 0, "y_position": 0, "z_position": 0,
             "x_velocity": 0, "y_velocity": 0, "z_velocity": 0},
    "pole": {"x_quaternion": 0, "y_quaternion": 0, "z_quaternion": 0, "w_quaternion": 1,
             "x_velocity": 0, "y_velocity": 0},
    "blocks": []
}"#;

#[test]
fn symmetric_state_prefers_doing_nothing() -> anyhow::Result<()> {
    let mut env = EpisodeController::new(EnvConfig::default());
    let start = FeatureVector::from_json(SYMMETRIC)?;

    let (action, intermediate) = LookaheadPlanner::default().best_action(&mut env, &start)?;
    assert_eq!(action, Action::Nothing);
    assert_eq!(intermediate.cart.position, glam::DVec3::ZERO);
    Ok(())
}

#[test]
fn only_the_idle_pair_costs_nothing() -> anyhow::Result<()> {
    let mut env = EpisodeController::new(EnvConfig::default());
    let start = FeatureVector::from_json(SYMMETRIC)?;

    let rollouts = LookaheadPlanner::default().evaluate(&mut env, &start)?;
    assert_eq!(rollouts.len(), 25);
    for rollout in &rollouts[..24] {
        assert!(rollout.cost > 0.0, "{} then {} cost nothing", rollout.first, rollout.second);
    }
    assert_eq!(rollouts[24].cost, 0.0);
    Ok(())
}

#[test]
fn planning_twice_gives_identical_answers() -> anyhow::Result<()> {
    let mut env = EpisodeController::new(EnvConfig::default().with_seed(9));
    let start: FeatureVector = env.reset(None)?.into();

    let planner = LookaheadPlanner::new(Scorer::new(ScoreWeights::proximity()));
    let first = planner.best_action(&mut env, &start)?;
    let second = planner.best_action(&mut env, &start)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn leaning_pole_is_caught_by_moving_under_it() -> anyhow::Result<()> {
    let mut env = EpisodeController::new(EnvConfig::default());
    let mut start = FeatureVector::from_json(SYMMETRIC)?;
    // pole leaning towards +x: pitch of a few degrees about y
    let q = physics::orientation::from_euler(0.0, 4.0, 0.0);
    start.pole.orientation = cartpole::feature::PoleOrientationFeatures::Quaternion {
        x_quaternion: q.x,
        y_quaternion: q.y,
        z_quaternion: q.z,
        w_quaternion: q.w,
    };

    let (action, _) = LookaheadPlanner::default().best_action(&mut env, &start)?;
    assert_eq!(action, Action::Left);
    Ok(())
}

#[test]
fn walls_feed_the_corner_term() -> anyhow::Result<()> {
    let mut env = EpisodeController::new(EnvConfig::default().with_seed(3));
    let first = env.reset(None)?;

    let mut planner = LookaheadPlanner::new(Scorer::new(ScoreWeights::proximity()));
    assert!(!planner.scorer().has_walls());
    if let Some(walls) = &first.walls {
        planner.scorer_mut().observe_walls(walls);
    }
    assert!(planner.scorer().has_walls());
    let (action, _) = planner.best_action(&mut env, &first.into())?;
    assert!(Action::ALL.contains(&action));
    Ok(())
}
