use cartpole::{Env, EnvConfig, EpisodeController, FeatureVector, LookaheadPlanner, ScoreWeights, Scorer};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_best_action(c: &mut Criterion) {
    let mut env = EpisodeController::new(EnvConfig::default().with_seed(5));
    let start: FeatureVector = env.reset(None).expect("reset").into();
    let planner = LookaheadPlanner::new(Scorer::new(ScoreWeights::proximity()));

    c.bench_function("best_action_25_rollouts", |b| {
        b.iter(|| planner.best_action(&mut env, black_box(&start)).expect("plan"));
    });
}

fn bench_step(c: &mut Criterion) {
    let mut env = EpisodeController::new(EnvConfig::default().with_seed(5));
    env.reset(None).expect("reset");

    c.bench_function("env_step", |b| {
        b.iter(|| env.step(cartpole::Action::Nothing.into()).expect("step"));
    });
}

criterion_group!(benches, bench_best_action, bench_step);
criterion_main!(benches);
