use construal_core::{DeterministicRng, Plan, PlanSet, SplitMix64};

/// Merge `new` into `accumulated`, rank by score and break top-score ties with `seed`.
///
/// Plans whose assignment already appears in `accumulated` are dropped. Sorting is stable, so
/// everything below the top score keeps its merge order. The top group is put in canonical
/// order before the seeded shuffle, which makes the result independent of insertion order.
///
/// When `new` is empty, `accumulated` is returned untouched.
pub fn review(new: PlanSet, accumulated: PlanSet, seed: u64, top_n: Option<usize>) -> PlanSet {
    if new.is_empty() {
        return accumulated;
    }

    let mut plans: Vec<Plan> = if accumulated.is_empty() {
        new.into_vec()
    } else {
        accumulated.into_iter().chain(new).collect::<PlanSet>().into_vec()
    };

    plans.sort_by(|a, b| b.score().total_cmp(&a.score()));
    let top = plans[0].score();
    let tied = plans.iter().take_while(|p| p.score() == top).count();

    let group = &mut plans[..tied];
    group.sort_by(|a, b| a.assignment().cmp(b.assignment()));
    SplitMix64::new(seed).shuffle(group);

    if let Some(n) = top_n {
        plans.truncate(n);
    }
    plans.into_iter().collect()
}
