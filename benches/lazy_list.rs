use bencher::{benchmark_group, benchmark_main, Bencher};
use rxstate::prelude::*;

/// Lists nobody observes must not pay for their streams.
fn construct_unobserved(b: &mut Bencher) {
  b.iter(|| {
    let lists: Vec<ReactiveList<u32>> = (0..1_000).map(|i| ReactiveList::from(vec![i])).collect();
    for list in &lists {
      list.add(0);
    }
    lists.len()
  });
}

fn publish_batches(b: &mut Bencher) {
  let list = ReactiveList::<u32>::new();
  list.item_added().subscribe(|_| {});
  list.removed_group().subscribe(|_| {});
  b.iter(|| {
    list.add_range(0..64);
    list.remove_range(0..32);
    list.clear();
  });
}

fn follow_derivation(b: &mut Bencher) {
  let source = ReactiveList::from((0..1_000u32).collect::<Vec<_>>());
  let derived = source.derive(|n: &u32| u64::from(*n) * 2);
  b.iter(|| {
    source.add(7);
    source.set(0, 3).unwrap();
    source.move_to(0, 500).unwrap();
    source.remove_at(source.len() - 1).unwrap();
    derived.len()
  });
}

benchmark_group!(benches, construct_unobserved, publish_batches, follow_derivation);
benchmark_main!(benches);
