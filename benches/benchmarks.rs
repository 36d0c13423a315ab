use criterion::*;
use rand::prelude::SliceRandom;
use rand::thread_rng;
use weft_ecs::prelude::*;

const COUNT: usize = 10_000;

#[derive(Clone, Default)]
struct Translation {
	x: f32,
	y: f32,
	z: f32,
}

#[derive(Clone, Default)]
struct Rotation {
	x: f32,
	y: f32,
	z: f32,
}

#[derive(Clone, Default)]
struct Velocity {
	x: f32,
	y: f32,
	z: f32,
}

fn populated() -> (World, Vec<Entity>) {
	let world = World::new();
	let entities = (0..COUNT)
		.map(|_| {
			let entity = world.spawn_with(Translation::default()).unwrap();
			world.add_component(entity, Rotation::default()).unwrap();
			world.add_component(entity, Velocity { x: 1.0, y: 2.0, z: 3.0 }).unwrap();
			entity
		})
		.collect();
	(world, entities)
}

fn spawn_entities(c: &mut Criterion) {
	c.bench_function("Spawn entities", |b| {
		b.iter_batched(
			World::new,
			|world| {
				for _ in 0..COUNT {
					world.spawn_with(Translation::default()).unwrap();
				}
			},
			BatchSize::PerIteration,
		);
	});
}

fn despawn_entities(c: &mut Criterion) {
	c.bench_function("Despawn entities", |b| {
		b.iter_batched(
			|| {
				let (world, mut entities) = populated();
				entities.shuffle(&mut thread_rng());
				(world, entities)
			},
			|(world, entities)| {
				for entity in entities {
					world.despawn(entity).unwrap();
				}
			},
			BatchSize::PerIteration,
		);
	});
}

fn iterate_entities(c: &mut Criterion) {
	let mut group = c.benchmark_group("Iterate entities");

	group.bench_function("Single-threaded", |b| {
		let (world, _entities) = populated();
		let query = world.query::<(Translation, Rotation, Velocity)>();
		query.warmup(&world);

		b.iter(|| {
			query.for_each(&world, |translation, rotation, velocity| {
				translation.x += velocity.x;
				translation.y += velocity.y;
				translation.z += velocity.z;
				rotation.x += velocity.z;
			});
		});
	});

	group.bench_function("Multi-threaded", |b| {
		let (world, _entities) = populated();
		let query = world.query::<(Translation, Rotation, Velocity)>();
		query.warmup(&world);

		b.iter(|| {
			query.job(&world, |translation, rotation, velocity| {
				translation.x += velocity.x;
				translation.y += velocity.y;
				translation.z += velocity.z;
				rotation.x += velocity.z;
			});
		});
	});

	group.finish();
}

criterion_group!(benches, spawn_entities, despawn_entities, iterate_entities);
criterion_main!(benches);
