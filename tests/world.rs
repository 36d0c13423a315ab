use weft_ecs::prelude::*;

#[derive(Clone, Default, Debug, PartialEq)]
struct Armor(i64);

#[derive(Clone, Default, Debug, PartialEq)]
struct Boots(i64);

#[derive(Clone, Default, Debug, PartialEq)]
struct Likes(u32);

#[test]
fn add_has_get_remove_round_trip() {
	let world = World::new();
	let entity = world.spawn().unwrap();

	world.add_component(entity, Armor(7)).unwrap();
	assert!(world.has_component::<Armor>(entity, Match::Plain).unwrap());
	assert_eq!(Armor(7), *world.get_component::<Armor>(entity, Match::Plain).unwrap());

	world.remove_component::<Armor>(entity).unwrap();
	assert!(!world.has_component::<Armor>(entity, Match::Plain).unwrap());
	assert_eq!(
		Some(EcsError::ComponentNotFound),
		world.get_component::<Armor>(entity, Match::Plain).err()
	);
}

#[test]
fn signatures_follow_migration() {
	let world = World::new();
	let entity = world.spawn_with(Armor(1)).unwrap();

	let signature = world.signature(entity).unwrap();
	assert_eq!(1, signature.len());
	assert!(signature.contains(&TypeExpr::plain::<Armor>()));

	world.add_component(entity, Boots(2)).unwrap();
	let signature = world.signature(entity).unwrap();
	assert_eq!(2, signature.len());
	assert!(signature.contains(&TypeExpr::plain::<Armor>()));
	assert!(signature.contains(&TypeExpr::plain::<Boots>()));

	world.remove_component::<Armor>(entity).unwrap();
	let signature = world.signature(entity).unwrap();
	assert_eq!(1, signature.len());
	assert!(signature.contains(&TypeExpr::plain::<Boots>()));

	// the directory still resolves the surviving column
	assert_eq!(Boots(2), *world.get_component::<Boots>(entity, Match::Plain).unwrap());
	assert_eq!(
		Some(EcsError::ComponentNotFound),
		world.get_component::<Armor>(entity, Match::Plain).err()
	);
}

#[test]
fn migration_round_trip_preserves_data() {
	let world = World::new();
	let entity = world.spawn_with(Armor(7)).unwrap();
	world.add_component(entity, Boots(9)).unwrap();
	world.remove_component::<Boots>(entity).unwrap();
	assert_eq!(Armor(7), *world.get_component::<Armor>(entity, Match::Plain).unwrap());
}

#[test]
fn adding_a_present_column_overwrites_in_place() {
	let world = World::new();
	let entity = world.spawn_with(Armor(1)).unwrap();
	let signature = world.signature(entity).unwrap();

	world.add_component(entity, Armor(2)).unwrap();
	assert_eq!(signature, world.signature(entity).unwrap(), "idempotent on the signature");
	assert_eq!(Armor(2), *world.get_component::<Armor>(entity, Match::Plain).unwrap());
}

#[test]
fn despawn_invalidates_and_recycles_with_greater_generation() {
	let world = World::new();
	let first = world.spawn().unwrap();
	world.despawn(first).unwrap();
	assert!(!world.is_alive(first));
	assert_eq!(Err(EcsError::EntityNotAlive), world.despawn(first));
	assert_eq!(Err(EcsError::EntityNotAlive), world.add_component(first, Armor(1)));

	let second = world.spawn().unwrap();
	assert_eq!(first.index(), second.index(), "freed index is reused");
	assert!(second.generation() > first.generation());
	assert!(world.is_alive(second));
}

#[test]
fn swap_filled_rows_stay_resolvable() {
	let world = World::new();
	let entities: Vec<Entity> = (0..8)
		.map(|i| world.spawn_with(Armor(i)).unwrap())
		.collect();

	world.despawn(entities[2]).unwrap();
	world.despawn(entities[5]).unwrap();

	for (i, entity) in entities.iter().enumerate() {
		if i == 2 || i == 5 {
			assert!(!world.is_alive(*entity));
			continue;
		}
		assert_eq!(
			Armor(i as i64),
			*world.get_component::<Armor>(*entity, Match::Plain).unwrap(),
			"entity {i} must survive unrelated despawns"
		);
	}
	assert_eq!(6, world.entity_count());
}

#[test]
fn relations_partition_by_target() {
	let world = World::new();
	let target_a = world.spawn().unwrap();
	let target_b = world.spawn().unwrap();

	let fan = world.spawn().unwrap();
	world.add_component_at(fan, Likes(1), Target::Entity(target_a)).unwrap();
	world.add_component_at(fan, Likes(2), Target::Entity(target_b)).unwrap();

	// two columns of the same type, one per target
	let signature = world.signature(fan).unwrap();
	assert_eq!(2, signature.len());
	assert!(world.has_component::<Likes>(fan, Match::Entity(target_a)).unwrap());
	assert!(world.has_component::<Likes>(fan, Match::Entity(target_b)).unwrap());
	assert!(world.has_component::<Likes>(fan, Match::AnyEntity).unwrap());
	assert!(!world.has_component::<Likes>(fan, Match::Plain).unwrap());

	assert_eq!(Likes(1), *world.get_component::<Likes>(fan, Match::Entity(target_a)).unwrap());
	assert_eq!(Likes(2), *world.get_component::<Likes>(fan, Match::Entity(target_b)).unwrap());

	world.remove_component_at::<Likes>(fan, Target::Entity(target_a)).unwrap();
	assert!(!world.has_component::<Likes>(fan, Match::Entity(target_a)).unwrap());
	assert!(world.has_component::<Likes>(fan, Match::Entity(target_b)).unwrap());
}

#[test]
fn relation_targets_dangle_after_target_despawn() {
	let world = World::new();
	let target = world.spawn().unwrap();
	let fan = world.spawn().unwrap();
	world.add_component_at(fan, Likes(3), Target::Entity(target)).unwrap();

	world.despawn(target).unwrap();
	// the relation is a key, not an owning pointer: it stays until removed
	assert!(world.has_component::<Likes>(fan, Match::Entity(target)).unwrap());
	assert!(world.has_component::<Likes>(fan, Match::AnyEntity).unwrap());
}

#[test]
fn links_are_keyed_by_object_identity() {
	let world = World::new();
	let entity = world.spawn().unwrap();
	world.add_component_at(entity, Armor(1), Target::Object(ObjectId(10))).unwrap();
	world.add_component_at(entity, Armor(2), Target::Object(ObjectId(20))).unwrap();

	assert!(world.has_component::<Armor>(entity, Match::AnyObject).unwrap());
	assert!(!world.has_component::<Armor>(entity, Match::Object(ObjectId(30))).unwrap());
	assert_eq!(
		Armor(2),
		*world.get_component::<Armor>(entity, Match::Object(ObjectId(20))).unwrap()
	);
}

#[test]
fn get_or_create_defaults_missing_columns() {
	let world = World::new();
	let entity = world.spawn().unwrap();

	assert_eq!(Armor(0), *world.get_or_create_component::<Armor>(entity, Match::Plain).unwrap());
	assert!(world.has_component::<Armor>(entity, Match::Plain).unwrap());

	// a wildcard is fine once a matching column exists
	*world.get_or_create_component::<Armor>(entity, Match::Any).unwrap() = Armor(5);
	assert_eq!(Armor(5), *world.get_component::<Armor>(entity, Match::Plain).unwrap());

	// but creation needs a specific target
	let missing = world.get_or_create_component::<Boots>(entity, Match::AnyEntity);
	assert_eq!(Some(EcsError::InvalidMatch), missing.err());
}

#[test]
fn shared_guards_read_concurrently() {
	let world = World::new();
	let entity = world.spawn_with(Armor(42)).unwrap();

	let guard_a = world.lock();
	let guard_b = world.lock();
	assert!(guard_a.is_alive(entity));
	assert_eq!(&Armor(42), guard_b.get::<Armor>(entity, Match::Plain).unwrap());
	assert!(guard_a.signature(entity).unwrap().contains(&TypeExpr::plain::<Armor>()));
}
