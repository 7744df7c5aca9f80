use crate::{
    component::{IdentityComponent, IDENTITY_EXECUTION_ORDER},
    entities::{Component, Entity, Name, Universe},
    reference::CrossSceneRef,
    registry::IdentityRegistry,
};
use log::*;
use std::{
    any::{type_name, TypeId},
    collections::BTreeMap,
};

/// What lifecycle hooks get to see while they run.
pub struct LifecycleContext<'a> {
    pub universe: &'a Universe,
    pub registry: &'a mut IdentityRegistry<Entity>,
}

/// A component with activation and deactivation callbacks.
///
/// Within one scene load, the hooks of all behaviours with a lower [`Behaviour::EXECUTION_ORDER`]
/// run on every object before any hook with a higher one.
pub trait Behaviour: Component + Sized {
    const EXECUTION_ORDER: i32 = 0;

    fn on_activate(&mut self, entity: Entity, ctx: &mut LifecycleContext<'_>) {
        let _ = (entity, ctx);
    }

    fn on_deactivate(&mut self, entity: Entity, ctx: &mut LifecycleContext<'_>) {
        let _ = (entity, ctx);
    }
}

impl Component for IdentityComponent {}

impl Behaviour for IdentityComponent {
    const EXECUTION_ORDER: i32 = IDENTITY_EXECUTION_ORDER;

    fn on_activate(&mut self, entity: Entity, ctx: &mut LifecycleContext<'_>) {
        self.activate(entity, ctx.registry);
    }

    fn on_deactivate(&mut self, entity: Entity, ctx: &mut LifecycleContext<'_>) {
        self.deactivate(entity, ctx.registry);
    }
}

/// Named cross-scene references held by an object.
///
/// On activation it tries to resolve every reference once and remembers how many succeeded,
/// which is mostly useful for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub references: BTreeMap<String, CrossSceneRef>,
    resolved_on_activation: usize,
}

impl Links {
    pub fn new(references: BTreeMap<String, CrossSceneRef>) -> Self {
        Self {
            references,
            resolved_on_activation: 0,
        }
    }

    pub fn get(&self, field: &str) -> Option<&CrossSceneRef> {
        self.references.get(field)
    }

    /// How many references resolved when the object last activated.
    pub fn resolved_on_activation(&self) -> usize {
        self.resolved_on_activation
    }
}

impl Component for Links {}

impl Behaviour for Links {
    fn on_activate(&mut self, entity: Entity, ctx: &mut LifecycleContext<'_>) {
        self.resolved_on_activation = 0;

        for (field, reference) in &self.references {
            match ctx.registry.resolve(reference.guid(), ctx.universe) {
                Some(target) => {
                    let name = ctx
                        .universe
                        .get_component::<Name>(target)
                        .map(Name::as_str)
                        .unwrap_or("(unnamed)");
                    debug!("{entity:?}.{field} -> {name} ({target:?})");
                    self.resolved_on_activation += 1;
                }
                None if reference.is_set() => {
                    debug!(
                        "{entity:?}.{field} -> `{}` is not loaded yet",
                        reference.guid()
                    );
                }
                None => {}
            }
        }
    }
}

/// Type-erased lifecycle hooks of a single [`Behaviour`] type.
#[derive(Clone, Copy)]
pub(super) struct Hook {
    pub type_id: TypeId,
    pub label: &'static str,
    pub order: i32,
    pub activate: fn(&mut Universe, &mut IdentityRegistry<Entity>, Entity),
    pub deactivate: fn(&mut Universe, &mut IdentityRegistry<Entity>, Entity),
}

impl Hook {
    pub fn of<T: Behaviour>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            label: type_name::<T>(),
            order: T::EXECUTION_ORDER,
            activate: run_activate::<T>,
            deactivate: run_deactivate::<T>,
        }
    }
}

fn run_activate<T: Behaviour>(
    universe: &mut Universe,
    registry: &mut IdentityRegistry<Entity>,
    entity: Entity,
) {
    with_behaviour::<T>(universe, registry, entity, T::on_activate);
}

fn run_deactivate<T: Behaviour>(
    universe: &mut Universe,
    registry: &mut IdentityRegistry<Entity>,
    entity: Entity,
) {
    with_behaviour::<T>(universe, registry, entity, T::on_deactivate);
}

/// Takes the behaviour out of the universe for the duration of the callback, so it can look at
/// the rest of the universe while being mutated itself.
fn with_behaviour<T: Behaviour>(
    universe: &mut Universe,
    registry: &mut IdentityRegistry<Entity>,
    entity: Entity,
    callback: fn(&mut T, Entity, &mut LifecycleContext<'_>),
) {
    let Some(mut behaviour) = universe.remove_component::<T>(entity) else {
        return;
    };

    callback(
        &mut behaviour,
        entity,
        &mut LifecycleContext {
            universe: &*universe,
            registry: &mut *registry,
        },
    );

    universe.set_component(entity, behaviour);
}
